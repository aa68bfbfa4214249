//! Unit tests for the lexer module.
//!
//! Covers keywords, identifiers, literals, operators, comments, positions
//! and the error cases.

use super::{lexer::tokenize, tokens::TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source.to_string(), Some("test.arrow".to_string()))
        .unwrap()
        .iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    let source = "int boolean string var void true false if else while select case default function return print";

    assert_eq!(
        kinds(source),
        vec![
            TokenKind::IntType,
            TokenKind::BooleanType,
            TokenKind::StringType,
            TokenKind::Var,
            TokenKind::Void,
            TokenKind::True,
            TokenKind::False,
            TokenKind::If,
            TokenKind::Else,
            TokenKind::While,
            TokenKind::Select,
            TokenKind::Case,
            TokenKind::Default,
            TokenKind::Function,
            TokenKind::Return,
            TokenKind::Print,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_identifiers() {
    let source = "foo bar baz_123 _underscore integer".to_string();
    let tokens = tokenize(source, Some("test.arrow".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "foo");
    assert_eq!(tokens[2].value, "baz_123");
    assert_eq!(tokens[3].value, "_underscore");
    // Keyword prefixes stay identifiers.
    assert_eq!(tokens[4].kind, TokenKind::Identifier);
    assert_eq!(tokens[4].value, "integer");
    assert_eq!(tokens[5].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_numbers() {
    let source = "42 0 100".to_string();
    let tokens = tokenize(source, Some("test.arrow".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].value, "0");
    assert_eq!(tokens[2].value, "100");
    assert_eq!(tokens[3].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_strings() {
    let source = r#""hello" "two words" "tab\tquote\"end""#.to_string();
    let tokens = tokenize(source, Some("test.arrow".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
    assert_eq!(tokens[0].value, "hello");
    assert_eq!(tokens[1].value, "two words");
    assert_eq!(tokens[2].value, "tab\tquote\"end");
    assert_eq!(tokens[3].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_operators() {
    assert_eq!(
        kinds("<- <= < >= > = != ~ & | + - * /"),
        vec![
            TokenKind::Arrow,
            TokenKind::LessEquals,
            TokenKind::Less,
            TokenKind::GreaterEquals,
            TokenKind::Greater,
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::Tilde,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_arrow_binds_before_less() {
    assert_eq!(
        kinds("a<-1"),
        vec![
            TokenKind::Identifier,
            TokenKind::Arrow,
            TokenKind::Number,
            TokenKind::EOF
        ]
    );
    assert_eq!(
        kinds("a < -1"),
        vec![
            TokenKind::Identifier,
            TokenKind::Less,
            TokenKind::Dash,
            TokenKind::Number,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_tokenize_punctuation() {
    assert_eq!(
        kinds("( ) { } [ ] ; , :"),
        vec![
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::Semicolon,
            TokenKind::Comma,
            TokenKind::Colon,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        kinds("int a; // trailing <- words\nprint(a);"),
        vec![
            TokenKind::IntType,
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::Print,
            TokenKind::OpenParen,
            TokenKind::Identifier,
            TokenKind::CloseParen,
            TokenKind::Semicolon,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_positions_track_lines_and_columns() {
    let source = "int a <- 2;\n  x <- y + 1;".to_string();
    let tokens = tokenize(source, Some("test.arrow".to_string())).unwrap();

    assert_eq!(tokens[0].span.start.line, 1);
    assert_eq!(tokens[0].span.start.column, 1);
    assert_eq!(tokens[1].span.start.column, 5);
    assert_eq!(tokens[2].span.start.column, 7);

    // `x` on the second line
    assert_eq!(tokens[5].value, "x");
    assert_eq!(tokens[5].span.start.line, 2);
    assert_eq!(tokens[5].span.start.column, 3);
    assert_eq!(tokens[7].value, "y");
    assert_eq!(tokens[7].span.start.column, 8);
}

#[test]
fn test_unrecognised_token() {
    let result = tokenize("int a <- #;".to_string(), Some("test.arrow".to_string()));
    let error = result.unwrap_err();

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().column, 10);
}

#[test]
fn test_unterminated_string() {
    let result = tokenize("string s <- \"open;".to_string(), None);
    let error = result.unwrap_err();

    assert_eq!(error.get_error_name(), "UnterminatedString");
    assert_eq!(error.get_position().file.as_str(), "shell");
}
