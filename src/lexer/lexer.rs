use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex) -> Result<(), Error>;

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

impl RegexPattern {
    fn new(pattern: &str, handler: RegexHandler) -> Self {
        RegexPattern {
            regex: Regex::new(pattern).unwrap(),
            handler,
        }
    }
}

lazy_static! {
    // Every pattern is anchored; the first one that matches wins, so longer
    // operators come before their prefixes.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern::new("^[a-zA-Z_][a-zA-Z0-9_]*", symbol_handler),
        RegexPattern::new("^[0-9]+", number_handler),
        RegexPattern::new("^\\s+", skip_handler),
        RegexPattern::new("^//[^\n]*", skip_handler),
        RegexPattern::new("^\"(?:[^\"\\\\\n]|\\\\.)*\"", string_handler),
        RegexPattern::new("^\"", unterminated_string_handler),
        RegexPattern::new("^\\[", MK_DEFAULT_HANDLER!(TokenKind::OpenBracket, "[")),
        RegexPattern::new("^\\]", MK_DEFAULT_HANDLER!(TokenKind::CloseBracket, "]")),
        RegexPattern::new("^\\{", MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{")),
        RegexPattern::new("^\\}", MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}")),
        RegexPattern::new("^\\(", MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(")),
        RegexPattern::new("^\\)", MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")")),
        RegexPattern::new("^<-", MK_DEFAULT_HANDLER!(TokenKind::Arrow, "<-")),
        RegexPattern::new("^<=", MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<=")),
        RegexPattern::new("^<", MK_DEFAULT_HANDLER!(TokenKind::Less, "<")),
        RegexPattern::new("^>=", MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals, ">=")),
        RegexPattern::new("^>", MK_DEFAULT_HANDLER!(TokenKind::Greater, ">")),
        RegexPattern::new("^!=", MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "!=")),
        RegexPattern::new("^=", MK_DEFAULT_HANDLER!(TokenKind::Equals, "=")),
        RegexPattern::new("^~", MK_DEFAULT_HANDLER!(TokenKind::Tilde, "~")),
        RegexPattern::new("^\\|", MK_DEFAULT_HANDLER!(TokenKind::Or, "|")),
        RegexPattern::new("^&", MK_DEFAULT_HANDLER!(TokenKind::And, "&")),
        RegexPattern::new("^;", MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";")),
        RegexPattern::new("^:", MK_DEFAULT_HANDLER!(TokenKind::Colon, ":")),
        RegexPattern::new("^,", MK_DEFAULT_HANDLER!(TokenKind::Comma, ",")),
        RegexPattern::new("^\\+", MK_DEFAULT_HANDLER!(TokenKind::Plus, "+")),
        RegexPattern::new("^-", MK_DEFAULT_HANDLER!(TokenKind::Dash, "-")),
        RegexPattern::new("^/", MK_DEFAULT_HANDLER!(TokenKind::Slash, "/")),
        RegexPattern::new("^\\*", MK_DEFAULT_HANDLER!(TokenKind::Star, "*")),
    ];
}

pub struct Lexer {
    tokens: Vec<Token>,
    source: String,
    pos: usize,
    line: u32,
    column: u32,
    file: Rc<String>,
}

impl Lexer {
    pub fn new(source: String, file: Option<String>) -> Lexer {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("shell"))
        };

        Lexer {
            tokens: vec![],
            source,
            pos: 0,
            line: 1,
            column: 1,
            file: file_name,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column, Rc::clone(&self.file))
    }

    /// Moves past `length` bytes of source, keeping line and column in step.
    pub fn advance_n(&mut self, length: usize) {
        let end = (self.pos + length).min(self.source.len());

        for ch in self.source[self.pos..end].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }

        self.pos = end;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Pushes a token whose source text is `value` and advances past it.
    pub fn push_text(&mut self, kind: TokenKind, value: String) {
        let length = value.len();
        self.push_spanning(kind, value, length);
    }

    /// Pushes a token covering the next `length` bytes of source.
    pub fn push_spanning(&mut self, kind: TokenKind, value: String, length: usize) {
        let start = self.position();
        self.advance_n(length);
        let end = self.position();

        self.push(MK_TOKEN!(kind, value, Span { start, end }));
    }

    pub fn at(&self) -> char {
        self.remainder().chars().next().unwrap_or('\0')
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn matched(&self, regex: &Regex) -> String {
        regex
            .find(self.remainder())
            .map(|found| found.as_str().to_string())
            .unwrap_or_default()
    }
}

fn number_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let matched = lexer.matched(regex);
    lexer.push_text(TokenKind::Number, matched);
    Ok(())
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let matched = lexer.matched(regex);
    lexer.advance_n(matched.len());
    Ok(())
}

fn unterminated_string_handler(lexer: &mut Lexer, _regex: &Regex) -> Result<(), Error> {
    Err(Error::new(ErrorImpl::UnterminatedString, lexer.position()))
}

fn string_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let matched = lexer.matched(regex);
    let body = &matched[1..matched.len() - 1];

    let mut result = String::new();
    let mut chars = body.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('0') => result.push('\0'),
            // Unknown escapes keep their backslash.
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    lexer.push_spanning(TokenKind::StringLiteral, result, matched.len());
    Ok(())
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let value = lexer.matched(regex);

    if let Some(kind) = RESERVED_LOOKUP.get(value.as_str()) {
        lexer.push_text(*kind, value);
    } else {
        lexer.push_text(TokenKind::Identifier, value);
    }

    Ok(())
}

pub fn tokenize(source: String, file: Option<String>) -> Result<Vec<Token>, Error> {
    let mut lex = Lexer::new(source, file);

    while !lex.at_eof() {
        let pattern = PATTERNS
            .iter()
            .find(|pattern| pattern.regex.is_match(lex.remainder()));

        match pattern {
            Some(pattern) => (pattern.handler)(&mut lex, &pattern.regex)?,
            None => {
                return Err(Error::new(
                    ErrorImpl::UnrecognisedToken {
                        token: lex.at().to_string(),
                    },
                    lex.position(),
                ))
            }
        }
    }

    let position = lex.position();
    lex.push(MK_TOKEN!(
        TokenKind::EOF,
        String::from("EOF"),
        Span {
            start: position.clone(),
            end: position
        }
    ));

    log::trace!("lexed {} tokens from {}", lex.tokens.len(), lex.file);
    Ok(lex.tokens)
}
