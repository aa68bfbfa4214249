use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("int", TokenKind::IntType);
        map.insert("boolean", TokenKind::BooleanType);
        map.insert("string", TokenKind::StringType);
        map.insert("var", TokenKind::Var);
        map.insert("void", TokenKind::Void);
        map.insert("true", TokenKind::True);
        map.insert("false", TokenKind::False);
        map.insert("if", TokenKind::If);
        map.insert("else", TokenKind::Else);
        map.insert("while", TokenKind::While);
        map.insert("select", TokenKind::Select);
        map.insert("case", TokenKind::Case);
        map.insert("default", TokenKind::Default);
        map.insert("function", TokenKind::Function);
        map.insert("return", TokenKind::Return);
        map.insert("print", TokenKind::Print);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Number,
    StringLiteral,
    Identifier,

    Tilde,

    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,

    Arrow,     // <-
    Equals,    // =
    NotEquals, // !=

    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    Or,
    And,

    Semicolon,
    Colon,
    Comma,

    Plus,
    Dash,
    Slash,
    Star,

    // Reserved
    IntType,
    BooleanType,
    StringType,
    Var,
    Void,
    True,
    False,
    If,
    Else,
    While,
    Select,
    Case,
    Default,
    Function,
    Return,
    Print,
}

impl TokenKind {
    /// Whether the token can start a type annotation.
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::IntType
                | TokenKind::BooleanType
                | TokenKind::StringType
                | TokenKind::Var
                | TokenKind::Void
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.carries_value() {
            write!(f, "{} ({})", self.kind, self.value)
        } else {
            write!(f, "{} ()", self.kind)
        }
    }
}

impl Token {
    fn carries_value(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::StringLiteral | TokenKind::Identifier | TokenKind::Number
        )
    }

    pub fn debug(&self) {
        log::trace!("{}", self);
    }
}
