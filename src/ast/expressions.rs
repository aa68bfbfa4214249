use std::fmt::Display;

use crate::{lexer::tokens::TokenKind, Span};

use super::ast::{Expr, NodeId};

// LITERALS

/// Number Expression
/// Represents an integer literal in the AST.
#[derive(Debug, Clone)]
pub struct NumberExpr {
    pub id: NodeId,
    pub value: i32,
    pub span: Span,
}

/// Boolean Expression
/// Represents `true` or `false`.
#[derive(Debug, Clone)]
pub struct BooleanExpr {
    pub id: NodeId,
    pub value: bool,
    pub span: Span,
}

/// String Expression
/// Represents a string literal in the AST, escapes already resolved.
#[derive(Debug, Clone)]
pub struct StringExpr {
    pub id: NodeId,
    pub value: String,
    pub span: Span,
}

/// Symbol Expression
/// Represents an identifier in the AST. This includes functions.
#[derive(Debug, Clone)]
pub struct SymbolExpr {
    pub id: NodeId,
    pub value: String,
    pub span: Span,
}

/// Array Expression
/// `[e1, e2, ...]`, never empty.
#[derive(Debug, Clone)]
pub struct ArrayExpr {
    pub id: NodeId,
    pub elements: Vec<Expr>,
    pub span: Span,
}

// COMPLEX

/// Index Expression
/// `base[index]`
#[derive(Debug, Clone)]
pub struct IndexExpr {
    pub id: NodeId,
    pub base: Box<Expr>,
    pub index: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    Equals,
    NotEquals,
    And,
    Or,
}

impl BinaryOperator {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Plus => BinaryOperator::Add,
            TokenKind::Dash => BinaryOperator::Subtract,
            TokenKind::Star => BinaryOperator::Multiply,
            TokenKind::Slash => BinaryOperator::Divide,
            TokenKind::Less => BinaryOperator::Less,
            TokenKind::LessEquals => BinaryOperator::LessEquals,
            TokenKind::Greater => BinaryOperator::Greater,
            TokenKind::GreaterEquals => BinaryOperator::GreaterEquals,
            TokenKind::Equals => BinaryOperator::Equals,
            TokenKind::NotEquals => BinaryOperator::NotEquals,
            TokenKind::And => BinaryOperator::And,
            TokenKind::Or => BinaryOperator::Or,
            _ => return None,
        })
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
        )
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Less
                | BinaryOperator::LessEquals
                | BinaryOperator::Greater
                | BinaryOperator::GreaterEquals
        )
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOperator::Equals | BinaryOperator::NotEquals)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEquals => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEquals => ">=",
            BinaryOperator::Equals => "=",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::And => "&",
            BinaryOperator::Or => "|",
        };
        write!(f, "{}", symbol)
    }
}

/// Binary Expression
/// Represents a binary operation between two expressions in the AST.
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub id: NodeId,
    pub left: Box<Expr>,
    pub operator: BinaryOperator,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    /// `-`
    Negate,
    /// `~`
    Not,
}

impl Display for PrefixOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrefixOperator::Negate => write!(f, "-"),
            PrefixOperator::Not => write!(f, "~"),
        }
    }
}

/// Prefix Expression
#[derive(Debug, Clone)]
pub struct PrefixExpr {
    pub id: NodeId,
    pub operator: PrefixOperator,
    pub right_expr: Box<Expr>,
    pub span: Span,
}

/// Assignment Expression
/// `name <- value`. Creates the variable in the current scope when no
/// declaration is visible.
#[derive(Debug, Clone)]
pub struct AssignmentExpr {
    pub id: NodeId,
    pub assignee: String,
    pub value: Box<Expr>,
    pub span: Span,
}

/// Call Expression
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub id: NodeId,
    pub callee: String,
    pub arguments: Vec<Expr>,
    pub span: Span,
}
