use crate::Span;

use super::{
    ast::{Expr, NodeId, Stmt},
    types::TypeAnnotation,
};

/// Block Statement
/// `{ ... }`. Opens its own scope.
#[derive(Debug, Clone)]
pub struct BlockStmt {
    pub id: NodeId,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Expression Statement
#[derive(Debug, Clone)]
pub struct ExpressionStmt {
    pub id: NodeId,
    pub expression: Expr,
    pub span: Span,
}

/// Variable Declaration Statement
/// `T name <- value;` or `T name;`
#[derive(Debug, Clone)]
pub struct VarDeclStmt {
    pub id: NodeId,
    pub identifier: String,
    pub explicit_type: TypeAnnotation,
    pub assigned_value: Option<Expr>,
    pub span: Span,
}

/// If Statement
/// An `else if` chain is stored as an else block holding the nested `if`.
#[derive(Debug, Clone)]
pub struct IfStmt {
    pub id: NodeId,
    pub condition: Expr,
    pub then_body: BlockStmt,
    pub else_body: Option<BlockStmt>,
    pub span: Span,
}

/// While Statement
#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub id: NodeId,
    pub condition: Expr,
    pub body: BlockStmt,
    pub span: Span,
}

/// One `case condition { ... }` arm of a select.
#[derive(Debug, Clone)]
pub struct SelectCase {
    pub condition: Expr,
    pub body: BlockStmt,
    pub span: Span,
}

/// Select Statement
/// Runs the body of the first case whose condition holds, otherwise the
/// default body if present.
#[derive(Debug, Clone)]
pub struct SelectStmt {
    pub id: NodeId,
    pub cases: Vec<SelectCase>,
    pub default: Option<BlockStmt>,
    pub span: Span,
}

/// A named, typed function parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub id: NodeId,
    pub name: String,
    pub ty: TypeAnnotation,
    pub span: Span,
}

/// Function Declaration Statement
/// `body` is `None` for a forward declaration.
#[derive(Debug, Clone)]
pub struct FnDeclStmt {
    pub id: NodeId,
    pub identifier: String,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeAnnotation,
    pub body: Option<BlockStmt>,
    pub span: Span,
}

/// Return Statement
#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub id: NodeId,
    pub value: Option<Expr>,
    pub span: Span,
}

/// Print Statement
#[derive(Debug, Clone)]
pub struct PrintStmt {
    pub id: NodeId,
    pub arguments: Vec<Expr>,
    pub span: Span,
}
