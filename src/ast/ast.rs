use std::fmt::Display;

use crate::Span;

use super::{
    expressions::{
        ArrayExpr, AssignmentExpr, BinaryExpr, BooleanExpr, CallExpr, IndexExpr, NumberExpr,
        PrefixExpr, StringExpr, SymbolExpr,
    },
    statements::{
        BlockStmt, ExpressionStmt, FnDeclStmt, IfStmt, PrintStmt, ReturnStmt, SelectStmt,
        VarDeclStmt, WhileStmt,
    },
};

/// Stable identity of a syntax node, assigned by the parser.
///
/// The checker keys its bindings and stored types on it; the lowering pass
/// reads them back through the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Expression node
#[derive(Debug, Clone)]
pub enum Expr {
    Number(NumberExpr),
    Boolean(BooleanExpr),
    String(StringExpr),
    Symbol(SymbolExpr),
    Array(ArrayExpr),
    Index(IndexExpr),
    Binary(BinaryExpr),
    Prefix(PrefixExpr),
    Assignment(AssignmentExpr),
    Call(CallExpr),
}

impl Expr {
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Number(expr) => expr.id,
            Expr::Boolean(expr) => expr.id,
            Expr::String(expr) => expr.id,
            Expr::Symbol(expr) => expr.id,
            Expr::Array(expr) => expr.id,
            Expr::Index(expr) => expr.id,
            Expr::Binary(expr) => expr.id,
            Expr::Prefix(expr) => expr.id,
            Expr::Assignment(expr) => expr.id,
            Expr::Call(expr) => expr.id,
        }
    }

    pub fn get_span(&self) -> &Span {
        match self {
            Expr::Number(expr) => &expr.span,
            Expr::Boolean(expr) => &expr.span,
            Expr::String(expr) => &expr.span,
            Expr::Symbol(expr) => &expr.span,
            Expr::Array(expr) => &expr.span,
            Expr::Index(expr) => &expr.span,
            Expr::Binary(expr) => &expr.span,
            Expr::Prefix(expr) => &expr.span,
            Expr::Assignment(expr) => &expr.span,
            Expr::Call(expr) => &expr.span,
        }
    }
}

/// Statement node
#[derive(Debug, Clone)]
pub enum Stmt {
    Block(BlockStmt),
    Expression(ExpressionStmt),
    VarDecl(VarDeclStmt),
    If(IfStmt),
    While(WhileStmt),
    Select(SelectStmt),
    FnDecl(FnDeclStmt),
    Return(ReturnStmt),
    Print(PrintStmt),
}

impl Stmt {
    pub fn id(&self) -> NodeId {
        match self {
            Stmt::Block(stmt) => stmt.id,
            Stmt::Expression(stmt) => stmt.id,
            Stmt::VarDecl(stmt) => stmt.id,
            Stmt::If(stmt) => stmt.id,
            Stmt::While(stmt) => stmt.id,
            Stmt::Select(stmt) => stmt.id,
            Stmt::FnDecl(stmt) => stmt.id,
            Stmt::Return(stmt) => stmt.id,
            Stmt::Print(stmt) => stmt.id,
        }
    }

    pub fn get_span(&self) -> &Span {
        match self {
            Stmt::Block(stmt) => &stmt.span,
            Stmt::Expression(stmt) => &stmt.span,
            Stmt::VarDecl(stmt) => &stmt.span,
            Stmt::If(stmt) => &stmt.span,
            Stmt::While(stmt) => &stmt.span,
            Stmt::Select(stmt) => &stmt.span,
            Stmt::FnDecl(stmt) => &stmt.span,
            Stmt::Return(stmt) => &stmt.span,
            Stmt::Print(stmt) => &stmt.span,
        }
    }
}

/// Root of a parsed compilation unit.
#[derive(Debug, Clone)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub span: Span,
}
