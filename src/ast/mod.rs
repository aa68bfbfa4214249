/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Node identity and the expression/statement enums
/// - expressions: Definitions for the expression nodes
/// - statements: Definitions for the statement nodes
/// - types: Type annotations as written in source
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
