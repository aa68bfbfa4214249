//! Type checking and semantic analysis module.
//!
//! One traversal over the syntax tree that:
//!
//! - Resolves every name through lexical scopes
//! - Assigns a type to every expression, inferring `var` bindings
//! - Checks function signatures, calls and returns
//! - Records node to symbol bindings for the lowering pass
//!
//! Problems are accumulated as diagnostics; the traversal never stops early.

pub mod bindings;
pub mod expr;
pub mod scope;
pub mod stmt;
pub mod type_checker;
pub mod types;

#[cfg(test)]
mod tests;
