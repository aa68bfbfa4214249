//! Code generation module for the compiler.
//!
//! This module lowers a checked syntax tree into LLVM IR. It handles:
//!
//! - Lazy stack storage for variables, sized from the checker's stored types
//! - Mapping the type model onto LLVM types
//! - Functions, control flow blocks and `printf` based printing
//! - Target configuration and module verification

pub mod compiler;
pub mod expr;
pub mod stmt;

#[cfg(test)]
mod tests;
