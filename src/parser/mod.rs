//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into an Abstract Syntax Tree. It uses a Pratt parser for expressions
//! with proper operator precedence and handles:
//!
//! - Statement parsing (declarations, functions, control flow, print)
//! - Expression parsing (binary ops, calls, indexing, literals)
//! - Type parsing for type annotations
//!
//! The parser uses NUD (null denotation) and LED (left denotation) functions
//! for expression parsing with binding power for precedence handling.
//! Parsing stops at the first error.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;
