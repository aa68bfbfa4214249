//! Error types and error handling for the compiler.
//!
//! This module defines the error types used throughout the compilation
//! process. It includes:
//!
//! - Front-end errors with source position information and tips
//! - Accumulated semantic and codegen diagnostics
//! - Error formatting and display functionality

pub mod diagnostics;
pub mod errors;
