//! Accumulated diagnostics shared by the checker and the lowering pass.
//!
//! Neither pass stops at the first problem: every diagnostic reachable in one
//! traversal is appended here and the caller decides whether the next phase
//! may run.

use std::fmt::Display;

use inkwell::builder::BuilderError;
use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A type or scope violation found by the checker.
    Semantic,
    /// The lowering pass disagreed with what the checker proved.
    Codegen,
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::Semantic => write!(f, "SEMANTIC"),
            DiagnosticKind::Codegen => write!(f, "CODEGEN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: [{},{}]: {}",
            self.kind, self.line, self.column, self.message
        )
    }
}

/// Append-only list of diagnostics for one compilation unit.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn push(&mut self, kind: DiagnosticKind, position: &Position, message: String) {
        log::debug!(
            "{} diagnostic at [{},{}]: {}",
            kind,
            position.line,
            position.column,
            message
        );

        self.entries.push(Diagnostic {
            kind,
            line: position.line,
            column: position.column,
            message,
        });
    }

    pub fn semantic(&mut self, position: &Position, error: SemanticError) {
        self.push(DiagnosticKind::Semantic, position, error.to_string());
    }

    pub fn codegen(&mut self, position: &Position, error: CodegenError) {
        self.push(DiagnosticKind::Codegen, position, error.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }
}

impl Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for diagnostic in self.entries.iter() {
            writeln!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("undefined variable '{variable}'")]
    UndefinedVariable { variable: String },
    #[error("undefined function '{function}'")]
    UndefinedFunction { function: String },
    #[error("'{name}' is not a function, it has type {found}")]
    NotAFunction { name: String, found: String },
    #[error("operand of '{operator}' must be {expected}, found {received}")]
    OperandTypeMismatch {
        operator: String,
        expected: String,
        received: String,
    },
    #[error("cannot compare {left} with {right} using '{operator}'")]
    EqualityMismatch {
        operator: String,
        left: String,
        right: String,
    },
    #[error("'{operator}' is not defined for values of type {received}")]
    EqualityNotSupported { operator: String, received: String },
    #[error("cannot assign an undefined value to '{variable}'")]
    UndefinedAssignment { variable: String },
    #[error("conflicting types inferred for '{variable}': {expected} and {received}")]
    ConflictingInference {
        variable: String,
        expected: String,
        received: String,
    },
    #[error("'{variable}' is already declared in this scope")]
    Redeclared { variable: String },
    #[error("cannot assign to function '{function}'")]
    AssignToFunction { function: String },
    #[error("cannot initialise '{variable}' of type {expected} with a value of type {received}")]
    InitializerMismatch {
        variable: String,
        expected: String,
        received: String,
    },
    #[error("{target} of type {expected} only accepts its own case types, not a value of sum type {received}")]
    SumIntoSum {
        target: String,
        expected: String,
        received: String,
    },
    #[error("'{variable}' cannot be declared with type void")]
    VoidVariable { variable: String },
    #[error("condition of '{construct}' must be boolean, found {received}")]
    ConditionNotBoolean { construct: String, received: String },
    #[error("array element must be {expected}, found {received}")]
    ArrayElementMismatch { expected: String, received: String },
    #[error("cannot index into a value of type {received}")]
    NotAnArray { received: String },
    #[error("array index must be int, found {received}")]
    IndexNotInt { received: String },
    #[error("function '{function}' must be declared at the top level")]
    NestedFunction { function: String },
    #[error("'{name}' is a reserved name")]
    ReservedName { name: String },
    #[error("function '{function}' is already declared in this scope")]
    FunctionRedeclared { function: String },
    #[error("definition of '{function}' does not match its declaration {expected}")]
    SignatureMismatch { function: String, expected: String },
    #[error("function '{function}' is declared but never defined")]
    FunctionNeverDefined { function: String },
    #[error("parameter '{parameter}' of '{function}' needs an explicit non-void type")]
    InvalidParameterType { function: String, parameter: String },
    #[error("function '{function}' needs an explicit return type")]
    InvalidReturnType { function: String },
    #[error("variable '{variable}' is not visible inside function '{function}'")]
    CapturedVariable { variable: String, function: String },
    #[error("'{function}' expects {expected} arguments, received {received}")]
    ArgumentCount {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("argument {index} of '{function}' must be {expected}, found {received}")]
    ArgumentMismatch {
        function: String,
        index: usize,
        expected: String,
        received: String,
    },
    #[error("return outside of a function")]
    ReturnOutsideFunction,
    #[error("'{function}' must return {expected}, found {received}")]
    ReturnTypeMismatch {
        function: String,
        expected: String,
        received: String,
    },
    #[error("'{function}' must return a value of type {expected}")]
    MissingReturnValue { function: String, expected: String },
    #[error("'{function}' returns void but a value was given")]
    UnexpectedReturnValue { function: String },
    #[error("cannot print a value of type {received}")]
    NotPrintable { received: String },
    #[error("'{function}' returns void, its result cannot be used")]
    VoidValue { function: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("variable '{variable}' has no storage at this point")]
    MissingStorage { variable: String },
    #[error("no symbol is bound to node {node}")]
    UnboundNode { node: u32 },
    #[error("the type of '{variable}' was never resolved")]
    UnresolvedType { variable: String },
    #[error("type {ty} has no IR representation")]
    NoIrType { ty: String },
    #[error("cannot store a {received} value into '{variable}' of IR type {expected}")]
    StoreMismatch {
        variable: String,
        expected: String,
        received: String,
    },
    #[error("unsupported operands for '{operator}'")]
    UnsupportedOperands { operator: String },
    #[error("'{name}' does not name a function")]
    NotAFunction { name: String },
    #[error("a {received} value is not a member of {ty}")]
    NotAMember { ty: String, received: String },
    #[error("call to '{function}' produced no value")]
    NoValue { function: String },
    #[error("the builder has no insertion point")]
    NoInsertionPoint,
    #[error("builder error: {0}")]
    Builder(String),
    #[error("module verification failed: {0}")]
    Verification(String),
    #[error("target setup failed: {0}")]
    Target(String),
}

impl From<BuilderError> for CodegenError {
    fn from(error: BuilderError) -> Self {
        CodegenError::Builder(format!("{:?}", error))
    }
}
