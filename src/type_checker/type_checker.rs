use std::collections::HashMap;

use crate::{
    ast::{
        ast::{NodeId, Program},
        types::TypeAnnotation,
    },
    errors::diagnostics::{Diagnostics, SemanticError},
    Position,
};

use super::{
    bindings::BindingTable,
    scope::{ScopeId, ScopeManager, SymbolId, SymbolKind},
    types::{Type, TypeTable},
};

/// Names the module scaffolding defines itself.
pub const RESERVED_NAMES: [&str; 3] = ["main", "printf", "strcmp"];

/// Everything the checker learned about one unit. The lowering pass runs on
/// this when `diagnostics` is empty.
#[derive(Debug)]
pub struct Analysis {
    pub scopes: ScopeManager,
    pub bindings: BindingTable,
    pub types: TypeTable,
    /// Type held by the target of each write (declaration with an
    /// initializer, assignment, parameter) right after that write.
    pub stored_types: HashMap<NodeId, Type>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug)]
pub(crate) struct FunctionContext {
    pub name: String,
    pub ret: Type,
    /// The parameter scope; variables outside it are not visible.
    pub root: ScopeId,
}

#[derive(Debug)]
pub struct TypeChecker {
    pub scopes: ScopeManager,
    pub bindings: BindingTable,
    pub types: TypeTable,
    pub stored_types: HashMap<NodeId, Type>,
    pub diagnostics: Diagnostics,
    pub(crate) functions: Vec<FunctionContext>,
    pub(crate) global_scope: Option<ScopeId>,
    pub(crate) forward_declarations: Vec<(SymbolId, String, Position)>,
}

impl Default for TypeChecker {
    fn default() -> Self {
        TypeChecker::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        TypeChecker {
            scopes: ScopeManager::new(),
            bindings: BindingTable::new(),
            types: TypeTable::new(),
            stored_types: HashMap::new(),
            diagnostics: Diagnostics::new(),
            functions: vec![],
            global_scope: None,
            forward_declarations: vec![],
        }
    }

    pub fn check_program(&mut self, program: &Program) {
        self.global_scope = Some(self.scopes.enter_scope());

        for stmt in program.body.iter() {
            self.check_stmt(stmt);
        }

        for (symbol, name, position) in std::mem::take(&mut self.forward_declarations) {
            if let Type::Invoke(invoke) = &self.scopes.symbol(symbol).ty {
                if !invoke.is_defined() {
                    self.diagnostics.semantic(
                        &position,
                        SemanticError::FunctionNeverDefined { function: name },
                    );
                }
            }
        }

        self.scopes.exit_scope();

        log::debug!(
            "checked {} statements: {} scopes, {} symbols, {} diagnostics",
            program.body.len(),
            self.scopes.scopes().len(),
            self.scopes.symbols().len(),
            self.diagnostics.len()
        );
    }

    pub fn into_analysis(self) -> Analysis {
        Analysis {
            scopes: self.scopes,
            bindings: self.bindings,
            types: self.types,
            stored_types: self.stored_types,
            diagnostics: self.diagnostics,
        }
    }

    /// Resolves a written type. `var` becomes a fresh inference variable and
    /// `void` the undefined type.
    pub fn resolve_annotation(&mut self, annotation: &TypeAnnotation) -> Type {
        match annotation {
            TypeAnnotation::Int => Type::Int,
            TypeAnnotation::Boolean => Type::Bool,
            TypeAnnotation::String => Type::Str,
            TypeAnnotation::Var => self.types.fresh(),
            TypeAnnotation::Void => Type::Bot,
            TypeAnnotation::Array(element, length) => {
                let element = self.resolve_annotation(element);
                Type::array(element, *length)
            }
            TypeAnnotation::Sum(cases) => {
                let cases = cases
                    .iter()
                    .map(|case| self.resolve_annotation(case))
                    .collect();
                Type::sum(cases)
            }
        }
    }

    pub fn describe(&self, ty: &Type) -> String {
        self.types.describe(ty)
    }

    /// The error for a sum stored where another sum is expected. Sums only
    /// take values whose type is one of their own cases.
    pub(crate) fn sum_mismatch(
        &self,
        target: String,
        found: &Type,
        expected: &Type,
    ) -> Option<SemanticError> {
        match (self.types.prune(found), self.types.prune(expected)) {
            (Type::Sum(_), Type::Sum(_)) => Some(SemanticError::SumIntoSum {
                target,
                expected: self.describe(expected),
                received: self.describe(found),
            }),
            _ => None,
        }
    }

    /// Checks that an operand has the type an operator needs.
    ///
    /// An undefined operand was already reported where it came from, so it
    /// fails silently.
    pub(crate) fn expect_operand(
        &mut self,
        operator: &str,
        found: &Type,
        expected: &Type,
        position: &Position,
    ) -> bool {
        if self.types.prune(found).is_bot() {
            return false;
        }

        if self.types.is_subtype(found, expected) {
            return true;
        }

        let error = SemanticError::OperandTypeMismatch {
            operator: operator.to_string(),
            expected: self.describe(expected),
            received: self.describe(found),
        };
        self.diagnostics.semantic(position, error);
        false
    }

    pub(crate) fn expect_condition(&mut self, construct: &str, found: &Type, position: &Position) {
        if self.types.prune(found).is_bot() {
            return;
        }

        if !self.types.is_subtype(found, &Type::Bool) {
            let error = SemanticError::ConditionNotBoolean {
                construct: construct.to_string(),
                received: self.describe(found),
            };
            self.diagnostics.semantic(position, error);
        }
    }

    /// Reports and returns false when `symbol` is a variable declared outside
    /// the function currently being checked.
    pub(crate) fn check_visible(&mut self, symbol: SymbolId, position: &Position) -> bool {
        let Some(context) = self.functions.last() else {
            return true;
        };

        let symbol = self.scopes.symbol(symbol);
        if symbol.kind == SymbolKind::Function || self.scopes.is_within(symbol.scope, context.root)
        {
            return true;
        }

        let error = SemanticError::CapturedVariable {
            variable: symbol.identifier.clone(),
            function: context.name.clone(),
        };
        self.diagnostics.semantic(position, error);
        false
    }

    pub(crate) fn in_global_scope(&self) -> bool {
        self.functions.is_empty() && self.scopes.current() == self.global_scope
    }
}

/// Runs the semantic checker over a parsed unit.
pub fn type_check(program: &Program) -> Analysis {
    let mut checker = TypeChecker::new();
    checker.check_program(program);
    checker.into_analysis()
}
