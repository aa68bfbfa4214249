use crate::{
    ast::{
        ast::{Expr, Stmt},
        statements::{BlockStmt, FnDeclStmt, PrintStmt, ReturnStmt, VarDeclStmt},
        types::TypeAnnotation,
    },
    errors::diagnostics::SemanticError,
};

use super::{
    scope::{SymbolId, SymbolKind},
    type_checker::{FunctionContext, TypeChecker, RESERVED_NAMES},
    types::Type,
};

impl TypeChecker {
    pub fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(block) => self.check_block(block),
            Stmt::Expression(stmt) => match &stmt.expression {
                // a call's result may be discarded, even a void one
                Expr::Call(call) => {
                    self.check_call(call);
                }
                expression => {
                    self.check_expr(expression);
                }
            },
            Stmt::VarDecl(decl) => self.check_var_decl(decl),
            Stmt::If(stmt) => {
                let condition = self.check_expr(&stmt.condition);
                self.expect_condition("if", &condition, &stmt.condition.get_span().start);

                self.check_block(&stmt.then_body);
                if let Some(else_body) = &stmt.else_body {
                    self.check_block(else_body);
                }
            }
            Stmt::While(stmt) => {
                let condition = self.check_expr(&stmt.condition);
                self.expect_condition("while", &condition, &stmt.condition.get_span().start);

                self.check_block(&stmt.body);
            }
            Stmt::Select(stmt) => {
                for case in stmt.cases.iter() {
                    let condition = self.check_expr(&case.condition);
                    self.expect_condition("select", &condition, &case.condition.get_span().start);

                    self.check_block(&case.body);
                }

                if let Some(default) = &stmt.default {
                    self.check_block(default);
                }
            }
            Stmt::FnDecl(function) => self.check_fn_decl(function),
            Stmt::Return(stmt) => self.check_return(stmt),
            Stmt::Print(stmt) => self.check_print(stmt),
        }
    }

    pub fn check_block(&mut self, block: &BlockStmt) {
        self.scopes.enter_scope();
        for stmt in block.body.iter() {
            self.check_stmt(stmt);
        }
        self.scopes.exit_scope();
    }

    fn check_var_decl(&mut self, decl: &VarDeclStmt) {
        let position = &decl.span.start;

        if decl.explicit_type == TypeAnnotation::Void {
            self.diagnostics.semantic(
                position,
                SemanticError::VoidVariable {
                    variable: decl.identifier.clone(),
                },
            );
        }
        let declared = self.resolve_annotation(&decl.explicit_type);

        // The initializer is checked before the name exists, so `int a <- a;`
        // sees an outer `a` or nothing.
        if let Some(value) = &decl.assigned_value {
            let found = self.check_expr(value);

            if !self.types.prune(&found).is_bot() && !self.types.is_subtype(&found, &declared) {
                let target = format!("'{}'", decl.identifier);
                let error = self
                    .sum_mismatch(target, &found, &declared)
                    .unwrap_or_else(|| SemanticError::InitializerMismatch {
                        variable: decl.identifier.clone(),
                        expected: self.describe(&declared),
                        received: self.describe(&found),
                    });
                self.diagnostics.semantic(&value.get_span().start, error);
            }
        }

        let Some(symbol) = self.scopes.add_symbol(&decl.identifier, declared.clone()) else {
            self.diagnostics.semantic(
                position,
                SemanticError::Redeclared {
                    variable: decl.identifier.clone(),
                },
            );
            return;
        };

        self.bindings.bind(decl.id, symbol);
        if decl.assigned_value.is_some() {
            self.stored_types.insert(decl.id, declared);
        }
    }

    fn check_print(&mut self, stmt: &PrintStmt) {
        for argument in stmt.arguments.iter() {
            let ty = self.check_expr(argument);

            match self.types.prune(&ty) {
                Type::Int | Type::Bool | Type::Str | Type::Bot => {}
                _ => {
                    let error = SemanticError::NotPrintable {
                        received: self.describe(&ty),
                    };
                    self.diagnostics
                        .semantic(&argument.get_span().start, error);
                }
            }
        }
    }

    fn check_return(&mut self, stmt: &ReturnStmt) {
        let found = stmt.value.as_ref().map(|value| self.check_expr(value));

        let Some(context) = self.functions.last() else {
            self.diagnostics
                .semantic(&stmt.span.start, SemanticError::ReturnOutsideFunction);
            return;
        };
        let function = context.name.clone();
        let expected = context.ret.clone();

        match found {
            Some(_) if expected.is_bot() => {
                self.diagnostics.semantic(
                    &stmt.span.start,
                    SemanticError::UnexpectedReturnValue { function },
                );
            }
            Some(found) => {
                if !self.types.prune(&found).is_bot() && !self.types.is_subtype(&found, &expected)
                {
                    let target = format!("the result of '{}'", function);
                    let error = self
                        .sum_mismatch(target, &found, &expected)
                        .unwrap_or_else(|| SemanticError::ReturnTypeMismatch {
                            function,
                            expected: self.describe(&expected),
                            received: self.describe(&found),
                        });
                    self.diagnostics.semantic(&stmt.span.start, error);
                }
            }
            None if !expected.is_bot() => {
                let error = SemanticError::MissingReturnValue {
                    function,
                    expected: self.describe(&expected),
                };
                self.diagnostics.semantic(&stmt.span.start, error);
            }
            None => {}
        }
    }

    fn check_fn_decl(&mut self, function: &FnDeclStmt) {
        let position = &function.span.start;
        let name = function.identifier.clone();

        if !self.in_global_scope() {
            self.diagnostics
                .semantic(position, SemanticError::NestedFunction { function: name });
            return;
        }

        if RESERVED_NAMES.contains(&name.as_str()) {
            self.diagnostics
                .semantic(position, SemanticError::ReservedName { name });
            return;
        }

        let mut params = vec![];
        for parameter in function.parameters.iter() {
            if matches!(parameter.ty, TypeAnnotation::Var | TypeAnnotation::Void) {
                self.diagnostics.semantic(
                    &parameter.span.start,
                    SemanticError::InvalidParameterType {
                        function: name.clone(),
                        parameter: parameter.name.clone(),
                    },
                );
                params.push(Type::Bot);
            } else {
                params.push(self.resolve_annotation(&parameter.ty));
            }
        }

        let ret = if function.return_type == TypeAnnotation::Var {
            self.diagnostics.semantic(
                position,
                SemanticError::InvalidReturnType {
                    function: name.clone(),
                },
            );
            Type::Bot
        } else {
            self.resolve_annotation(&function.return_type)
        };

        let signature = Type::invoke(params.clone(), ret.clone(), false, function.body.is_some());

        let Some(symbol) = self.declare_function(function, signature) else {
            return;
        };
        self.bindings.bind(function.id, symbol);

        let Some(body) = &function.body else {
            return;
        };

        let root = self.scopes.enter_scope();
        self.functions.push(FunctionContext {
            name: name.clone(),
            ret,
            root,
        });

        for (parameter, ty) in function.parameters.iter().zip(params) {
            match self.scopes.add_symbol(&parameter.name, ty.clone()) {
                Some(param_symbol) => {
                    self.bindings.bind(parameter.id, param_symbol);
                    self.stored_types.insert(parameter.id, ty);
                }
                None => self.diagnostics.semantic(
                    &parameter.span.start,
                    SemanticError::Redeclared {
                        variable: parameter.name.clone(),
                    },
                ),
            }
        }

        self.check_block(body);

        self.functions.pop();
        self.scopes.exit_scope();
    }

    /// Adds the function symbol, or completes an earlier forward declaration
    /// with the same signature.
    fn declare_function(&mut self, function: &FnDeclStmt, signature: Type) -> Option<SymbolId> {
        let position = &function.span.start;
        let name = &function.identifier;

        let Some(existing) = self.scopes.find_local(name) else {
            let symbol =
                self.scopes
                    .add_symbol_of_kind(name, signature, SymbolKind::Function)?;
            if function.body.is_none() {
                self.forward_declarations
                    .push((symbol, name.clone(), position.clone()));
            }
            return Some(symbol);
        };

        let previous = self.scopes.symbol(existing).clone();
        let forward = match &previous.ty {
            Type::Invoke(invoke)
                if previous.kind == SymbolKind::Function
                    && !invoke.is_defined()
                    && function.body.is_some() =>
            {
                invoke.clone()
            }
            _ => {
                self.diagnostics.semantic(
                    position,
                    SemanticError::FunctionRedeclared {
                        function: name.clone(),
                    },
                );
                return None;
            }
        };

        let matches = self.types.is_subtype(&signature, &previous.ty)
            && self.types.is_subtype(&previous.ty, &signature);
        if !matches {
            let error = SemanticError::SignatureMismatch {
                function: name.clone(),
                expected: self.describe(&previous.ty),
            };
            self.diagnostics.semantic(position, error);
            return None;
        }

        log::debug!("forward declaration of '{}' completed", name);
        forward.mark_defined();
        Some(existing)
    }
}
