use crate::{
    ast::{
        ast::Expr,
        expressions::{
            ArrayExpr, AssignmentExpr, BinaryExpr, CallExpr, IndexExpr, PrefixExpr,
            PrefixOperator, SymbolExpr,
        },
    },
    errors::diagnostics::SemanticError,
};

use super::{scope::SymbolKind, type_checker::TypeChecker, types::Type};

impl TypeChecker {
    pub fn check_expr(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::Number(_) => Type::Int,
            Expr::Boolean(_) => Type::Bool,
            Expr::String(_) => Type::Str,
            Expr::Symbol(symbol) => self.check_symbol(symbol),
            Expr::Array(array) => self.check_array(array),
            Expr::Index(index) => self.check_index(index),
            Expr::Binary(binary) => self.check_binary(binary),
            Expr::Prefix(prefix) => self.check_prefix(prefix),
            Expr::Assignment(assignment) => self.check_assignment(assignment),
            Expr::Call(call) => match self.check_call(call) {
                Some(ty) if ty.is_bot() => {
                    self.diagnostics.semantic(
                        &call.span.start,
                        SemanticError::VoidValue {
                            function: call.callee.clone(),
                        },
                    );
                    Type::Bot
                }
                Some(ty) => ty,
                None => Type::Bot,
            },
        }
    }

    fn check_symbol(&mut self, symbol: &SymbolExpr) -> Type {
        let Some(id) = self.scopes.find_symbol(&symbol.value) else {
            self.diagnostics.semantic(
                &symbol.span.start,
                SemanticError::UndefinedVariable {
                    variable: symbol.value.clone(),
                },
            );
            return Type::Bot;
        };

        if !self.check_visible(id, &symbol.span.start) {
            return Type::Bot;
        }

        self.bindings.bind(symbol.id, id);
        self.scopes.symbol(id).ty.clone()
    }

    fn check_prefix(&mut self, prefix: &PrefixExpr) -> Type {
        let operand = self.check_expr(&prefix.right_expr);
        let position = &prefix.right_expr.get_span().start;
        let operator = prefix.operator.to_string();

        match prefix.operator {
            PrefixOperator::Negate => {
                if self.expect_operand(&operator, &operand, &Type::Int, position) {
                    Type::Int
                } else {
                    Type::Bot
                }
            }
            PrefixOperator::Not => {
                if self.expect_operand(&operator, &operand, &Type::Bool, position) {
                    Type::Bool
                } else {
                    Type::Bot
                }
            }
        }
    }

    fn check_binary(&mut self, binary: &BinaryExpr) -> Type {
        let left = self.check_expr(&binary.left);
        let right = self.check_expr(&binary.right);
        let operator = binary.operator.to_string();

        if binary.operator.is_equality() {
            return self.check_equality(binary, &operator, left, right);
        }

        let (operand, result) = if binary.operator.is_arithmetic() {
            (Type::Int, Type::Int)
        } else if binary.operator.is_relational() {
            (Type::Int, Type::Bool)
        } else {
            (Type::Bool, Type::Bool)
        };

        // Both sides are checked so each one gets its own diagnostic.
        let left_ok =
            self.expect_operand(&operator, &left, &operand, &binary.left.get_span().start);
        let right_ok =
            self.expect_operand(&operator, &right, &operand, &binary.right.get_span().start);

        if left_ok && right_ok {
            result
        } else {
            Type::Bot
        }
    }

    fn check_equality(
        &mut self,
        binary: &BinaryExpr,
        operator: &str,
        left: Type,
        right: Type,
    ) -> Type {
        if self.types.prune(&left).is_bot() || self.types.prune(&right).is_bot() {
            return Type::Bot;
        }

        let forward = self.types.is_subtype(&left, &right);
        let backward = self.types.is_subtype(&right, &left);

        if !(forward && backward) {
            let error = SemanticError::EqualityMismatch {
                operator: operator.to_string(),
                left: self.describe(&left),
                right: self.describe(&right),
            };
            self.diagnostics.semantic(&binary.span.start, error);
            return Type::Bot;
        }

        match self.types.prune(&left) {
            Type::Int | Type::Bool | Type::Str => Type::Bool,
            _ => {
                let error = SemanticError::EqualityNotSupported {
                    operator: operator.to_string(),
                    received: self.describe(&left),
                };
                self.diagnostics.semantic(&binary.span.start, error);
                Type::Bot
            }
        }
    }

    fn check_assignment(&mut self, assignment: &AssignmentExpr) -> Type {
        let value = self.check_expr(&assignment.value);
        let position = &assignment.span.start;

        let symbol = match self.scopes.find_symbol(&assignment.assignee) {
            Some(id) => {
                if self.scopes.symbol(id).kind == SymbolKind::Function {
                    self.diagnostics.semantic(
                        position,
                        SemanticError::AssignToFunction {
                            function: assignment.assignee.clone(),
                        },
                    );
                    return Type::Bot;
                }

                if !self.check_visible(id, position) {
                    return Type::Bot;
                }

                let previous = self.scopes.symbol(id).ty.clone();
                if self.types.is_unresolved(&previous)
                    && !self.types.prune(&value).is_bot()
                    && !self.types.is_subtype(&previous, &value)
                {
                    let error = SemanticError::ConflictingInference {
                        variable: assignment.assignee.clone(),
                        expected: self.describe(&previous),
                        received: self.describe(&value),
                    };
                    self.diagnostics.semantic(position, error);
                }

                self.scopes.symbol_mut(id).ty = value.clone();
                id
            }
            None => {
                let Some(id) = self.scopes.add_symbol(&assignment.assignee, value.clone()) else {
                    return Type::Bot;
                };
                id
            }
        };

        self.bindings.bind(assignment.id, symbol);
        self.stored_types.insert(assignment.id, value.clone());

        if self.types.prune(&value).is_bot() {
            self.diagnostics.semantic(
                position,
                SemanticError::UndefinedAssignment {
                    variable: assignment.assignee.clone(),
                },
            );
        }

        value
    }

    fn check_array(&mut self, array: &ArrayExpr) -> Type {
        let elements = array
            .elements
            .iter()
            .map(|element| self.check_expr(element))
            .collect::<Vec<Type>>();

        if elements.iter().any(|ty| self.types.prune(ty).is_bot()) {
            return Type::Bot;
        }

        let Some(first) = elements.first().cloned() else {
            return Type::Bot;
        };
        let mut valid = true;

        for (element, ty) in array.elements.iter().zip(elements.iter()).skip(1) {
            if !self.types.is_subtype(ty, &first) {
                let error = SemanticError::ArrayElementMismatch {
                    expected: self.describe(&first),
                    received: self.describe(ty),
                };
                self.diagnostics.semantic(&element.get_span().start, error);
                valid = false;
            }
        }

        if valid {
            Type::array(first, elements.len() as u32)
        } else {
            Type::Bot
        }
    }

    fn check_index(&mut self, index: &IndexExpr) -> Type {
        let base = self.check_expr(&index.base);
        let offset = self.check_expr(&index.index);

        let index_ok = if self.types.prune(&offset).is_bot() {
            false
        } else if self.types.is_subtype(&offset, &Type::Int) {
            true
        } else {
            let error = SemanticError::IndexNotInt {
                received: self.describe(&offset),
            };
            self.diagnostics
                .semantic(&index.index.get_span().start, error);
            false
        };

        let element = match self.types.prune(&base) {
            Type::Bot => return Type::Bot,
            Type::Array(array) => array.element.clone(),
            _ => {
                let error = SemanticError::NotAnArray {
                    received: self.describe(&base),
                };
                self.diagnostics
                    .semantic(&index.base.get_span().start, error);
                return Type::Bot;
            }
        };

        if index_ok {
            element
        } else {
            Type::Bot
        }
    }

    /// Checks a call and returns its result type, `None` when the call
    /// itself is wrong. A `void` callee yields `Some(Type::Bot)`.
    pub fn check_call(&mut self, call: &CallExpr) -> Option<Type> {
        let arguments = call
            .arguments
            .iter()
            .map(|argument| self.check_expr(argument))
            .collect::<Vec<Type>>();
        let position = &call.span.start;

        let Some(id) = self.scopes.find_symbol(&call.callee) else {
            self.diagnostics.semantic(
                position,
                SemanticError::UndefinedFunction {
                    function: call.callee.clone(),
                },
            );
            return None;
        };

        if !self.check_visible(id, position) {
            return None;
        }

        let callee = self.scopes.symbol(id).ty.clone();
        let invoke = match self.types.prune(&callee) {
            Type::Invoke(invoke) => invoke,
            _ => {
                let error = SemanticError::NotAFunction {
                    name: call.callee.clone(),
                    found: self.describe(&callee),
                };
                self.diagnostics.semantic(position, error);
                return None;
            }
        };

        self.bindings.bind(call.id, id);

        let mut valid = true;
        let expected = invoke.params.len();
        if arguments.len() < expected || (arguments.len() > expected && !invoke.variadic) {
            self.diagnostics.semantic(
                position,
                SemanticError::ArgumentCount {
                    function: call.callee.clone(),
                    expected,
                    received: arguments.len(),
                },
            );
            valid = false;
        }

        for (index, (argument, param)) in arguments.iter().zip(invoke.params.iter()).enumerate() {
            if self.types.prune(argument).is_bot() {
                valid = false;
                continue;
            }

            if !self.types.is_subtype(argument, param) {
                let target = format!("argument {} of '{}'", index + 1, call.callee);
                let error = self
                    .sum_mismatch(target, argument, param)
                    .unwrap_or_else(|| SemanticError::ArgumentMismatch {
                        function: call.callee.clone(),
                        index: index + 1,
                        expected: self.describe(param),
                        received: self.describe(argument),
                    });
                self.diagnostics
                    .semantic(&call.arguments[index].get_span().start, error);
                valid = false;
            }
        }

        if valid {
            Some(invoke.ret.clone())
        } else {
            None
        }
    }
}
