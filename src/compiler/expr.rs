use inkwell::{
    types::BasicType,
    values::{BasicMetadataValueEnum, BasicValueEnum, CallableValue},
    IntPredicate,
};

use crate::{
    ast::{
        ast::Expr,
        expressions::{
            ArrayExpr, AssignmentExpr, BinaryExpr, BinaryOperator, CallExpr, IndexExpr,
            PrefixExpr, PrefixOperator, SymbolExpr,
        },
    },
    errors::diagnostics::CodegenError,
    type_checker::types::Type,
};

use super::compiler::Compiler;

/// Generates LLVM IR for the given expression.
pub fn gen_expression<'a>(
    compiler: &mut Compiler<'a, '_>,
    expression: &Expr,
) -> Result<BasicValueEnum<'a>, CodegenError> {
    compiler.position = expression.get_span().start.clone();

    match expression {
        Expr::Number(number) => Ok(compiler
            .context
            .i32_type()
            .const_int(number.value as u64, true)
            .into()),
        Expr::Boolean(boolean) => Ok(compiler
            .context
            .i8_type()
            .const_int(boolean.value as u64, false)
            .into()),
        Expr::String(string) => Ok(compiler
            .builder
            .build_global_string_ptr(&string.value, "str")?
            .as_pointer_value()
            .into()),
        Expr::Symbol(symbol) => gen_symbol(compiler, symbol),
        Expr::Array(array) => gen_array(compiler, array),
        Expr::Index(index) => gen_index(compiler, index),
        Expr::Binary(binary) => gen_binary(compiler, binary),
        Expr::Prefix(prefix) => gen_prefix(compiler, prefix),
        Expr::Assignment(assignment) => gen_assignment(compiler, assignment),
        Expr::Call(call) => gen_call(compiler, call)?.ok_or_else(|| CodegenError::NoValue {
            function: call.callee.clone(),
        }),
    }
}

fn gen_symbol<'a>(
    compiler: &mut Compiler<'a, '_>,
    symbol: &SymbolExpr,
) -> Result<BasicValueEnum<'a>, CodegenError> {
    let id = compiler.symbol_of(symbol.id)?;

    // A function named as a value is its address.
    if let Some(function) = compiler.functions.get(&id) {
        return Ok(function.as_global_value().as_pointer_value().into());
    }

    let slot = compiler
        .slot_of(id)
        .ok_or_else(|| CodegenError::MissingStorage {
            variable: symbol.value.clone(),
        })?;

    Ok(compiler.builder.build_load(slot.pointer, &symbol.value)?)
}

fn gen_array<'a>(
    compiler: &mut Compiler<'a, '_>,
    array: &ArrayExpr,
) -> Result<BasicValueEnum<'a>, CodegenError> {
    let mut values = vec![];
    for element in array.elements.iter() {
        values.push(gen_expression(compiler, element)?);
    }

    let Some(first) = values.first() else {
        return Err(CodegenError::UnsupportedOperands {
            operator: String::from("[]"),
        });
    };

    let mut aggregate = first.get_type().array_type(values.len() as u32).get_undef();
    for (index, value) in values.iter().enumerate() {
        aggregate = compiler
            .builder
            .build_insert_value(aggregate, *value, index as u32, "array")?
            .into_array_value();
    }

    Ok(aggregate.into())
}

fn gen_index<'a>(
    compiler: &mut Compiler<'a, '_>,
    index: &IndexExpr,
) -> Result<BasicValueEnum<'a>, CodegenError> {
    let base = gen_expression(compiler, &index.base)?;
    let BasicValueEnum::IntValue(offset) = gen_expression(compiler, &index.index)? else {
        return Err(CodegenError::UnsupportedOperands {
            operator: String::from("[]"),
        });
    };

    let array = compiler.spill(base, "array")?;
    let zero = compiler.context.i32_type().const_zero();
    let element = unsafe {
        compiler
            .builder
            .build_in_bounds_gep(array, &[zero, offset], "element")?
    };

    Ok(compiler.builder.build_load(element, "element")?)
}

fn gen_prefix<'a>(
    compiler: &mut Compiler<'a, '_>,
    prefix: &PrefixExpr,
) -> Result<BasicValueEnum<'a>, CodegenError> {
    let BasicValueEnum::IntValue(operand) = gen_expression(compiler, &prefix.right_expr)? else {
        return Err(CodegenError::UnsupportedOperands {
            operator: prefix.operator.to_string(),
        });
    };
    let operand = compiler.unfold(operand)?;

    match prefix.operator {
        PrefixOperator::Negate => Ok(compiler.builder.build_int_neg(operand, "neg")?.into()),
        PrefixOperator::Not => {
            let one = operand.get_type().const_int(1, false);
            Ok(compiler.builder.build_xor(operand, one, "not")?.into())
        }
    }
}

fn gen_binary<'a>(
    compiler: &mut Compiler<'a, '_>,
    binary: &BinaryExpr,
) -> Result<BasicValueEnum<'a>, CodegenError> {
    let left = gen_expression(compiler, &binary.left)?;
    let right = gen_expression(compiler, &binary.right)?;
    compiler.position = binary.span.start.clone();

    match (left, right) {
        (BasicValueEnum::IntValue(left), BasicValueEnum::IntValue(right)) => {
            let (left, right) = compiler.unfold_pair(left, right)?;
            let builder = &compiler.builder;

            let predicate = match binary.operator {
                BinaryOperator::Add => return Ok(builder.build_int_add(left, right, "add")?.into()),
                BinaryOperator::Subtract => {
                    return Ok(builder.build_int_sub(left, right, "sub")?.into())
                }
                BinaryOperator::Multiply => {
                    return Ok(builder.build_int_mul(left, right, "mul")?.into())
                }
                BinaryOperator::Divide => {
                    return Ok(builder.build_int_signed_div(left, right, "div")?.into())
                }
                BinaryOperator::And => return Ok(builder.build_and(left, right, "and")?.into()),
                BinaryOperator::Or => return Ok(builder.build_or(left, right, "or")?.into()),
                BinaryOperator::Less => IntPredicate::SLT,
                BinaryOperator::LessEquals => IntPredicate::SLE,
                BinaryOperator::Greater => IntPredicate::SGT,
                BinaryOperator::GreaterEquals => IntPredicate::SGE,
                BinaryOperator::Equals => IntPredicate::EQ,
                BinaryOperator::NotEquals => IntPredicate::NE,
            };

            let comparison = builder.build_int_compare(predicate, left, right, "cmp")?;
            compiler.widen(comparison)
        }
        (BasicValueEnum::PointerValue(left), BasicValueEnum::PointerValue(right))
            if binary.operator.is_equality() =>
        {
            // strings compare by content
            let strcmp = compiler.external("strcmp")?;
            let order = compiler
                .builder
                .build_call(strcmp, &[left.into(), right.into()], "strcmp")?
                .try_as_basic_value()
                .left()
                .ok_or_else(|| CodegenError::NoValue {
                    function: String::from("strcmp"),
                })?
                .into_int_value();

            let predicate = if binary.operator == BinaryOperator::Equals {
                IntPredicate::EQ
            } else {
                IntPredicate::NE
            };
            let comparison = compiler.builder.build_int_compare(
                predicate,
                order,
                compiler.context.i32_type().const_zero(),
                "cmp",
            )?;
            compiler.widen(comparison)
        }
        _ => Err(CodegenError::UnsupportedOperands {
            operator: binary.operator.to_string(),
        }),
    }
}

fn gen_assignment<'a>(
    compiler: &mut Compiler<'a, '_>,
    assignment: &AssignmentExpr,
) -> Result<BasicValueEnum<'a>, CodegenError> {
    let value = gen_expression(compiler, &assignment.value)?;
    compiler.position = assignment.span.start.clone();

    let symbol = compiler.symbol_of(assignment.id)?;
    let stored = compiler.stored_type(assignment.id, &assignment.assignee)?;
    compiler.write_symbol(symbol, &stored, value)?;

    Ok(value)
}

/// Lowers a call. `None` when the callee returns `void`.
pub fn gen_call<'a>(
    compiler: &mut Compiler<'a, '_>,
    call: &CallExpr,
) -> Result<Option<BasicValueEnum<'a>>, CodegenError> {
    let mut values = vec![];
    for argument in call.arguments.iter() {
        values.push(gen_expression(compiler, argument)?);
    }
    compiler.position = call.span.start.clone();

    let symbol = compiler.symbol_of(call.id)?;
    let not_a_function = || CodegenError::NotAFunction {
        name: call.callee.clone(),
    };

    let direct = compiler.functions.get(&symbol).copied();
    let callee_type = match direct {
        Some(_) => compiler.analysis.scopes.symbol(symbol).ty.clone(),
        None => compiler
            .slot_of(symbol)
            .ok_or_else(|| CodegenError::MissingStorage {
                variable: call.callee.clone(),
            })?
            .ty
            .clone(),
    };
    let Type::Invoke(invoke) = compiler.analysis.types.prune(&callee_type) else {
        return Err(not_a_function());
    };

    let mut arguments: Vec<BasicMetadataValueEnum<'a>> = vec![];
    for (index, value) in values.into_iter().enumerate() {
        let value = match invoke.params.get(index) {
            Some(param) => compiler.coerce(value, param)?,
            None => value,
        };
        arguments.push(value.into());
    }

    // void results cannot carry a name
    let name = if compiler.analysis.types.prune(&invoke.ret).is_bot() {
        ""
    } else {
        "call"
    };

    let site = match direct {
        Some(function) => compiler.builder.build_call(function, &arguments, name)?,
        None => {
            let pointer = compiler.slot_of(symbol).ok_or_else(not_a_function)?.pointer;
            let BasicValueEnum::PointerValue(callee) =
                compiler.builder.build_load(pointer, &call.callee)?
            else {
                return Err(not_a_function());
            };
            let callee = CallableValue::try_from(callee).map_err(|_| not_a_function())?;

            compiler.builder.build_call(callee, &arguments, name)?
        }
    };

    Ok(site.try_as_basic_value().left())
}
