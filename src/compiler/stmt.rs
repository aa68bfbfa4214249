use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, FunctionValue, IntValue};

use crate::{
    ast::{
        ast::{Expr, Stmt},
        statements::{
            BlockStmt, FnDeclStmt, IfStmt, PrintStmt, ReturnStmt, SelectStmt, VarDeclStmt,
            WhileStmt,
        },
    },
    errors::diagnostics::CodegenError,
    type_checker::types::Type,
};

use super::{
    compiler::Compiler,
    expr::{gen_call, gen_expression},
};

/// Lowers one statement, turning a failure into a Codegen diagnostic at the
/// node being lowered when it happened.
pub fn lower_statement(compiler: &mut Compiler<'_, '_>, statement: &Stmt) {
    compiler.position = statement.get_span().start.clone();

    if let Err(error) = gen_statement(compiler, statement) {
        log::warn!("lowering failed at {}: {}", compiler.position, error);
        let position = compiler.position.clone();
        compiler.diagnostics.codegen(&position, error);
    }
}

pub fn gen_statement(compiler: &mut Compiler<'_, '_>, statement: &Stmt) -> Result<(), CodegenError> {
    match statement {
        Stmt::Block(block) => gen_block(compiler, block),
        Stmt::Expression(stmt) => {
            match &stmt.expression {
                Expr::Call(call) => {
                    gen_call(compiler, call)?;
                }
                expression => {
                    gen_expression(compiler, expression)?;
                }
            }
            Ok(())
        }
        Stmt::VarDecl(decl) => gen_var_decl(compiler, decl),
        Stmt::If(stmt) => gen_if(compiler, stmt),
        Stmt::While(stmt) => gen_while(compiler, stmt),
        Stmt::Select(stmt) => gen_select(compiler, stmt),
        Stmt::FnDecl(function) => gen_function(compiler, function),
        Stmt::Return(stmt) => gen_return(compiler, stmt),
        Stmt::Print(stmt) => gen_print(compiler, stmt),
    }
}

/// Statements of a nested block. Each one fails on its own.
fn gen_block(compiler: &mut Compiler<'_, '_>, block: &BlockStmt) -> Result<(), CodegenError> {
    for statement in block.body.iter() {
        lower_statement(compiler, statement);
    }
    Ok(())
}

fn gen_var_decl(compiler: &mut Compiler<'_, '_>, decl: &VarDeclStmt) -> Result<(), CodegenError> {
    // Without an initializer nothing is stored yet, so nothing is allocated.
    let Some(init) = &decl.assigned_value else {
        return Ok(());
    };

    let value = gen_expression(compiler, init)?;
    compiler.position = decl.span.start.clone();

    let symbol = compiler.symbol_of(decl.id)?;
    let stored = compiler.stored_type(decl.id, &decl.identifier)?;
    compiler.write_symbol(symbol, &stored, value)
}

fn condition_of<'a>(
    compiler: &mut Compiler<'a, '_>,
    condition: &Expr,
) -> Result<IntValue<'a>, CodegenError> {
    let BasicValueEnum::IntValue(value) = gen_expression(compiler, condition)? else {
        return Err(CodegenError::UnsupportedOperands {
            operator: String::from("condition"),
        });
    };
    compiler.to_condition(value)
}

fn gen_if(compiler: &mut Compiler<'_, '_>, stmt: &IfStmt) -> Result<(), CodegenError> {
    let condition = condition_of(compiler, &stmt.condition)?;

    let then_block = compiler.append_block("then")?;
    let else_block = match stmt.else_body {
        Some(_) => Some(compiler.append_block("else")?),
        None => None,
    };
    let end_block = compiler.append_block("end")?;

    compiler.builder.build_conditional_branch(
        condition,
        then_block,
        else_block.unwrap_or(end_block),
    )?;

    compiler.builder.position_at_end(then_block);
    gen_block(compiler, &stmt.then_body)?;
    compiler.branch_to(end_block)?;

    if let (Some(else_block), Some(else_body)) = (else_block, &stmt.else_body) {
        compiler.builder.position_at_end(else_block);
        gen_block(compiler, else_body)?;
        compiler.branch_to(end_block)?;
    }

    compiler.builder.position_at_end(end_block);
    Ok(())
}

fn gen_while(compiler: &mut Compiler<'_, '_>, stmt: &WhileStmt) -> Result<(), CodegenError> {
    let condition_block = compiler.append_block("cond")?;
    let body_block = compiler.append_block("body")?;
    let end_block = compiler.append_block("end")?;

    compiler.branch_to(condition_block)?;

    compiler.builder.position_at_end(condition_block);
    let condition = condition_of(compiler, &stmt.condition)?;
    compiler
        .builder
        .build_conditional_branch(condition, body_block, end_block)?;

    compiler.builder.position_at_end(body_block);
    gen_block(compiler, &stmt.body)?;
    compiler.branch_to(condition_block)?;

    compiler.builder.position_at_end(end_block);
    Ok(())
}

/// The first case whose condition holds runs, otherwise the default.
fn gen_select(compiler: &mut Compiler<'_, '_>, stmt: &SelectStmt) -> Result<(), CodegenError> {
    let mut arms = vec![];
    for _ in stmt.cases.iter() {
        arms.push((compiler.append_block("case")?, compiler.append_block("then")?));
    }
    let default_block = match stmt.default {
        Some(_) => Some(compiler.append_block("default")?),
        None => None,
    };
    let end_block = compiler.append_block("end")?;

    let fallback = default_block.unwrap_or(end_block);
    let first = arms.first().map(|(test, _)| *test).unwrap_or(fallback);
    compiler.branch_to(first)?;

    for (index, (case, (test_block, body_block))) in stmt.cases.iter().zip(arms.iter()).enumerate()
    {
        let next = arms
            .get(index + 1)
            .map(|(test, _)| *test)
            .unwrap_or(fallback);

        compiler.builder.position_at_end(*test_block);
        let condition = condition_of(compiler, &case.condition)?;
        compiler
            .builder
            .build_conditional_branch(condition, *body_block, next)?;

        compiler.builder.position_at_end(*body_block);
        gen_block(compiler, &case.body)?;
        compiler.branch_to(end_block)?;
    }

    if let (Some(default_block), Some(default)) = (default_block, &stmt.default) {
        compiler.builder.position_at_end(default_block);
        gen_block(compiler, default)?;
        compiler.branch_to(end_block)?;
    }

    compiler.builder.position_at_end(end_block);
    Ok(())
}

/// Declares the function on first sight and lowers its body when it has
/// one. A definition reuses the declaration made for its forward
/// declaration.
fn gen_function(compiler: &mut Compiler<'_, '_>, function: &FnDeclStmt) -> Result<(), CodegenError> {
    let symbol = compiler.symbol_of(function.id)?;
    let ty = compiler.analysis.scopes.symbol(symbol).ty.clone();
    let Type::Invoke(invoke) = compiler.analysis.types.prune(&ty) else {
        return Err(CodegenError::NotAFunction {
            name: function.identifier.clone(),
        });
    };

    let value = match compiler.functions.get(&symbol) {
        Some(value) => *value,
        None => {
            let fn_type = compiler
                .llvm_fn_type(&invoke)
                .ok_or_else(|| CodegenError::NoIrType {
                    ty: compiler.describe(&ty),
                })?;
            let value = compiler
                .module
                .add_function(&function.identifier, fn_type, None);
            compiler.functions.insert(symbol, value);

            log::debug!("function '{}' declared", function.identifier);
            value
        }
    };

    let Some(body) = &function.body else {
        return Ok(());
    };

    let previous_block = compiler.builder.get_insert_block();
    let previous_function = compiler.current_function.replace(value);
    let previous_return = compiler.current_return.replace(invoke.ret.clone());
    let previous_cells = std::mem::take(&mut compiler.literal_cells);

    let entry = compiler.context.append_basic_block(value, "entry");
    compiler.builder.position_at_end(entry);

    let result = gen_function_body(compiler, function, body, value);

    compiler.literal_cells = previous_cells;
    compiler.current_return = previous_return;
    compiler.current_function = previous_function;
    match previous_block {
        Some(block) => compiler.builder.position_at_end(block),
        None => compiler.builder.clear_insertion_position(),
    }

    result
}

fn gen_function_body<'a>(
    compiler: &mut Compiler<'a, '_>,
    function: &FnDeclStmt,
    body: &BlockStmt,
    value: FunctionValue<'a>,
) -> Result<(), CodegenError> {
    // parameters are spilled so they behave like any other variable
    for (parameter, argument) in function.parameters.iter().zip(value.get_param_iter()) {
        argument.set_name(&parameter.name);

        let symbol = compiler.symbol_of(parameter.id)?;
        let stored = compiler.stored_type(parameter.id, &parameter.name)?;
        compiler.write_symbol(symbol, &stored, argument)?;
    }

    gen_block(compiler, body)?;
    compiler.close_function()
}

fn gen_return(compiler: &mut Compiler<'_, '_>, stmt: &ReturnStmt) -> Result<(), CodegenError> {
    match &stmt.value {
        Some(value) => {
            let value = gen_expression(compiler, value)?;
            let value = match compiler.current_return.clone() {
                Some(ret) => compiler.coerce(value, &ret)?,
                None => value,
            };
            compiler.builder.build_return(Some(&value))?;
        }
        None => {
            compiler.builder.build_return(None)?;
        }
    }

    // Anything after a return is unreachable but still needs a block.
    let after = compiler.append_block("after_return")?;
    compiler.builder.position_at_end(after);
    Ok(())
}

/// One `printf` call: ints as `%d`, strings and booleans as `%s`, separated
/// by spaces and ended by a newline.
fn gen_print(compiler: &mut Compiler<'_, '_>, stmt: &PrintStmt) -> Result<(), CodegenError> {
    let mut specifiers = vec![];
    let mut arguments: Vec<BasicMetadataValueEnum> = vec![];

    for argument in stmt.arguments.iter() {
        match gen_expression(compiler, argument)? {
            BasicValueEnum::IntValue(value) if value.get_type().get_bit_width() == 32 => {
                specifiers.push("%d");
                arguments.push(value.into());
            }
            BasicValueEnum::IntValue(value) => {
                let (yes, no) = compiler.boolean_strings()?;
                let flag = compiler.to_condition(value)?;
                let text = compiler.builder.build_select(flag, yes, no, "text")?;
                specifiers.push("%s");
                arguments.push(text.into());
            }
            BasicValueEnum::PointerValue(value) => {
                specifiers.push("%s");
                arguments.push(value.into());
            }
            _ => {
                return Err(CodegenError::UnsupportedOperands {
                    operator: String::from("print"),
                })
            }
        }
    }

    let format = format!("{}\n", specifiers.join(" "));
    let format = compiler
        .builder
        .build_global_string_ptr(&format, "format")?
        .as_pointer_value();
    arguments.insert(0, format.into());

    let printf = compiler.external("printf")?;
    compiler.builder.build_call(printf, &arguments, "")?;
    Ok(())
}
