//! Lowering tests. Each one checks a unit clean, lowers it and inspects the
//! printed IR or the Codegen diagnostics.

use std::rc::Rc;

use inkwell::context::Context;

use super::compiler::compile;
use crate::{
    config::{CompilerConfig, TargetSelection},
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::type_check,
};

fn lower_with(source: &str, config: &CompilerConfig) -> Result<String, Vec<String>> {
    let tokens = tokenize(source.to_string(), Some("test.arrow".to_string())).unwrap();
    let (_, program) = parse(tokens, Rc::new("test.arrow".to_string()));
    let program = program.unwrap();

    let mut analysis = type_check(&program);
    assert!(
        analysis.diagnostics.is_empty(),
        "unexpected semantic diagnostics: {}",
        analysis.diagnostics
    );

    let context = Context::create();
    compile(&context, &program, &mut analysis, config)
        .map(|module| module.print_to_string().to_string())
        .map_err(|diagnostics| {
            diagnostics
                .iter()
                .map(|diagnostic| diagnostic.to_string())
                .collect()
        })
}

fn lower(source: &str) -> String {
    match lower_with(source, &CompilerConfig::default()) {
        Ok(ir) => ir,
        Err(diagnostics) => panic!("unexpected codegen diagnostics: {:?}", diagnostics),
    }
}

#[test]
fn test_module_scaffolding() {
    let ir = lower("");

    assert!(ir.contains("declare i32 @printf(i8*, ...)"));
    assert!(ir.contains("declare i32 @strcmp(i8*, i8*)"));
    assert!(ir.contains("define i32 @main()"));
    assert!(ir.contains("ret i32 0"));
}

#[test]
fn test_storage_is_allocated_at_first_write() {
    let ir = lower("int a; int b <- 1;");

    assert!(ir.contains("%b = alloca i32"));
    assert!(!ir.contains("%a = alloca"));
    assert_eq!(ir.matches("alloca").count(), 1);
    assert!(ir.contains("store i32 1, i32* %b"));
}

#[test]
fn test_read_before_write() {
    let diagnostics = lower_with("int a; print(a);", &CompilerConfig::default()).unwrap_err();

    assert_eq!(
        diagnostics,
        vec!["CODEGEN: [1,14]: variable 'a' has no storage at this point"]
    );
}

#[test]
fn test_storage_is_reused() {
    let ir = lower("int a <- 1; a <- a + 2; print(a);");

    assert_eq!(ir.matches("alloca").count(), 1);
    assert_eq!(ir.matches("store i32").count(), 2);
}

#[test]
fn test_literal_operations_are_not_folded() {
    let ir = lower("int a <- 2 + 3;");

    assert!(ir.contains("%literal = alloca i32"));
    assert!(ir.contains("store i32 2, i32* %literal"));
    assert!(ir.contains("= add i32"));
    assert!(!ir.contains("store i32 5"));
}

#[test]
fn test_folding_can_be_enabled() {
    let config = CompilerConfig::default().with_fold_constants(true);
    let ir = lower_with("int a <- 2 + 3;", &config).unwrap();

    assert!(ir.contains("store i32 5"));
    assert!(!ir.contains("literal"));
}

#[test]
fn test_boolean_operations() {
    let ir = lower("boolean a <- (false | true) & ~false;");

    assert!(ir.contains("%a = alloca i8"));
    assert!(ir.contains("= or i8"));
    assert!(ir.contains("= xor i8"));
    assert!(ir.contains("= and i8"));
}

#[test]
fn test_comparisons_widen_to_i8() {
    let ir = lower("int x <- 1; boolean b <- x < 2;");

    assert!(ir.contains("icmp slt i32"));
    assert!(ir.contains("zext i1"));
}

#[test]
fn test_reassignment_gets_a_new_slot() {
    let ir = lower("int a <- 1; a <- true;");

    assert!(ir.contains("%a = alloca i32"));
    assert!(ir.contains("alloca i8"));
    assert!(ir.contains("store i8 1"));
}

#[test]
fn test_if_blocks() {
    let ir = lower("int a <- 1; if a < 2 { print(1); } else { print(2); }");

    assert!(ir.contains("\nthen:"));
    assert!(ir.contains("\nelse:"));
    assert!(ir.contains("\nend:"));
    assert!(ir.contains("br i1"));
}

#[test]
fn test_while_blocks() {
    let ir = lower("int i <- 0; while i < 3 { i <- i + 1; }");

    assert!(ir.contains("\ncond:"));
    assert!(ir.contains("\nbody:"));
    assert!(ir.contains("\nend:"));
    assert!(ir.contains("br label %cond"));
}

#[test]
fn test_select_blocks() {
    let ir = lower(
        "int a <- 2;\n\
         select {\n\
             case a = 1 { print(1); }\n\
             case a = 2 { print(2); }\n\
             default { print(0); }\n\
         }",
    );

    assert!(ir.contains("\ncase:"));
    assert!(ir.contains("\ncase1:"));
    assert!(ir.contains("\ndefault:"));
    assert!(ir.contains("\nend:"));
}

#[test]
fn test_print_format() {
    let ir = lower("print(1, \"two\", true);");

    assert!(ir.contains("c\"%d %s %s\\0A\\00\""));
    assert!(ir.contains("c\"true\\00\""));
    assert!(ir.contains("c\"false\\00\""));
    assert!(ir.contains("call i32 (i8*, ...) @printf"));
}

#[test]
fn test_string_equality() {
    let ir = lower("boolean same <- \"a\" = \"b\";");

    assert!(ir.contains("call i32 @strcmp"));
}

#[test]
fn test_arrays_and_indexing() {
    let ir = lower("int[3] a <- [1, 2, 3]; print(a[1]);");

    assert!(ir.contains("alloca [3 x i32]"));
    assert!(ir.contains("[i32 1, i32 2, i32 3]"));
    assert!(ir.contains("getelementptr inbounds [3 x i32]"));
}

#[test]
fn test_functions() {
    let ir = lower(
        "function int add(int a, int b) { return a + b; }\n\
         function void show(string s) { print(s); }\n\
         print(add(1, 2));\n\
         show(\"hi\");",
    );

    assert!(ir.contains("define i32 @add(i32 %a, i32 %b)"));
    assert!(ir.contains("define void @show(i8* %s)"));
    assert!(ir.contains("call i32 @add(i32 1, i32 2)"));
    assert!(ir.contains("call void @show("));
    assert!(ir.contains("ret void"));
}

#[test]
fn test_forward_declaration_is_defined_once() {
    let ir = lower(
        "function int twice(int x);\n\
         print(twice(2));\n\
         function int twice(int x) { return x * 2; }",
    );

    assert_eq!(ir.matches("define i32 @twice").count(), 1);
    assert!(!ir.contains("declare i32 @twice"));
}

#[test]
fn test_recursion() {
    let ir = lower(
        "function int fact(int n) {\n\
             if n < 2 { return 1; }\n\
             return n * fact(n - 1);\n\
         }\n\
         print(fact(5));",
    );

    assert!(ir.contains("call i32 @fact("));
    assert!(ir.contains("after_return"));
}

#[test]
fn test_function_values() {
    let ir = lower(
        "function int one() { return 1; }\n\
         var f <- one;\n\
         print(f());",
    );

    assert!(ir.contains("alloca i32 ()*"));
    assert!(ir.contains("store i32 ()* @one"));
    assert!(ir.contains("%call = call i32 %f"));
}

#[test]
fn test_call_through_variable_with_arguments() {
    let ir = lower(
        "function int h(int n) { return n; }\n\
         var g <- h;\n\
         print(g(2));",
    );

    assert!(ir.contains("alloca i32 (i32)*"));
    assert!(ir.contains("store i32 (i32)* @h"));
    assert!(ir.contains("%call = call i32 %g(i32 2)"));
}

#[test]
fn test_sum_storage() {
    let ir = lower("int | boolean s <- true;");

    assert!(ir.contains("alloca { i32, [4 x i8] }"));
    assert!(ir.contains("store i32 1, i32* %tag"));
    assert!(ir.contains("store i8 1, i8* %member"));
}

#[test]
fn test_sum_arguments_are_wrapped() {
    let ir = lower(
        "function void take(int | boolean v) { }\n\
         take(3);",
    );

    assert!(ir.contains("define void @take({ i32, [4 x i8] } %v)"));
    assert!(ir.contains("store i32 0, i32* %tag"));
    assert!(ir.contains("call void @take({ i32, [4 x i8] }"));
}

#[test]
fn test_host_target() {
    let config = CompilerConfig::default().with_target(TargetSelection::Host);
    let ir = lower_with("int a <- 1;", &config).unwrap();

    assert!(ir.contains("target triple"));
    assert!(ir.contains("target datalayout"));
}

#[test]
fn test_unknown_target() {
    let config =
        CompilerConfig::default().with_target(TargetSelection::Triple("nowhere-x-y".to_string()));
    let diagnostics = lower_with("int a <- 1;", &config).unwrap_err();

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].starts_with("CODEGEN: [1,1]: target setup failed"));
}
