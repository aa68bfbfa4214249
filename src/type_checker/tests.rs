//! Unit tests for the type model, the scope manager and the checker.

use std::rc::Rc;

use super::{
    scope::{ScopeManager, SymbolKind},
    type_checker::{type_check, Analysis},
    types::{Type, TypeTable},
};
use crate::{
    ast::ast::{Expr, Stmt},
    lexer::lexer::tokenize,
    parser::parser::parse,
};

fn check(source: &str) -> Analysis {
    let tokens = tokenize(source.to_string(), Some("test.arrow".to_string())).unwrap();
    let (_, program) = parse(tokens, Rc::new("test.arrow".to_string()));
    type_check(&program.unwrap())
}

fn messages(analysis: &Analysis) -> Vec<String> {
    analysis
        .diagnostics
        .iter()
        .map(|diagnostic| diagnostic.to_string())
        .collect()
}

fn assert_clean(source: &str) -> Analysis {
    let analysis = check(source);
    assert!(
        analysis.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        messages(&analysis)
    );
    analysis
}

/// Type of the first symbol called `name`.
fn symbol_type(analysis: &Analysis, name: &str) -> String {
    let symbol = analysis
        .scopes
        .symbols()
        .iter()
        .find(|symbol| symbol.identifier == name)
        .unwrap();
    analysis.types.describe(&symbol.ty)
}

// SCOPES

#[test]
fn test_scope_nesting() {
    let mut scopes = ScopeManager::new();
    let global = scopes.enter_scope();
    let inner = scopes.enter_scope();

    assert_eq!(global.0, 0);
    assert_eq!(inner.0, 1);
    assert_eq!(scopes.scope(inner).parent, Some(global));
    assert_eq!(scopes.scope(global).parent, None);

    assert_eq!(scopes.exit_scope(), Some(inner));
    assert_eq!(scopes.current(), Some(global));

    // exited scopes stay in the history
    let sibling = scopes.enter_scope();
    assert_eq!(sibling.0, 2);
    assert_eq!(scopes.scopes().len(), 3);
}

#[test]
fn test_shadowing_and_lookup() {
    let mut scopes = ScopeManager::new();
    scopes.enter_scope();
    let outer = scopes.add_symbol("a", Type::Int).unwrap();

    scopes.enter_scope();
    assert_eq!(scopes.find_symbol("a"), Some(outer));
    assert_eq!(scopes.find_local("a"), None);

    let inner = scopes.add_symbol("a", Type::Bool).unwrap();
    assert_ne!(inner, outer);
    assert_eq!(scopes.find_symbol("a"), Some(inner));

    scopes.exit_scope();
    assert_eq!(scopes.find_symbol("a"), Some(outer));
    assert_eq!(scopes.find_symbol("missing"), None);
}

#[test]
fn test_duplicate_in_same_scope() {
    let mut scopes = ScopeManager::new();
    scopes.enter_scope();

    assert!(scopes.add_symbol("a", Type::Int).is_some());
    assert!(scopes.add_symbol("a", Type::Int).is_none());
    assert!(scopes
        .add_symbol_of_kind("f", Type::Bot, SymbolKind::Function)
        .is_some());
}

#[test]
fn test_is_within() {
    let mut scopes = ScopeManager::new();
    let global = scopes.enter_scope();
    let function = scopes.enter_scope();
    let block = scopes.enter_scope();

    assert!(scopes.is_within(block, function));
    assert!(scopes.is_within(block, global));
    assert!(scopes.is_within(function, function));
    assert!(!scopes.is_within(global, function));
}

#[test]
fn test_scope_dump_lists_bindings() {
    let analysis = assert_clean("int a <- 1; { boolean b <- true; }");
    let dump = analysis.scopes.to_string();

    assert!(dump.contains("scope 0 (root)"));
    assert!(dump.contains("scope 1 (parent 0)"));
    assert!(dump.contains("  a: int"));
    assert!(dump.contains("  b: boolean"));
}

// TYPE MODEL

#[test]
fn test_leaf_reflexivity() {
    let mut types = TypeTable::new();

    for leaf in [Type::Int, Type::Bool, Type::Str] {
        assert!(types.is_subtype(&leaf, &leaf.clone()));
    }

    assert!(!types.is_subtype(&Type::Int, &Type::Bool));
    assert!(!types.is_subtype(&Type::Str, &Type::Int));
    assert!(!types.is_subtype(&Type::Bool, &Type::Str));
}

#[test]
fn test_bot_is_never_a_supertype() {
    let mut types = TypeTable::new();

    assert!(!types.is_subtype(&Type::Bot, &Type::Bot));
    assert!(!types.is_subtype(&Type::Int, &Type::Bot));
    assert!(!types.is_subtype(&Type::Bot, &Type::Int));
}

#[test]
fn test_array_covariance_and_length() {
    let mut types = TypeTable::new();

    let a = Type::array(Type::Int, 3);
    let b = Type::array(Type::Int, 3);
    let c = Type::array(Type::Int, 4);
    let d = Type::array(Type::Bool, 3);

    assert!(types.is_subtype(&a, &b));
    assert!(!types.is_subtype(&a, &c));
    assert!(!types.is_subtype(&a, &d));

    // the element may still be inferred
    let inferred = types.fresh();
    let e = Type::array(inferred.clone(), 3);
    assert!(types.is_subtype(&e, &a));
    assert_eq!(types.prune(&inferred), Type::Int);
}

#[test]
fn test_invoke_subtyping() {
    let mut types = TypeTable::new();

    let f = Type::invoke(vec![Type::Int, Type::Bool], Type::Int, false, true);
    let g = Type::invoke(vec![Type::Int, Type::Bool], Type::Int, false, false);
    let arity = Type::invoke(vec![Type::Int], Type::Int, false, true);
    let variadic = Type::invoke(vec![Type::Int, Type::Bool], Type::Int, true, true);
    let void_a = Type::invoke(vec![], Type::Bot, false, true);
    let void_b = Type::invoke(vec![], Type::Bot, false, true);
    let returns_bool = Type::invoke(vec![Type::Int, Type::Bool], Type::Bool, false, true);

    assert!(types.is_subtype(&f, &g));
    assert!(!types.is_subtype(&f, &arity));
    assert!(!types.is_subtype(&f, &variadic));
    assert!(types.is_subtype(&void_a, &void_b));
    assert!(!types.is_subtype(&f, &returns_bool));
}

#[test]
fn test_sum_membership_is_identity() {
    let mut types = TypeTable::new();

    let element = Type::array(Type::Int, 2);
    let sum = Type::sum(vec![Type::Int, Type::Bool, element.clone()]);

    assert!(types.is_subtype(&Type::Int, &sum));
    assert!(types.is_subtype(&Type::Bool, &sum));
    assert!(!types.is_subtype(&Type::Str, &sum));
    assert!(types.is_subtype(&element, &sum));

    // structurally equal, different value
    let lookalike = Type::array(Type::Int, 2);
    assert!(!types.is_subtype(&lookalike, &sum));
}

#[test]
fn test_inference_convergence() {
    let mut types = TypeTable::new();

    let a = types.fresh();
    let b = types.fresh();
    let c = types.fresh();

    // unifying unresolved variables only links them
    assert!(types.is_subtype(&a, &b));
    assert!(types.is_subtype(&b, &c));
    assert!(types.is_unresolved(&a));

    assert!(types.is_subtype(&c, &Type::Int));

    assert_eq!(types.prune(&a), Type::Int);
    assert_eq!(types.prune(&b), Type::Int);
    assert_eq!(types.prune(&c), Type::Int);
}

#[test]
fn test_infer_binds_to_resolved_peer() {
    let mut types = TypeTable::new();

    let a = types.fresh();
    let b = types.fresh();
    assert!(types.is_subtype(&b, &Type::Str));
    assert!(types.is_subtype(&a, &b));

    assert_eq!(types.prune(&a), Type::Str);
}

#[test]
fn test_bind_keeps_first_resolution() {
    let mut types = TypeTable::new();

    let a = types.fresh();
    let Type::Infer(id) = a.clone() else {
        panic!("fresh must be an inference variable");
    };

    assert!(types.bind(id, &Type::Int));
    assert!(types.bind(id, &Type::Int));
    assert!(!types.bind(id, &Type::Bool));
    assert_eq!(types.prune(&a), Type::Int);

    let other = types.fresh();
    let Type::Infer(other_id) = other.clone() else {
        panic!("fresh must be an inference variable");
    };
    assert!(!types.bind(other_id, &a));
    assert!(types.is_unresolved(&other));
}

#[test]
fn test_describe() {
    let mut types = TypeTable::new();
    let inferred = types.fresh();

    assert_eq!(types.describe(&Type::array(Type::Int, 3)), "int[3]");
    assert_eq!(
        types.describe(&Type::invoke(vec![Type::Int, Type::Int], Type::Bot, false, true)),
        "function(int, int) -> void"
    );
    assert_eq!(
        types.describe(&Type::sum(vec![Type::Int, Type::Bool])),
        "int | boolean"
    );
    assert_eq!(types.describe(&inferred), "var");
    assert_eq!(types.describe(&Type::Bot), "undefined");
}

// CHECKER

#[test]
fn test_int_declaration() {
    let analysis = assert_clean("int a <- 2;");
    assert_eq!(symbol_type(&analysis, "a"), "int");
    assert_eq!(analysis.stored_types.len(), 1);
}

#[test]
fn test_boolean_expression() {
    assert_clean("boolean a <- (false | true) & ~false;");
}

#[test]
fn test_undefined_variable_in_assignment() {
    let analysis = check("x <- y + 1;");

    assert_eq!(
        messages(&analysis),
        vec![
            "SEMANTIC: [1,6]: undefined variable 'y'",
            "SEMANTIC: [1,1]: cannot assign an undefined value to 'x'",
        ]
    );
}

#[test]
fn test_reassignment_overwrites_type() {
    let analysis = assert_clean("int a <- 1;\na <- true;");
    assert_eq!(symbol_type(&analysis, "a"), "boolean");
}

#[test]
fn test_assignment_creates_variable() {
    let analysis = assert_clean("count <- 3; print(count + 1);");
    assert_eq!(symbol_type(&analysis, "count"), "int");
}

#[test]
fn test_inference_through_use() {
    let analysis = assert_clean("var a; int b <- a + 1;");
    assert_eq!(symbol_type(&analysis, "a"), "int");
}

#[test]
fn test_inference_from_initializer_and_peers() {
    let analysis = assert_clean("var a; var b <- a; b <- true; boolean c <- a;");
    assert_eq!(symbol_type(&analysis, "a"), "boolean");
}

#[test]
fn test_conflicting_inference() {
    let analysis = check("var a <- 1; boolean b <- a;");
    assert_eq!(analysis.diagnostics.len(), 1);
    assert!(messages(&analysis)[0].contains("cannot initialise 'b'"));
}

#[test]
fn test_operand_errors_are_reported_per_side() {
    assert_eq!(check("int a <- true + 1;").diagnostics.len(), 1);
    assert_eq!(check("int a <- true + false;").diagnostics.len(), 2);
    assert_eq!(check("boolean a <- 1 & true;").diagnostics.len(), 1);
    assert_eq!(check("int a <- -true;").diagnostics.len(), 1);
    assert_eq!(check("boolean a <- ~1;").diagnostics.len(), 1);
}

#[test]
fn test_undefined_operands_are_not_reported_twice() {
    let analysis = check("print(-y);");
    assert_eq!(
        messages(&analysis),
        vec!["SEMANTIC: [1,8]: undefined variable 'y'"]
    );
}

#[test]
fn test_relational_yields_boolean() {
    assert_clean("boolean a <- 1 < 2; boolean b <- 3 >= 4;");
    assert_eq!(check("int a <- 1 < 2;").diagnostics.len(), 1);
}

#[test]
fn test_equality() {
    assert_clean("boolean a <- 1 = 2; boolean b <- true != false; boolean c <- \"x\" = \"y\";");

    let analysis = check("boolean a <- 1 = true;");
    assert_eq!(analysis.diagnostics.len(), 1);
    assert!(messages(&analysis)[0].contains("cannot compare int with boolean"));

    let analysis = check("int[2] a <- [1, 2]; boolean b <- a = a;");
    assert_eq!(analysis.diagnostics.len(), 1);
}

#[test]
fn test_redeclaration_and_shadowing() {
    let analysis = check("int a <- 1; boolean a <- true;");
    assert_eq!(analysis.diagnostics.len(), 1);
    assert!(messages(&analysis)[0].contains("already declared"));

    assert_clean("int a <- 1; { boolean a <- true; print(a); } print(a + 1);");
}

#[test]
fn test_initializer_mismatch_and_void() {
    assert_eq!(check("int a <- \"text\";").diagnostics.len(), 1);
    assert_eq!(check("void v;").diagnostics.len(), 1);
}

#[test]
fn test_conditions_must_be_boolean() {
    let analysis = check("if 1 { } while \"s\" { } select { case 2 { } }");
    assert_eq!(analysis.diagnostics.len(), 3);

    assert_clean("int i <- 0; while i < 3 { i <- i + 1; } if i = 3 { print(i); } else { }");
}

#[test]
fn test_branch_bodies_get_their_own_scope() {
    let analysis = check("if true { int inner <- 1; } print(inner);");
    assert_eq!(
        messages(&analysis),
        vec!["SEMANTIC: [1,35]: undefined variable 'inner'"]
    );
}

#[test]
fn test_arrays() {
    let analysis = assert_clean("int[3] a <- [1, 2, 3]; int b <- a[0]; var c <- [true, false];");
    assert_eq!(symbol_type(&analysis, "c"), "boolean[2]");

    assert_eq!(check("int[2] a <- [1, 2, 3];").diagnostics.len(), 1);
    assert_eq!(check("var a <- [1, true];").diagnostics.len(), 1);
    assert_eq!(check("int a <- 1; int b <- a[0];").diagnostics.len(), 1);
    assert_eq!(check("int[2] a <- [1, 2]; int b <- a[true];").diagnostics.len(), 1);
}

#[test]
fn test_sum_declaration() {
    assert_clean("int | boolean s <- 1; int | boolean t <- true;");
    assert_eq!(check("int | boolean s <- \"no\";").diagnostics.len(), 1);
    assert_eq!(check("int | boolean s <- 1; print(s);").diagnostics.len(), 1);
}

#[test]
fn test_functions_and_calls() {
    let analysis = assert_clean(
        "function int add(int a, int b) { return a + b; }\n\
         function void show(string s) { print(s); return; }\n\
         int c <- add(1, 2);\n\
         show(\"hi\");",
    );
    assert_eq!(symbol_type(&analysis, "add"), "function(int, int) -> int");

    assert_eq!(check("function int f(int a) { return a; } int b <- f();").diagnostics.len(), 1);
    assert_eq!(
        check("function int f(int a) { return a; } int b <- f(true);").diagnostics.len(),
        1
    );
    assert_eq!(check("int a <- 1; int b <- a(2);").diagnostics.len(), 1);
    assert_eq!(check("int b <- missing(2);").diagnostics.len(), 1);
}

#[test]
fn test_recursion() {
    assert_clean(
        "function int fact(int n) { if n < 2 { return 1; } return n * fact(n - 1); } print(fact(5));",
    );
}

#[test]
fn test_return_rules() {
    assert_eq!(check("return 1;").diagnostics.len(), 1);
    assert_eq!(check("function int f() { return true; }").diagnostics.len(), 1);
    assert_eq!(check("function int f() { return; }").diagnostics.len(), 1);
    assert_eq!(check("function void f() { return 1; }").diagnostics.len(), 1);
}

#[test]
fn test_forward_declarations() {
    assert_clean(
        "function int twice(int x);\n\
         function int quad(int x) { return twice(twice(x)); }\n\
         function int twice(int x) { return x + x; }",
    );

    let analysis = check("function int f(int x);");
    assert_eq!(analysis.diagnostics.len(), 1);
    assert!(messages(&analysis)[0].contains("declared but never defined"));

    let analysis = check("function int f(int x); function int f(boolean x) { return 1; }");
    assert!(messages(&analysis)
        .iter()
        .any(|message| message.contains("does not match its declaration")));

    let analysis = check("function int f() { return 1; } function int f() { return 2; }");
    assert_eq!(analysis.diagnostics.len(), 1);
}

#[test]
fn test_function_placement_and_names() {
    assert_eq!(
        check("{ function int f() { return 1; } }").diagnostics.len(),
        1
    );
    assert_eq!(
        check("function int main() { return 0; }").diagnostics.len(),
        1
    );
    assert_eq!(check("function void f(var x) { }").diagnostics.len(), 1);
    assert_eq!(check("function void f() { } f <- 1;").diagnostics.len(), 1);
}

#[test]
fn test_outer_variables_are_not_visible_in_functions() {
    let analysis = check("int g <- 1; function int f() { return g; }");
    assert_eq!(analysis.diagnostics.len(), 1);
    assert!(messages(&analysis)[0].contains("not visible inside function 'f'"));

    // other functions are
    assert_clean("function int one() { return 1; } function int two() { return one() + one(); }");
}

#[test]
fn test_bindings_are_recorded() {
    let tokens = tokenize("int a <- 1; a <- a + 1;".to_string(), None).unwrap();
    let (_, program) = parse(tokens, Rc::new("shell".to_string()));
    let program = program.unwrap();
    let analysis = type_check(&program);
    assert!(analysis.diagnostics.is_empty());

    let declaration = analysis.bindings.lookup(program.body[0].id()).unwrap();

    let Stmt::Expression(stmt) = &program.body[1] else {
        panic!("expected an expression statement");
    };
    let Expr::Assignment(assignment) = &stmt.expression else {
        panic!("expected an assignment");
    };
    let Expr::Binary(binary) = assignment.value.as_ref() else {
        panic!("expected a binary expression");
    };

    assert_eq!(analysis.bindings.lookup(assignment.id), Some(declaration));
    assert_eq!(analysis.bindings.lookup(binary.left.id()), Some(declaration));
    assert_eq!(analysis.stored_types.get(&assignment.id), Some(&Type::Int));
}

#[test]
fn test_void_results() {
    assert_clean("function void f() { } f();");

    let analysis = check("function void f() { } int a <- f();");
    assert!(!analysis.diagnostics.is_empty());
    assert!(messages(&analysis)[0].contains("'f' returns void, its result cannot be used"));
}

#[test]
fn test_supertype_mirrors_subtype() {
    let mut types = TypeTable::new();

    let pairs = [
        (Type::Int, Type::Int),
        (Type::Int, Type::Bool),
        (Type::array(Type::Int, 3), Type::array(Type::Int, 3)),
        (Type::array(Type::Int, 3), Type::array(Type::Int, 2)),
        (Type::Bot, Type::Int),
        (Type::Int, Type::Bot),
    ];
    for (a, b) in pairs.iter() {
        let forward = types.is_supertype(a, b);
        assert_eq!(forward, types.is_subtype(b, a));
    }

    assert!(types.is_supertype(&Type::Int, &Type::Int));
    assert!(!types.is_supertype(&Type::Int, &Type::Bool));
    assert!(!types.is_supertype(&Type::Bot, &Type::Int));
    assert!(!types.is_supertype(&Type::array(Type::Int, 3), &Type::array(Type::Int, 2)));

    // the variable on the right asks its own supertype test, which binds it
    let v = types.fresh();
    assert!(types.is_supertype(&Type::Int, &v));
    assert_eq!(types.describe(&v), "int");
    assert!(!types.is_supertype(&Type::Bool, &v));
}

#[test]
fn test_index_must_be_int() {
    let analysis = check("int[2] a <- [1, 2]; print(a[true]);");

    assert_eq!(
        messages(&analysis),
        vec!["SEMANTIC: [1,29]: array index must be int, found boolean"]
    );
}

#[test]
fn test_empty_array_literal() {
    let tokens = tokenize("[1];".to_string(), None).unwrap();
    let (_, program) = parse(tokens, Rc::new("shell".to_string()));
    let mut program = program.unwrap();

    let Stmt::Expression(stmt) = &mut program.body[0] else {
        panic!("expected an expression statement");
    };
    let Expr::Array(array) = &mut stmt.expression else {
        panic!("expected an array literal");
    };
    array.elements.clear();

    // nothing to take the element type from
    let analysis = type_check(&program);
    assert_eq!(analysis.types.len(), 0);
}

#[test]
fn test_sum_into_sum_message() {
    let analysis = check("int | string v <- 1; int | string w <- v;");
    assert_eq!(analysis.diagnostics.len(), 1);
    assert!(messages(&analysis)[0].ends_with(
        "'w' of type int | string only accepts its own case types, not a value of sum type int | string"
    ));

    let analysis = check(
        "function void take(int | string x) { }\n\
         int | string v <- 1;\n\
         take(v);",
    );
    assert_eq!(analysis.diagnostics.len(), 1);
    assert!(messages(&analysis)[0].contains("argument 1 of 'take' of type int | string"));

    // other mismatches keep their usual wording
    let analysis = check("int | string v <- true;");
    assert!(messages(&analysis)[0].contains("cannot initialise 'v'"));
}

#[test]
fn test_exit_past_the_root() {
    let mut scopes = ScopeManager::new();
    let root = scopes.enter_scope();

    assert_eq!(scopes.exit_scope(), Some(root));
    assert_eq!(scopes.current(), None);
    assert_eq!(scopes.exit_scope(), None);
    assert_eq!(scopes.scopes().len(), 1);
}
