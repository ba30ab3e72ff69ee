// tests/evaluator_tests.rs

use std::collections::HashMap;

use basil_lang::{
    builtins, eval_program, set_import_handler, Environment, Lexer, Parser, Value,
};

fn run(input: &str) -> Value {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program();
    assert!(
        parser.errors().is_empty(),
        "parse errors: {:?}",
        parser.errors()
    );
    let env = Environment::new();
    eval_program(&program, &env)
}

fn assert_float(value: Value, expected: f64) {
    match value {
        Value::Float(n) => assert!((n - expected).abs() < 1e-9, "got {}", n),
        other => panic!("expected float, got {:?}", other),
    }
}

// ============================================================================
// Arithmetic and precedence
// ============================================================================

#[test]
fn test_arithmetic() {
    assert_eq!(run("1 + 2 * 3"), Value::Integer(7));
    assert_eq!(run("(1 + 2) * 3"), Value::Integer(9));
    assert_eq!(run("7 - 10"), Value::Integer(-3));
    assert_eq!(run("17 % 5"), Value::Integer(2));
}

#[test]
fn test_integer_division_truncates() {
    assert_eq!(run("10 / 3"), Value::Integer(3));
}

#[test]
fn test_float_promotion() {
    assert_float(run("10.0 / 3"), 10.0 / 3.0);
    assert_float(run("1 + 0.5"), 1.5);
    assert_float(run("2.0 * 3"), 6.0);
}

#[test]
fn test_float_comparisons() {
    assert_eq!(run("1 < 1.5"), Value::Boolean(true));
    assert_eq!(run("2.5 >= 2"), Value::Boolean(true));
    assert_eq!(run("1.0 == 1"), Value::Boolean(true));
}

#[test]
fn test_bitwise_operators() {
    assert_eq!(run("6 & 3"), Value::Integer(2));
    assert_eq!(run("6 | 3"), Value::Integer(7));
    assert_eq!(run("6 ^ 3"), Value::Integer(5));
    assert_eq!(run("1 << 3"), Value::Integer(8));
    assert_eq!(run("16 >> 2"), Value::Integer(4));
    assert_eq!(run("~0"), Value::Integer(-1));
}

#[test]
fn test_division_by_zero_is_an_error() {
    assert_eq!(run("1 / 0"), Value::Error("division by zero".to_string()));
    assert_eq!(run("1 % 0"), Value::Error("division by zero".to_string()));
}

#[test]
fn test_prefix_operators() {
    assert_eq!(run("-5"), Value::Integer(-5));
    assert_eq!(run("!true"), Value::Boolean(false));
    assert_eq!(run("not false"), Value::Boolean(true));
    assert_eq!(run("not not 5"), Value::Boolean(true));
}

#[test]
fn test_negating_a_non_integer_is_an_error() {
    assert_eq!(
        run("-true"),
        Value::Error("unknown operator: -BOOLEAN".to_string())
    );
}

// ============================================================================
// Truthiness
// ============================================================================

#[test]
fn test_zero_and_empty_values_are_truthy() {
    assert_eq!(run("0 ? \"t\" : \"f\""), Value::String("t".to_string()));
    assert_eq!(run("\"\" ? 1 : 2"), Value::Integer(1));
    assert_eq!(run("if 0 { 1 } else { 2 }"), Value::Integer(1));
    assert_eq!(run("if [] { 1 } else { 2 }"), Value::Integer(1));
}

#[test]
fn test_only_false_and_null_are_falsy() {
    assert_eq!(run("false ? 1 : 2"), Value::Integer(2));
    // a missing hash key reads as null
    assert_eq!(run("{\"a\": 1}.b ? 1 : 2"), Value::Integer(2));
}

// ============================================================================
// Strings and coercion
// ============================================================================

#[test]
fn test_string_concatenation() {
    assert_eq!(run("\"a\" + \"b\""), Value::String("ab".to_string()));
    assert_eq!(run("\"x\" + 1"), Value::String("x1".to_string()));
    assert_eq!(run("1 + \"x\""), Value::String("1x".to_string()));
    assert_eq!(run("true + \"!\""), Value::String("true!".to_string()));
    assert_eq!(run("\"\" + [1, 2]"), Value::String("[1, 2]".to_string()));
}

#[test]
fn test_mixed_type_equality_uses_rendered_forms() {
    assert_eq!(run("\"1\" == 1"), Value::Boolean(true));
    assert_eq!(run("\"1\" != 1"), Value::Boolean(false));
    assert_eq!(run("\"a\" == 1"), Value::Boolean(false));
}

#[test]
fn test_same_type_equality_stays_strict() {
    assert_eq!(run("\"a\" == \"a\""), Value::Boolean(true));
    assert_eq!(run("\"a\" == \"b\""), Value::Boolean(false));
    assert_eq!(run("1 == 2"), Value::Boolean(false));
}

#[test]
fn test_logical_operators_return_booleans() {
    assert_eq!(run("true and false"), Value::Boolean(false));
    assert_eq!(run("false or true"), Value::Boolean(true));
    assert_eq!(run("1 and 2"), Value::Boolean(true));
}

#[test]
fn test_type_mismatch_errors() {
    assert_eq!(
        run("true + 1"),
        Value::Error("type mismatch: BOOLEAN + INTEGER".to_string())
    );
    assert_eq!(
        run("true + false"),
        Value::Error("unknown operator: BOOLEAN + BOOLEAN".to_string())
    );
}

// ============================================================================
// Bindings and scoping
// ============================================================================

#[test]
fn test_let_and_lookup() {
    assert_eq!(run("let x = 5; x"), Value::Integer(5));
    assert_eq!(run("let x = 5; let y = x * 2; y + x"), Value::Integer(15));
}

#[test]
fn test_let_shadows_in_inner_scope() {
    let program = "
        let x = 1
        let f = function() { let x = 2; x }
        f() + x
    ";
    assert_eq!(run(program), Value::Integer(3));
}

#[test]
fn test_assign_updates_nearest_binding() {
    let program = "
        let x = 1
        let f = function() { x = x + 10 }
        f()
        x
    ";
    assert_eq!(run(program), Value::Integer(11));
}

#[test]
fn test_assign_without_binding_creates_locally() {
    // the binding appears in the function's scope, not the root
    assert_eq!(
        run("let f = function() { fresh = 9; fresh }; f()"),
        Value::Integer(9)
    );
    assert_eq!(
        run("let f = function() { fresh = 9 }; f(); fresh"),
        Value::Error("identifier not found: fresh".to_string())
    );
}

#[test]
fn test_global_binds_in_root_from_anywhere() {
    let program = "
        let f = function() { global marker = 2 }
        f()
        marker
    ";
    assert_eq!(run(program), Value::Integer(2));
}

#[test]
fn test_global_and_local_bumps() {
    let program = "
        global x = 1
        let bump = function() { x = x + 1 }
        bump()
        bump()
        x
    ";
    assert_eq!(run(program), Value::Integer(3));
}

#[test]
fn test_identifier_not_found() {
    assert_eq!(
        run("nope"),
        Value::Error("identifier not found: nope".to_string())
    );
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_if_else() {
    assert_eq!(run("if 1 > 2 { \"a\" } else { \"b\" }"), Value::String("b".to_string()));
    assert_eq!(run("if 1 < 2 { \"a\" }"), Value::String("a".to_string()));
    assert_eq!(run("if 1 > 2 { \"a\" }"), Value::Null);
}

#[test]
fn test_else_if_chain() {
    let program = "
        let grade = function(n) {
            if n > 89 { \"A\" } else if n > 79 { \"B\" } else { \"C\" }
        }
        grade(85)
    ";
    assert_eq!(run(program), Value::String("B".to_string()));
}

#[test]
fn test_ternary() {
    assert_eq!(run("1 > 2 ? \"yes\" : \"no\""), Value::String("no".to_string()));
    assert_eq!(run("true ? 1 : 2"), Value::Integer(1));
}

#[test]
fn test_while_loop() {
    assert_eq!(run("let i = 0; while i < 3 { i = i + 1; i }"), Value::Integer(3));
    assert_eq!(run("while false { 1 }"), Value::Null);
}

#[test]
fn test_for_loop() {
    let program = "
        let total = 0
        for (let i = 0; i < 5; i = i + 1) { total = total + i }
        total
    ";
    assert_eq!(run(program), Value::Integer(10));
}

#[test]
fn test_for_initializer_is_loop_scoped() {
    let program = "
        for (let i = 0; i < 3; i = i + 1) { i }
        i
    ";
    assert_eq!(
        run(program),
        Value::Error("identifier not found: i".to_string())
    );
}

#[test]
fn test_foreach_over_array() {
    let program = "
        let sum = 0
        foreach v in [1, 2, 3] { sum = sum + v }
        sum
    ";
    assert_eq!(run(program), Value::Integer(6));
}

#[test]
fn test_foreach_with_index() {
    let program = "
        let sum = 0
        foreach i, v in [10, 20, 30] { sum = sum + i * v }
        sum
    ";
    assert_eq!(run(program), Value::Integer(80));
}

#[test]
fn test_foreach_over_hash() {
    let program = "
        let out = \"\"
        foreach k, v in {\"a\": 1} { out = k + \"=\" + v }
        out
    ";
    assert_eq!(run(program), Value::String("a=1".to_string()));
}

#[test]
fn test_foreach_over_non_iterable_errors() {
    assert_eq!(
        run("foreach v in 5 { v }"),
        Value::Error("not iterable: INTEGER".to_string())
    );
}

#[test]
fn test_foreach_closures_capture_per_iteration_bindings() {
    let program = "
        let fs = []
        foreach i in [1, 2, 3] { fs = fs + [function() { return i }] }
        [fs[0](), fs[1](), fs[2]()]
    ";
    assert_eq!(
        run(program),
        Value::Array(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
        ])
    );
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_implicit_and_explicit_return() {
    assert_eq!(run("let f = function() { 5 }; f()"), Value::Integer(5));
    assert_eq!(run("let f = function() { return 10; 20 }; f()"), Value::Integer(10));
}

#[test]
fn test_return_unwinds_nested_blocks() {
    let program = "
        let find = function(limit) {
            let i = 0
            while true {
                if i >= limit { return i }
                i = i + 1
            }
        }
        find(3)
    ";
    assert_eq!(run(program), Value::Integer(3));
}

#[test]
fn test_top_level_return_unwraps() {
    assert_eq!(run("return 7"), Value::Integer(7));
}

#[test]
fn test_recursion() {
    let program = "
        let fact = function(n) { n < 2 ? 1 : n * fact(n - 1) }
        fact(5)
    ";
    assert_eq!(run(program), Value::Integer(120));
}

#[test]
fn test_arity_mismatch_is_an_error() {
    assert_eq!(
        run("let f = function(a, b) { a }; f(1)"),
        Value::Error("wrong number of arguments. got=1, want=2".to_string())
    );
}

#[test]
fn test_calling_a_non_function_is_an_error() {
    assert_eq!(
        run("let x = 1; x()"),
        Value::Error("not a function: INTEGER".to_string())
    );
}

#[test]
fn test_arguments_evaluate_left_to_right_and_stop_on_error() {
    assert_eq!(
        run("let f = function(a, b) { a }; f(1, nope)"),
        Value::Error("identifier not found: nope".to_string())
    );
}

// ============================================================================
// Indexing and property access
// ============================================================================

#[test]
fn test_array_indexing() {
    assert_eq!(run("[1, 2, 3][1]"), Value::Integer(2));
    assert_eq!(run("[1, 2, 3][0]"), Value::Integer(1));
    assert_eq!(run("[1][99]"), Value::Null);
    assert_eq!(run("[1][-1]"), Value::Null);
}

#[test]
fn test_hash_indexing() {
    assert_eq!(run("{\"a\": 1}[\"a\"]"), Value::Integer(1));
    assert_eq!(run("{\"a\": 1}[\"b\"]"), Value::Null);
    assert_eq!(
        run("{\"a\": 1}[0]"),
        Value::Error("unusable as hash key: INTEGER".to_string())
    );
}

#[test]
fn test_indexing_other_types_is_an_error() {
    assert_eq!(
        run("let x = 1; x[0]"),
        Value::Error("index operator not supported: INTEGER".to_string())
    );
}

#[test]
fn test_property_access_on_hashes() {
    assert_eq!(run("{\"a\": 1}.a"), Value::Integer(1));
    assert_eq!(run("{\"a\": 1}.b"), Value::Null);
    assert_eq!(
        run("let nested = {\"user\": {\"name\": \"ada\"}}; nested.user.name"),
        Value::String("ada".to_string())
    );
}

#[test]
fn test_property_access_on_other_types_is_an_error() {
    assert_eq!(
        run("let x = 1; x.a"),
        Value::Error("property access not supported on INTEGER".to_string())
    );
}

#[test]
fn test_hash_keys_must_be_strings() {
    assert_eq!(
        run("{1: 2}"),
        Value::Error("unusable as hash key: INTEGER".to_string())
    );
}

// ============================================================================
// try / catch / throw
// ============================================================================

#[test]
fn test_try_catch_captures_throw() {
    assert_eq!(
        run("try { throw \"boom\" } catch e { e.message }"),
        Value::String("boom".to_string())
    );
}

#[test]
fn test_throw_converts_any_value() {
    assert_eq!(
        run("try { throw 42 } catch e { e.message }"),
        Value::String("42".to_string())
    );
    assert_eq!(
        run("try { throw [1, 2] } catch e { e[\"message\"] }"),
        Value::String("[1, 2]".to_string())
    );
}

#[test]
fn test_try_without_error_returns_try_value() {
    assert_eq!(run("try { 5 } catch e { 0 }"), Value::Integer(5));
}

#[test]
fn test_errors_inside_catch_propagate() {
    assert_eq!(
        run("try { throw \"a\" } catch e { throw \"b\" }"),
        Value::Error("b".to_string())
    );
}

#[test]
fn test_catch_var_is_scoped_to_the_handler() {
    assert_eq!(
        run("try { throw \"a\" } catch e { 1 }; e"),
        Value::Error("identifier not found: e".to_string())
    );
}

#[test]
fn test_errors_from_functions_are_catchable() {
    let program = "
        let f = function() { throw \"deep\" }
        try { f() + 1 } catch e { e.message }
    ";
    assert_eq!(run(program), Value::String("deep".to_string()));
}

#[test]
fn test_uncaught_error_becomes_program_result() {
    assert_eq!(run("throw \"fatal\""), Value::Error("fatal".to_string()));
}

#[test]
fn test_errors_short_circuit_enclosing_expressions() {
    let expected = Value::Error("identifier not found: nope".to_string());
    assert_eq!(run("(1 + nope) * 2"), expected);
    assert_eq!(run("[1, nope]"), expected);
    assert_eq!(run("{\"k\": nope}"), expected);
    assert_eq!(run("nope[0]"), expected);
}

// ============================================================================
// Builtins
// ============================================================================

#[test]
fn test_core_builtins() {
    assert_eq!(run("len(\"abc\")"), Value::Integer(3));
    assert_eq!(
        run("len(5)"),
        Value::Error("argument to `len` not supported, got INTEGER".to_string())
    );
    assert_eq!(run("type(1)"), Value::String("INTEGER".to_string()));
    assert_eq!(run("type(1.5)"), Value::String("FLOAT".to_string()));
    assert_eq!(run("type(\"s\")"), Value::String("STRING".to_string()));
    assert_eq!(run("print(\"from test\")"), Value::Null);
}

#[test]
fn test_let_binding_shadows_builtin() {
    assert_eq!(run("let len = 3; len"), Value::Integer(3));
}

#[test]
fn test_builtins_can_invoke_user_callbacks() {
    basil_lang::builtins::register("jobs.each", |env, args| {
        if args.len() != 2 {
            return Value::Error("jobs.each needs (ARRAY, FUNCTION)".to_string());
        }
        match (&args[0], &args[1]) {
            (Value::Array(items), callback @ Value::Function(_)) => {
                let mut out = Vec::new();
                for item in items {
                    let result = basil_lang::apply_function(env, callback, vec![item.clone()]);
                    if result.is_error() {
                        return result;
                    }
                    out.push(result);
                }
                Value::Array(out)
            }
            _ => Value::Error("jobs.each needs (ARRAY, FUNCTION)".to_string()),
        }
    });

    assert_eq!(
        run("jobs.each([1, 2, 3], function(x) { x * 2 })"),
        Value::Array(vec![
            Value::Integer(2),
            Value::Integer(4),
            Value::Integer(6),
        ])
    );
}

#[test]
fn test_property_access_routes_to_builtins() {
    builtins::register("http.get", |_env, args| {
        if args.is_empty() {
            Value::String("no-arg".to_string())
        } else {
            Value::String(format!("GET {}", args[0].inspect()))
        }
    });

    // the bare qualified name evaluates to the builtin itself
    assert!(matches!(run("http.get"), Value::Builtin(_)));
    assert_eq!(
        run("http.get(\"x\")"),
        Value::String("GET x".to_string())
    );
}

// ============================================================================
// Imports
// ============================================================================

#[test]
fn test_import_binds_module_under_alias() {
    set_import_handler(|path| {
        if path == "config" {
            let mut pairs = HashMap::new();
            pairs.insert("port".to_string(), Value::Integer(8080));
            Ok(Value::Hash(pairs))
        } else {
            Err(format!("no such module: {}", path))
        }
    });

    assert_eq!(
        run("import \"config\" as cfg; cfg.port"),
        Value::Integer(8080)
    );
    assert_eq!(
        run("import \"missing\" as m"),
        Value::Error("import error: no such module: missing".to_string())
    );
    assert_eq!(
        run("try { import \"missing\" as m } catch e { e.message }"),
        Value::String("import error: no such module: missing".to_string())
    );
}

// ============================================================================
// spawn / wait_all / chan
// ============================================================================

#[test]
fn test_spawn_errors_surface_synchronously() {
    assert_eq!(
        run("spawn missing()"),
        Value::Error("identifier not found: missing".to_string())
    );
    assert_eq!(
        run("let f = function(x) { x }; spawn f(missing)"),
        Value::Error("identifier not found: missing".to_string())
    );
}

#[test]
fn test_spawn_discards_results_and_errors() {
    let program = "
        let boom = function() { throw \"swallowed\" }
        spawn boom()
        wait_all()
        \"done\"
    ";
    assert_eq!(run(program), Value::String("done".to_string()));
}

#[test]
fn test_wait_all_without_tasks_returns_immediately() {
    assert_eq!(run("wait_all()"), Value::Null);
}

#[test]
fn test_hundred_spawned_tasks_fill_a_channel() {
    let program = "
        let c = chan()
        let send = c.send
        let i = 0
        while i < 100 {
            spawn send(i)
            i = i + 1
        }
        wait_all()
        c.read_all()
    ";

    match run(program) {
        Value::Array(items) => {
            assert_eq!(items.len(), 100);
            let mut seen: Vec<i64> = items
                .iter()
                .map(|item| match item {
                    Value::Integer(n) => *n,
                    other => panic!("expected integer, got {:?}", other),
                })
                .collect();
            seen.sort_unstable();
            let expected: Vec<i64> = (0..100).collect();
            assert_eq!(seen, expected);
        }
        other => panic!("expected array, got {:?}", other),
    }
}

#[test]
fn test_spawned_tasks_share_the_root_environment() {
    let program = "
        global counter = 0
        let bump = function() { counter = counter + 1 }
        spawn bump()
        wait_all()
        counter
    ";
    assert_eq!(run(program), Value::Integer(1));
}

// ============================================================================
// Inspect forms
// ============================================================================

#[test]
fn test_inspect_forms() {
    assert_eq!(run("[1, \"a\", true]").inspect(), "[1, a, true]");
    assert_eq!(run("{\"k\": 1}").inspect(), "{\"k\": 1}");
    assert_eq!(run("throw \"x\"").inspect(), "ERROR: x");
    assert_eq!(run("print").inspect(), "builtin function");

    let func = run("function(a, b) { return a }");
    assert!(func.inspect().starts_with("function(a, b) {"));
}

#[test]
fn test_program_with_trailing_binding_yields_null() {
    assert_eq!(run("let x = 1"), Value::Null);
}
