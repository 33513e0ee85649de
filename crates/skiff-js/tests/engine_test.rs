//! Engine integration tests
//!
//! Exercises the public `Engine` facade over scripts and modules.

use skiff_js::{Engine, Error, Value};

#[test]
fn test_arithmetic() {
    let engine = Engine::new();

    assert_eq!(engine.eval("5 + 3;").unwrap().to_string(), "8");
    assert_eq!(engine.eval("10 - 4;").unwrap().to_string(), "6");
    assert_eq!(engine.eval("6 * 7;").unwrap().to_string(), "42");
    assert_eq!(engine.eval("15 / 3;").unwrap().to_string(), "5");
    assert_eq!(engine.eval("17 % 5;").unwrap().to_string(), "2");
}

#[test]
fn test_comparison() {
    let engine = Engine::new();

    assert_eq!(engine.eval("5 == 5;").unwrap().to_string(), "true");
    assert_eq!(engine.eval("5 != 3;").unwrap().to_string(), "true");
    assert_eq!(engine.eval("5 === 5;").unwrap().to_string(), "true");
    assert_eq!(engine.eval("5 < 10;").unwrap().to_string(), "true");
    assert_eq!(engine.eval("5 >= 5;").unwrap().to_string(), "true");
}

#[test]
fn test_logical() {
    let engine = Engine::new();

    assert_eq!(engine.eval("true && false;").unwrap().to_string(), "false");
    assert_eq!(engine.eval("false || true;").unwrap().to_string(), "true");
    assert_eq!(engine.eval("!true;").unwrap().to_string(), "false");
}

#[test]
fn test_variables() {
    let engine = Engine::new();

    assert_eq!(engine.eval("var x = 42; x;").unwrap().to_string(), "42");
    assert_eq!(
        engine.eval("let s = 'hello'; s + ' world';").unwrap().to_string(),
        "hello world"
    );
}

#[test]
fn test_functions() {
    let engine = Engine::new();

    assert_eq!(
        engine
            .eval("function square(n) { return n * n; } square(6) + 6;")
            .unwrap(),
        Value::Number(42.0)
    );
}

#[test]
fn test_globals_persist_per_engine() {
    // Each eval call runs in a fresh scope over shared globals
    let engine = Engine::new();
    assert_eq!(engine.eval("Math.floor(1.9);").unwrap(), Value::Number(1.0));
    assert_eq!(
        engine.eval("typeof console.log;").unwrap(),
        Value::String("function".into())
    );
}

#[test]
fn test_syntax_error() {
    let engine = Engine::new();
    match engine.eval("let = ;") {
        Err(Error::SyntaxError(_)) => {}
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_module_compile_and_evaluate() {
    let engine = Engine::new();
    let module = engine
        .compile_module("export const testValue = 42;")
        .unwrap();
    assert!(module.requests().is_empty());

    let exports = engine
        .evaluate_module(&module, &Default::default())
        .unwrap();
    assert_eq!(exports.get("testValue"), Some(&Value::Number(42.0)));
}

#[test]
fn test_module_rejects_script_only_syntax() {
    let engine = Engine::new();
    // import is not an expression
    assert!(engine.eval("import 'x';").is_err());
}

#[test]
fn test_top_level_throw_in_module() {
    let engine = Engine::new();
    let module = engine
        .compile_module("throw new Error('boom');")
        .unwrap();
    match engine.evaluate_module(&module, &Default::default()) {
        Err(Error::Thrown(value)) => assert_eq!(value.to_string(), "Error: boom"),
        other => panic!("expected thrown error, got {other:?}"),
    }
}
