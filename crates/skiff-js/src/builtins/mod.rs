//! Built-in globals available to every script and module.
//!
//! The surface is deliberately small: error constructors, `Math`,
//! `console`, and the global constants.

use crate::Error;
use crate::runtime::environment::Environment;
use crate::runtime::function::{Callable, NativeFn};
use crate::runtime::object::JsObject;
use crate::runtime::value::Value;
use std::sync::Arc;

/// Installs the built-in globals into the given environment.
pub fn install(global: &Arc<Environment>) {
    global.define("undefined", Value::Undefined, false);
    global.define("NaN", Value::Number(f64::NAN), false);
    global.define("Infinity", Value::Number(f64::INFINITY), false);

    global.define("Error", native("Error", error_constructor), false);
    global.define("TypeError", native("TypeError", type_error_constructor), false);
    global.define(
        "RangeError",
        native("RangeError", range_error_constructor),
        false,
    );

    global.define("Boolean", native("Boolean", boolean_fn), false);
    global.define("Number", native("Number", number_fn), false);
    global.define("String", native("String", string_fn), false);

    global.define("Math", math_object(), false);
    global.define("console", console_object(), false);
}

fn native(name: &'static str, func: NativeFn) -> Value {
    Value::Function(Arc::new(Callable::Native { name, func }))
}

fn make_error(name: &str, args: &[Value]) -> Result<Value, Error> {
    let object = JsObject::with_class("Error");
    object.set("name", Value::String(name.to_string()));
    let message = args
        .first()
        .filter(|v| !v.is_undefined())
        .map(|v| v.to_js_string())
        .unwrap_or_default();
    object.set("message", Value::String(message));
    Ok(Value::Object(Arc::new(object)))
}

fn error_constructor(args: &[Value]) -> Result<Value, Error> {
    make_error("Error", args)
}

fn type_error_constructor(args: &[Value]) -> Result<Value, Error> {
    make_error("TypeError", args)
}

fn range_error_constructor(args: &[Value]) -> Result<Value, Error> {
    make_error("RangeError", args)
}

fn boolean_fn(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Boolean(
        args.first().map(Value::to_boolean).unwrap_or(false),
    ))
}

fn number_fn(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Number(
        args.first().map(Value::to_number).unwrap_or(0.0),
    ))
}

fn string_fn(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::String(
        args.first().map(Value::to_js_string).unwrap_or_default(),
    ))
}

fn math_object() -> Value {
    let math = JsObject::new();
    math.set("PI", Value::Number(std::f64::consts::PI));
    math.set("E", Value::Number(std::f64::consts::E));
    math.set("floor", native("floor", |args| Ok(Value::Number(arg_number(args).floor()))));
    math.set("ceil", native("ceil", |args| Ok(Value::Number(arg_number(args).ceil()))));
    math.set("round", native("round", |args| Ok(Value::Number(arg_number(args).round()))));
    math.set("trunc", native("trunc", |args| Ok(Value::Number(arg_number(args).trunc()))));
    math.set("abs", native("abs", |args| Ok(Value::Number(arg_number(args).abs()))));
    math.set("sqrt", native("sqrt", |args| Ok(Value::Number(arg_number(args).sqrt()))));
    math.set(
        "pow",
        native("pow", |args| {
            let base = args.first().map(Value::to_number).unwrap_or(f64::NAN);
            let exp = args.get(1).map(Value::to_number).unwrap_or(f64::NAN);
            Ok(Value::Number(base.powf(exp)))
        }),
    );
    math.set(
        "max",
        native("max", |args| {
            let mut best = f64::NEG_INFINITY;
            for arg in args {
                let n = arg.to_number();
                if n.is_nan() {
                    return Ok(Value::Number(f64::NAN));
                }
                best = best.max(n);
            }
            Ok(Value::Number(best))
        }),
    );
    math.set(
        "min",
        native("min", |args| {
            let mut best = f64::INFINITY;
            for arg in args {
                let n = arg.to_number();
                if n.is_nan() {
                    return Ok(Value::Number(f64::NAN));
                }
                best = best.min(n);
            }
            Ok(Value::Number(best))
        }),
    );
    Value::Object(Arc::new(math))
}

fn console_object() -> Value {
    let console = JsObject::new();
    console.set("log", native("log", console_log));
    console.set("info", native("info", console_log));
    console.set("warn", native("warn", console_error));
    console.set("error", native("error", console_error));
    Value::Object(Arc::new(console))
}

fn format_args(args: &[Value]) -> String {
    args.iter()
        .map(Value::to_js_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn console_log(args: &[Value]) -> Result<Value, Error> {
    println!("{}", format_args(args));
    Ok(Value::Undefined)
}

fn console_error(args: &[Value]) -> Result<Value, Error> {
    eprintln!("{}", format_args(args));
    Ok(Value::Undefined)
}

fn arg_number(args: &[Value]) -> f64 {
    args.first().map(Value::to_number).unwrap_or(f64::NAN)
}
