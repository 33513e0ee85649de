// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! ECMAScript module records and evaluation.
//!
//! A [`Module`] is a parsed-but-not-evaluated module: source compiled in the
//! module goal plus the list of dependency requests. The embedder (the
//! loader) resolves the requests, then calls [`Engine::evaluate_module`]
//! with the dependencies' export maps; evaluation binds the imports, runs
//! the module body exactly once, and collects the exported bindings.

use crate::ast::{ExportDeclaration, ImportDeclaration, ImportSpecifier, Program, Statement};
use crate::runtime::environment::Environment;
use crate::runtime::object::JsObject;
use crate::runtime::value::Value;
use crate::vm::{Completion, Interpreter};
use crate::{Engine, Error};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// The exported bindings of an evaluated module, keyed by export name.
pub type ExportMap = FxHashMap<String, Value>;

/// A compiled (parsed, not yet evaluated) module.
#[derive(Debug, Clone)]
pub struct Module {
    pub(crate) program: Program,
    requests: Vec<String>,
}

impl Module {
    pub(crate) fn new(program: Program) -> Self {
        let mut requests: Vec<String> = Vec::new();
        for stmt in &program.body {
            let specifier = match stmt {
                Statement::Import(import) => Some(&import.specifier),
                Statement::Export(ExportDeclaration::Named {
                    from_module: Some(from),
                    ..
                }) => Some(from),
                Statement::Export(ExportDeclaration::All { from_module, .. }) => Some(from_module),
                _ => None,
            };
            if let Some(specifier) = specifier {
                if !requests.iter().any(|r| r == specifier) {
                    requests.push(specifier.clone());
                }
            }
        }
        Self { program, requests }
    }

    /// The distinct module specifiers this module depends on, in source order.
    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

/// Evaluates a compiled module against its resolved dependencies.
pub(crate) fn evaluate(
    engine: &Engine,
    module: &Module,
    resolved: &FxHashMap<String, ExportMap>,
) -> Result<ExportMap, Error> {
    let env = Environment::with_outer(Arc::clone(engine.globals()));
    let interpreter = Interpreter::new();

    // Bind imported names before anything runs
    for stmt in &module.program.body {
        if let Statement::Import(import) = stmt {
            bind_imports(import, resolved, &env)?;
        }
    }

    // Function declarations (including exported ones) hoist
    interpreter.hoist(&module.program.body, &env)?;

    let mut exports = ExportMap::default();
    // Local names to read once the body has finished
    let mut deferred: Vec<(String, String)> = Vec::new();

    for stmt in &module.program.body {
        match stmt {
            Statement::Import(_) => {}
            Statement::Export(export) => match export {
                ExportDeclaration::Declaration(inner) => {
                    exec_top_level(&interpreter, inner, &env)?;
                    for name in declared_names(inner) {
                        deferred.push((name.clone(), name));
                    }
                }
                ExportDeclaration::Default(expr) => {
                    let value = interpreter.eval_expression(expr, &env)?;
                    exports.insert("default".to_string(), value);
                }
                ExportDeclaration::Named {
                    specifiers,
                    from_module,
                } => match from_module {
                    Some(from) => {
                        let dep = dependency(resolved, from)?;
                        for spec in specifiers {
                            let value = dep
                                .get(&spec.local)
                                .cloned()
                                .ok_or_else(|| missing_export(from, &spec.local))?;
                            let exported =
                                spec.exported.clone().unwrap_or_else(|| spec.local.clone());
                            exports.insert(exported, value);
                        }
                    }
                    None => {
                        for spec in specifiers {
                            let exported =
                                spec.exported.clone().unwrap_or_else(|| spec.local.clone());
                            deferred.push((spec.local.clone(), exported));
                        }
                    }
                },
                ExportDeclaration::All { name, from_module } => {
                    let dep = dependency(resolved, from_module)?;
                    match name {
                        Some(ns) => {
                            exports.insert(ns.clone(), namespace_object(dep));
                        }
                        None => {
                            // `export *` re-exports everything except default
                            for (key, value) in dep {
                                if key != "default" {
                                    exports.insert(key.clone(), value.clone());
                                }
                            }
                        }
                    }
                }
            },
            other => exec_top_level(&interpreter, other, &env)?,
        }
    }

    for (local, exported) in deferred {
        let value = env
            .get(&local)
            .ok_or_else(|| Error::SyntaxError(format!("Export '{local}' is not defined")))?;
        exports.insert(exported, value);
    }

    Ok(exports)
}

fn exec_top_level(
    interpreter: &Interpreter,
    stmt: &Statement,
    env: &Arc<Environment>,
) -> Result<(), Error> {
    match interpreter.exec_statement(stmt, env)? {
        Completion::Normal(_) => Ok(()),
        Completion::Return(_) => Err(Error::SyntaxError(
            "Return statements are only valid inside functions".into(),
        )),
        Completion::Break | Completion::Continue => Err(Error::SyntaxError(
            "Illegal break or continue outside of a loop".into(),
        )),
    }
}

fn bind_imports(
    import: &ImportDeclaration,
    resolved: &FxHashMap<String, ExportMap>,
    env: &Arc<Environment>,
) -> Result<(), Error> {
    if import.side_effect_only {
        return Ok(());
    }
    let exports = dependency(resolved, &import.specifier)?;
    for spec in &import.imports {
        match spec {
            ImportSpecifier::Default(local) => {
                let value = exports
                    .get("default")
                    .cloned()
                    .ok_or_else(|| missing_export(&import.specifier, "default"))?;
                env.define(local, value, false);
            }
            ImportSpecifier::Named(imported, local) => {
                let value = exports
                    .get(imported)
                    .cloned()
                    .ok_or_else(|| missing_export(&import.specifier, imported))?;
                env.define(local.as_deref().unwrap_or(imported), value, false);
            }
            ImportSpecifier::Namespace(local) => {
                env.define(local, namespace_object(exports), false);
            }
        }
    }
    Ok(())
}

fn dependency<'a>(
    resolved: &'a FxHashMap<String, ExportMap>,
    specifier: &str,
) -> Result<&'a ExportMap, Error> {
    resolved.get(specifier).ok_or_else(|| {
        Error::ReferenceError(format!("Unresolved module request '{specifier}'"))
    })
}

fn missing_export(specifier: &str, name: &str) -> Error {
    Error::SyntaxError(format!(
        "The requested module '{specifier}' does not provide an export named '{name}'"
    ))
}

/// Builds a module namespace object from an export map.
fn namespace_object(exports: &ExportMap) -> Value {
    let object = JsObject::with_class("Module");
    for (key, value) in exports {
        object.set(key.clone(), value.clone());
    }
    Value::Object(Arc::new(object))
}

fn declared_names(stmt: &Statement) -> Vec<String> {
    match stmt {
        Statement::VariableDeclaration(decl) => decl
            .declarations
            .iter()
            .map(|d| d.id.name.clone())
            .collect(),
        Statement::FunctionDeclaration(decl) => vec![decl.id.name.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_distinct_requests() {
        let engine = Engine::new();
        let module = engine
            .compile_module(
                r#"
                import { a } from './a.mjs';
                import { b } from './b.mjs';
                export { c } from './a.mjs';
                export * from './d.mjs';
                export const local = 1;
                "#,
            )
            .unwrap();
        assert_eq!(module.requests(), ["./a.mjs", "./b.mjs", "./d.mjs"]);
    }

    #[test]
    fn evaluates_exports() {
        let engine = Engine::new();
        let module = engine
            .compile_module(
                r#"
                export const testValue = 42;
                const hidden = 1;
                export default hidden + 1;
                export function double(n) { return n * 2; }
                "#,
            )
            .unwrap();
        let exports = engine
            .evaluate_module(&module, &FxHashMap::default())
            .unwrap();
        assert_eq!(exports.get("testValue"), Some(&Value::Number(42.0)));
        assert_eq!(exports.get("default"), Some(&Value::Number(2.0)));
        assert!(exports.get("double").is_some_and(Value::is_function));
        assert!(!exports.contains_key("hidden"));
    }

    #[test]
    fn export_list_reads_final_values() {
        let engine = Engine::new();
        let module = engine
            .compile_module("let n = 1; export { n as value }; n = 5;")
            .unwrap();
        let exports = engine
            .evaluate_module(&module, &FxHashMap::default())
            .unwrap();
        assert_eq!(exports.get("value"), Some(&Value::Number(5.0)));
    }

    #[test]
    fn imports_bind_from_resolved_dependencies() {
        let engine = Engine::new();
        let module = engine
            .compile_module(
                "import { base } from './dep.mjs'; export const total = base + 2;",
            )
            .unwrap();
        let mut dep = ExportMap::default();
        dep.insert("base".to_string(), Value::Number(40.0));
        let mut resolved = FxHashMap::default();
        resolved.insert("./dep.mjs".to_string(), dep);
        let exports = engine.evaluate_module(&module, &resolved).unwrap();
        assert_eq!(exports.get("total"), Some(&Value::Number(42.0)));
    }

    #[test]
    fn missing_named_export_is_a_syntax_error() {
        let engine = Engine::new();
        let module = engine
            .compile_module("import { nope } from './dep.mjs';")
            .unwrap();
        let mut resolved = FxHashMap::default();
        resolved.insert("./dep.mjs".to_string(), ExportMap::default());
        match engine.evaluate_module(&module, &resolved) {
            Err(Error::SyntaxError(message)) => assert!(message.contains("nope")),
            other => panic!("expected SyntaxError, got {other:?}"),
        }
    }
}
