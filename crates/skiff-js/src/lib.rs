// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # skiff-js
//!
//! A small embeddable ECMAScript engine, implemented in Rust.
//!
//! ## Overview
//!
//! This crate provides the execution environment the Skiff module loader
//! builds on:
//! - Lexer and recursive descent parser for a practical JavaScript subset
//! - Tree-walking evaluator with closures and `try`/`catch`
//! - Module records: compile in the module goal, report dependency
//!   requests, evaluate against resolved dependencies
//! - A minimal global surface (`Error` constructors, `Math`, `console`)
//!
//! ## Quick Start
//!
//! ```rust
//! use skiff_js::{Engine, Value};
//!
//! let engine = Engine::new();
//! let result = engine.eval("1 + 2;").unwrap();
//! assert_eq!(result, Value::Number(3.0));
//! ```
//!
//! ## Modules
//!
//! ```rust
//! use skiff_js::Engine;
//!
//! let engine = Engine::new();
//! let module = engine.compile_module("export const testValue = 42;").unwrap();
//! assert!(module.requests().is_empty());
//! let exports = engine.evaluate_module(&module, &Default::default()).unwrap();
//! assert_eq!(exports["testValue"], skiff_js::Value::Number(42.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod builtins;
pub mod lexer;
pub mod module;
pub mod parser;
pub mod runtime;
pub mod vm;

use runtime::environment::Environment;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

// Re-exports for convenience
pub use module::{ExportMap, Module};
pub use runtime::value::Value;

/// The main JavaScript engine instance.
///
/// Owns the global environment. Cheap to share behind an `Arc`; all interior
/// state is thread-safe.
pub struct Engine {
    globals: Arc<Environment>,
}

impl Engine {
    /// Creates a new engine instance with the default global surface.
    pub fn new() -> Self {
        let globals = Environment::new();
        builtins::install(&globals);
        Self { globals }
    }

    /// The global environment scripts and modules evaluate against.
    pub fn globals(&self) -> &Arc<Environment> {
        &self.globals
    }

    /// Evaluates JavaScript source code in the script goal and returns the
    /// value of the last expression statement.
    pub fn eval(&self, source: &str) -> Result<Value, Error> {
        let program = parser::Parser::new(source).parse_program()?;
        let scope = Environment::with_outer(Arc::clone(&self.globals));
        vm::Interpreter::new().eval_program(&program, &scope)
    }

    /// Compiles source code in the module goal without evaluating it.
    ///
    /// The returned [`Module`] reports its dependency requests so the
    /// embedder can resolve and load them before evaluation.
    pub fn compile_module(&self, source: &str) -> Result<Module, Error> {
        let program = parser::Parser::new(source).parse_module()?;
        Ok(Module::new(program))
    }

    /// Evaluates a compiled module, binding its imports from `resolved`
    /// (a map from request specifier to that dependency's exports).
    ///
    /// The module body runs exactly once per call; caching evaluated
    /// modules is the embedder's concern.
    pub fn evaluate_module(
        &self,
        module: &Module,
        resolved: &FxHashMap<String, ExportMap>,
    ) -> Result<ExportMap, Error> {
        module::evaluate(self, module, resolved)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during JavaScript parsing or execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Syntax error during parsing
    SyntaxError(String),
    /// Type error during execution
    TypeError(String),
    /// Reference error (undefined variable)
    ReferenceError(String),
    /// Range error (out of bounds, etc.)
    RangeError(String),
    /// A value thrown by user code (`throw`)
    Thrown(Value),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SyntaxError(message) => write!(f, "SyntaxError: {}", message),
            Error::TypeError(message) => write!(f, "TypeError: {}", message),
            Error::ReferenceError(message) => write!(f, "ReferenceError: {}", message),
            Error::RangeError(message) => write!(f, "RangeError: {}", message),
            Error::Thrown(value) => write!(f, "Uncaught {}", value),
        }
    }
}

impl std::error::Error for Error {}
