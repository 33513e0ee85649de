//! Function objects: user-defined closures and native functions.

use super::environment::Environment;
use super::value::Value;
use crate::Error;
use crate::ast::{Expression, Statement};
use std::sync::Arc;

/// Signature for native (Rust-implemented) functions.
pub type NativeFn = fn(&[Value]) -> Result<Value, Error>;

/// A callable value.
#[derive(Debug)]
pub enum Callable {
    /// A user-defined function (closure over its defining environment)
    Function(Function),
    /// A native function implemented in Rust
    Native {
        /// Function name, for display
        name: &'static str,
        /// The implementation
        func: NativeFn,
    },
}

/// A user-defined function.
#[derive(Debug)]
pub struct Function {
    /// Optional function name
    pub name: Option<String>,
    /// Parameter names
    pub params: Vec<String>,
    /// The function body
    pub body: FunctionBody,
    /// The environment the function closes over
    pub env: Arc<Environment>,
}

/// A function body: a statement list, or a bare expression (arrows).
#[derive(Debug)]
pub enum FunctionBody {
    /// `{ ... }` body
    Block(Vec<Statement>),
    /// Arrow expression body
    Expression(Expression),
}
