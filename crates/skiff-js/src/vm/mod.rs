//! Execution of parsed programs.

mod interpreter;

pub use interpreter::{Completion, Interpreter};
