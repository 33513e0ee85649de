//! Lexical environments for variable binding.

use super::value::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A lexical environment for variable bindings.
///
/// Environments are shared (`Arc`) so closures can capture their defining
/// scope; the binding map is interior-mutable.
#[derive(Debug, Default)]
pub struct Environment {
    /// The bindings in this environment
    bindings: RwLock<FxHashMap<String, Binding>>,
    /// The outer (parent) environment
    outer: Option<Arc<Environment>>,
}

/// Outcome of assigning to an existing binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// The assignment succeeded
    Assigned,
    /// The binding is a `const`
    Immutable,
    /// No binding with that name exists in the chain
    Undeclared,
}

impl Environment {
    /// Creates a new root environment.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a new environment nested in an outer environment.
    pub fn with_outer(outer: Arc<Environment>) -> Arc<Self> {
        Arc::new(Self {
            bindings: RwLock::new(FxHashMap::default()),
            outer: Some(outer),
        })
    }

    /// Declares a variable without initializing it.
    pub fn declare(&self, name: &str, mutable: bool) {
        self.bindings.write().insert(
            name.to_string(),
            Binding {
                value: Value::Undefined,
                mutable,
                initialized: false,
            },
        );
    }

    /// Initializes a previously declared variable.
    pub fn initialize(&self, name: &str, value: Value) -> bool {
        if let Some(binding) = self.bindings.write().get_mut(name) {
            binding.value = value;
            binding.initialized = true;
            true
        } else {
            false
        }
    }

    /// Declares and initializes a variable in one step.
    pub fn define(&self, name: &str, value: Value, mutable: bool) {
        self.bindings.write().insert(
            name.to_string(),
            Binding {
                value,
                mutable,
                initialized: true,
            },
        );
    }

    /// Gets a variable's value.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(binding) = self.bindings.read().get(name) {
            if binding.initialized {
                return Some(binding.value.clone());
            }
            return None;
        }
        if let Some(outer) = &self.outer {
            return outer.get(name);
        }
        None
    }

    /// Returns true if a binding with the name exists anywhere in the chain.
    pub fn has(&self, name: &str) -> bool {
        if self.bindings.read().contains_key(name) {
            return true;
        }
        match &self.outer {
            Some(outer) => outer.has(name),
            None => false,
        }
    }

    /// Sets a variable's value, walking the chain to the declaring scope.
    pub fn set(&self, name: &str, value: Value) -> SetOutcome {
        {
            let mut bindings = self.bindings.write();
            if let Some(binding) = bindings.get_mut(name) {
                if !binding.mutable {
                    return SetOutcome::Immutable;
                }
                binding.value = value;
                binding.initialized = true;
                return SetOutcome::Assigned;
            }
        }
        match &self.outer {
            Some(outer) => outer.set(name, value),
            None => SetOutcome::Undeclared,
        }
    }
}

/// A variable binding.
#[derive(Debug, Clone)]
struct Binding {
    /// The value
    value: Value,
    /// Whether the binding is mutable (let vs const)
    mutable: bool,
    /// Whether the binding has been initialized
    initialized: bool,
}
