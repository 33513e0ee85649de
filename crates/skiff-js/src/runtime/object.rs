//! Heap objects with interior-mutable property maps.

use super::value::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// A JavaScript object: a class tag plus a property map.
///
/// Objects are shared by reference (`Arc<JsObject>` inside [`Value`]); the
/// property map is interior-mutable so shared references can update it.
#[derive(Debug, Default)]
pub struct JsObject {
    class: &'static str,
    properties: RwLock<FxHashMap<String, Value>>,
}

impl JsObject {
    /// Creates a new ordinary object.
    pub fn new() -> Self {
        Self::with_class("Object")
    }

    /// Creates an object with the given class tag ("Array", "Error", ...).
    pub fn with_class(class: &'static str) -> Self {
        Self {
            class,
            properties: RwLock::new(FxHashMap::default()),
        }
    }

    /// Creates an array object: index-keyed properties plus `length`.
    pub fn array(elements: Vec<Value>) -> Self {
        let object = Self::with_class("Array");
        {
            let mut properties = object.properties.write();
            for (i, value) in elements.iter().enumerate() {
                properties.insert(i.to_string(), value.clone());
            }
            properties.insert("length".to_string(), Value::Number(elements.len() as f64));
        }
        object
    }

    /// The class tag of this object.
    pub fn class(&self) -> &'static str {
        self.class
    }

    /// Gets a property value.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.properties.read().get(key).cloned()
    }

    /// Sets a property value.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.properties.write().insert(key.into(), value);
    }

    /// Returns true if the property exists.
    pub fn has(&self, key: &str) -> bool {
        self.properties.read().contains_key(key)
    }

    /// All property names, in arbitrary order.
    pub fn keys(&self) -> Vec<String> {
        self.properties.read().keys().cloned().collect()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.read().len()
    }

    /// Returns true if the object has no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.read().is_empty()
    }
}
