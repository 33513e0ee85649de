// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The ESM loader: dynamic import of file-URL locators
//!
//! The load pipeline is resolve → cache check → read → compile → link
//! dependencies (depth-first) → evaluate once → register. Failures at any
//! stage surface as [`EsmError`]; a module is cached only after it has
//! fully evaluated.

use crate::error::{EsmError, Result};
use crate::module_system::cache::ModuleCache;
use crate::module_system::resolver::{ModuleResolver, ModuleType, ResolvedModule};
use crate::namespace::ModuleNamespace;
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use skiff_js::runtime::object::JsObject;
use skiff_js::{Engine, ExportMap, Value};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

/// An ESM load context: an embedded engine plus a module cache.
///
/// One loader is one "load context" in host-runtime terms: within a loader,
/// a given locator evaluates at most once and repeated loads return the
/// identical namespace. Distinct loaders share nothing.
pub struct EsmLoader {
    /// The embedded JavaScript engine
    engine: Engine,
    /// Locator resolution
    resolver: ModuleResolver,
    /// Completed modules
    cache: ModuleCache,
    /// Currently loading modules (for circular dependency detection)
    loading: DashMap<PathBuf, ()>,
}

impl EsmLoader {
    /// Creates a new loader with a fresh engine and empty cache.
    pub fn new() -> Self {
        Self {
            engine: Engine::new(),
            resolver: ModuleResolver::new(),
            cache: ModuleCache::new(),
            loading: DashMap::new(),
        }
    }

    /// Dynamically loads an ES module given a file URL locator and returns
    /// its namespace.
    ///
    /// The call suspends until the load settles. Any failure (unresolvable
    /// locator, missing file, syntax error, evaluation error) is returned
    /// as the `Err` arm; there is no retry and no fallback.
    pub async fn load_esm(&self, specifier: &str) -> Result<Arc<ModuleNamespace>> {
        self.load(specifier, None).await
    }

    /// Loads a module by specifier, relative to an optional referrer.
    fn load<'a>(
        &'a self,
        specifier: &'a str,
        referrer: Option<&'a Url>,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<ModuleNamespace>>> + Send + 'a>> {
        Box::pin(async move {
            let resolved = self.resolver.resolve(specifier, referrer)?;

            if let Some(cached) = self.cache.get(&resolved.path) {
                trace!(url = %resolved.url, "module cache hit");
                return Ok(cached);
            }

            // A module requested again while it is still loading is a cycle
            if self.loading.contains_key(&resolved.path) {
                return Err(EsmError::CircularDependency(resolved.url.to_string()));
            }
            self.loading.insert(resolved.path.clone(), ());

            let result = self.load_resolved(&resolved).await;
            self.loading.remove(&resolved.path);
            result
        })
    }

    async fn load_resolved(&self, resolved: &ResolvedModule) -> Result<Arc<ModuleNamespace>> {
        debug!(url = %resolved.url, module_type = ?resolved.module_type, "loading module");

        let exports = match resolved.module_type {
            ModuleType::Json => self.load_json(resolved).await?,
            ModuleType::CommonJs => {
                return Err(EsmError::NotEsm(resolved.url.to_string()));
            }
            ModuleType::Esm | ModuleType::Unknown => self.load_module(resolved).await?,
        };

        let namespace = Arc::new(ModuleNamespace::new(resolved.url.clone(), exports));
        self.cache
            .insert(resolved.path.clone(), Arc::clone(&namespace));
        Ok(namespace)
    }

    /// Reads, compiles, links, and evaluates an ES module file.
    async fn load_module(&self, resolved: &ResolvedModule) -> Result<ExportMap> {
        let source = tokio::fs::read_to_string(&resolved.path).await?;
        let module = self.engine.compile_module(&source)?;

        // Link: load every dependency request before evaluation
        let mut dependencies: FxHashMap<String, ExportMap> = FxHashMap::default();
        for request in module.requests() {
            let namespace = self.load(request, Some(&resolved.url)).await?;
            dependencies.insert(request.clone(), namespace.exports().clone());
        }

        trace!(url = %resolved.url, dependencies = module.requests().len(), "evaluating module");
        Ok(self.engine.evaluate_module(&module, &dependencies)?)
    }

    /// Loads a JSON file as a module with a single `default` export.
    async fn load_json(&self, resolved: &ResolvedModule) -> Result<ExportMap> {
        let content = tokio::fs::read_to_string(&resolved.path).await?;
        let json: serde_json::Value = serde_json::from_str(&content)?;

        let mut exports = ExportMap::default();
        exports.insert("default".to_string(), json_to_value(&json));
        Ok(exports)
    }

    /// Number of completed modules in this load context.
    pub fn cached_modules(&self) -> usize {
        self.cache.len()
    }

    /// Drops all completed modules; subsequent loads re-evaluate.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for EsmLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Dynamically loads an ES module given a file URL locator and returns its
/// exported bindings.
///
/// This is the 1:1 convenience form: it stands up a fresh load context and
/// delegates to [`EsmLoader::load_esm`]. Hold an [`EsmLoader`] instead to
/// share the module cache across calls.
pub async fn load_esm(specifier: &str) -> Result<Arc<ModuleNamespace>> {
    EsmLoader::new().load_esm(specifier).await
}

/// Converts a parsed JSON document to an engine value.
fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(arr) => {
            let elements = arr.iter().map(json_to_value).collect();
            Value::Object(Arc::new(JsObject::array(elements)))
        }
        serde_json::Value::Object(obj) => {
            let object = JsObject::new();
            for (key, value) in obj {
                object.set(key.clone(), json_to_value(value));
            }
            Value::Object(Arc::new(object))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_values_convert() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"n": 1.5, "s": "x", "b": true, "nothing": null, "xs": [1, 2]}"#)
                .unwrap();
        let value = json_to_value(&json);
        let Value::Object(obj) = value else {
            panic!("expected object");
        };
        assert_eq!(obj.get("n"), Some(Value::Number(1.5)));
        assert_eq!(obj.get("s"), Some(Value::String("x".into())));
        assert_eq!(obj.get("b"), Some(Value::Boolean(true)));
        assert_eq!(obj.get("nothing"), Some(Value::Null));
        let Some(Value::Object(xs)) = obj.get("xs") else {
            panic!("expected array");
        };
        assert_eq!(xs.get("length"), Some(Value::Number(2.0)));
        assert_eq!(xs.get("0"), Some(Value::Number(1.0)));
    }
}
