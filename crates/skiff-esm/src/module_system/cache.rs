// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Cache of completed module loads

use crate::namespace::ModuleNamespace;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Thread-safe cache mapping canonical module paths to their namespaces.
///
/// An entry is only inserted once a module has fully evaluated, so a cache
/// hit always returns a complete namespace.
#[derive(Debug, Default)]
pub struct ModuleCache {
    cache: DashMap<PathBuf, Arc<ModuleNamespace>>,
}

impl ModuleCache {
    /// Creates a new empty cache
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Gets a cached namespace by path
    pub fn get(&self, path: &Path) -> Option<Arc<ModuleNamespace>> {
        self.cache.get(path).map(|entry| Arc::clone(entry.value()))
    }

    /// Checks if a module is cached
    pub fn has(&self, path: &Path) -> bool {
        self.cache.contains_key(path)
    }

    /// Adds a completed module to the cache
    pub fn insert(&self, path: PathBuf, namespace: Arc<ModuleNamespace>) {
        self.cache.insert(path, namespace);
    }

    /// Clears the entire cache
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Number of cached modules
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Checks if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
