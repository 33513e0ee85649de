// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module namespace objects

use skiff_js::{ExportMap, Value};
use std::fmt;
use url::Url;

/// The exported bindings of a successfully loaded module.
///
/// A namespace is immutable once produced and is shared by reference
/// (`Arc<ModuleNamespace>`): loading the same locator twice in one load
/// context yields the identical namespace.
#[derive(Debug)]
pub struct ModuleNamespace {
    url: Url,
    exports: ExportMap,
}

impl ModuleNamespace {
    pub(crate) fn new(url: Url, exports: ExportMap) -> Self {
        Self { url, exports }
    }

    /// The URL this namespace was loaded from.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Gets an exported value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.exports.get(name)
    }

    /// The default export, when present.
    pub fn default_export(&self) -> Option<&Value> {
        self.exports.get("default")
    }

    /// Returns true if the module exports the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.exports.contains_key(name)
    }

    /// All export names, sorted (namespace objects expose keys in order).
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.exports.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of exported bindings.
    pub fn len(&self) -> usize {
        self.exports.len()
    }

    /// Returns true if the module exports nothing.
    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    pub(crate) fn exports(&self) -> &ExportMap {
        &self.exports
    }
}

impl fmt::Display for ModuleNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The namespace type tag, distinguishing it from a plain object
        write!(f, "[object Module]")
    }
}
