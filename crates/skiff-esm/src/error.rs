// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for module loading

use thiserror::Error;

/// Result type for module loading operations
pub type Result<T> = std::result::Result<T, EsmError>;

/// Errors that can occur while loading an ES module.
///
/// Every failure of the underlying facilities (resolution, file system,
/// compilation, evaluation) surfaces through this single type; a failed
/// load never yields a partial namespace.
#[derive(Debug, Error)]
pub enum EsmError {
    /// JavaScript engine error (syntax error, evaluation error, `throw`)
    #[error("{0}")]
    Engine(#[from] skiff_js::Error),

    /// The locator did not resolve to an existing file
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(String),

    /// The locator is not a URL or relative reference
    #[error("Invalid module specifier '{specifier}': {reason}")]
    InvalidSpecifier {
        /// The offending specifier
        specifier: String,
        /// Reason for failure
        reason: String,
    },

    /// The locator's URL scheme is not loadable
    #[error("Unsupported URL scheme '{scheme}' for module '{specifier}'")]
    UnsupportedScheme {
        /// The URL scheme
        scheme: String,
        /// The offending specifier
        specifier: String,
    },

    /// The file is not an ECMAScript module (e.g. CommonJS)
    #[error("Module '{0}' cannot be loaded as an ECMAScript module")]
    NotEsm(String),

    /// Circular dependency detected
    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    /// File system error
    #[error("File system error: {0}")]
    Fs(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}
