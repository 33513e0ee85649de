// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # skiff-esm
//!
//! Dynamic ECMAScript module loading on the Skiff engine.
//!
//! The crate exposes a single operation: give it a file URL locator, get
//! back the module's exported bindings, or the failure, through the same
//! asynchronous result. Resolution, parsing, and evaluation are delegated
//! to the embedded [`skiff_js`] engine; this crate adds the locator model,
//! the module cache, and the namespace surface.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skiff_esm::load_esm;
//!
//! # async fn run() -> skiff_esm::Result<()> {
//! let namespace = load_esm("file:///app/mock.mjs").await?;
//! println!("{:?}", namespace.get("testValue"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Load contexts
//!
//! [`load_esm`] stands up a fresh load context per call. To share the
//! module cache across loads (the same locator evaluates once and returns
//! the identical namespace), hold an [`EsmLoader`]:
//!
//! ```rust,no_run
//! use skiff_esm::EsmLoader;
//!
//! # async fn run() -> skiff_esm::Result<()> {
//! let loader = EsmLoader::new();
//! let first = loader.load_esm("file:///app/mock.mjs").await?;
//! let second = loader.load_esm("file:///app/mock.mjs").await?;
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod module_system;
pub mod namespace;

// Re-exports
pub use error::{EsmError, Result};
pub use module_system::{EsmLoader, ModuleCache, ModuleResolver, ModuleType, load_esm};
pub use namespace::ModuleNamespace;

/// Version of the skiff-esm crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
