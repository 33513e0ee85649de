// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! ECMAScript module loading
//!
//! - Locator resolution (`file://` URLs, relative references)
//! - Module format detection (`.mjs` / `.cjs` / `.json`, `package.json`
//!   "type" field)
//! - Completed-module cache with cycle detection
//! - The [`EsmLoader`] load pipeline

mod cache;
pub mod esm;
mod resolver;

pub use cache::ModuleCache;
pub use esm::{EsmLoader, load_esm};
pub use resolver::{ModuleResolver, ModuleType, ResolvedModule};
