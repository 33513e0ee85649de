// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Locator resolution: URL strings to on-disk module files

use crate::error::{EsmError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Module format, detected from the file extension and package metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleType {
    /// ECMAScript module (import/export)
    Esm,
    /// CommonJS module (require/module.exports)
    CommonJs,
    /// JSON file
    Json,
    /// Unknown/detect from package metadata
    Unknown,
}

impl ModuleType {
    /// Detect module type from file path
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("mjs") => ModuleType::Esm,
            Some("cjs") => ModuleType::CommonJs,
            Some("json") => ModuleType::Json,
            _ => ModuleType::Unknown,
        }
    }

    /// Detect module type from package.json "type" field.
    ///
    /// Absent or unrecognized values default to ESM, since this loader
    /// only serves `import`.
    pub fn from_package_type(type_field: Option<&str>) -> Self {
        match type_field {
            Some("commonjs") => ModuleType::CommonJs,
            _ => ModuleType::Esm,
        }
    }
}

/// A locator resolved to an on-disk module file.
#[derive(Debug, Clone)]
pub struct ResolvedModule {
    /// The canonical URL of the module
    pub url: Url,
    /// The filesystem path
    pub path: PathBuf,
    /// Detected module format
    pub module_type: ModuleType,
}

/// Resolves module locators (URL strings) to files.
///
/// Accepted inputs are absolute `file://` URLs and, for requests issued
/// from inside a module, `./`/`../` relative references joined against the
/// referrer's URL. Bare specifiers are rejected: there is no search-path
/// resolution here.
#[derive(Debug, Default)]
pub struct ModuleResolver;

impl ModuleResolver {
    /// Creates a new module resolver
    pub fn new() -> Self {
        Self
    }

    /// Resolves a module specifier against an optional referrer.
    pub fn resolve(&self, specifier: &str, referrer: Option<&Url>) -> Result<ResolvedModule> {
        let url = match Url::parse(specifier) {
            Ok(url) => url,
            Err(_) if specifier.starts_with("./") || specifier.starts_with("../") => {
                let Some(base) = referrer else {
                    return Err(EsmError::InvalidSpecifier {
                        specifier: specifier.to_string(),
                        reason: "relative reference without a referrer".to_string(),
                    });
                };
                base.join(specifier)
                    .map_err(|e| EsmError::InvalidSpecifier {
                        specifier: specifier.to_string(),
                        reason: e.to_string(),
                    })?
            }
            Err(e) => {
                return Err(EsmError::InvalidSpecifier {
                    specifier: specifier.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        if url.scheme() != "file" {
            return Err(EsmError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
                specifier: specifier.to_string(),
            });
        }

        let path = url.to_file_path().map_err(|_| EsmError::InvalidSpecifier {
            specifier: specifier.to_string(),
            reason: "not a valid file URL".to_string(),
        })?;

        if !path.is_file() {
            return Err(EsmError::ModuleNotFound(specifier.to_string()));
        }
        let path = path.canonicalize().unwrap_or(path);

        let module_type = self.module_type_for(&path)?;

        Ok(ResolvedModule {
            url,
            path,
            module_type,
        })
    }

    /// Determines the module format for a resolved file.
    fn module_type_for(&self, path: &Path) -> Result<ModuleType> {
        // Check file extension first
        let ext_type = ModuleType::from_path(path);
        if ext_type != ModuleType::Unknown {
            return Ok(ext_type);
        }

        // Check package.json "type" field
        if let Some(pkg_type) = self.find_package_type(path)? {
            return Ok(pkg_type);
        }

        Ok(ModuleType::Esm)
    }

    /// Finds the nearest package.json "type" field above a file.
    fn find_package_type(&self, path: &Path) -> Result<Option<ModuleType>> {
        let mut current = path.parent();

        while let Some(dir) = current {
            let pkg_path = dir.join("package.json");
            if pkg_path.exists() {
                let content = std::fs::read_to_string(&pkg_path)?;
                if let Ok(pkg) = serde_json::from_str::<PackageJson>(&content) {
                    return Ok(Some(ModuleType::from_package_type(
                        pkg.type_field.as_deref(),
                    )));
                }
            }
            current = dir.parent();
        }

        Ok(None)
    }
}

/// Minimal package.json structure for type detection
#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(rename = "type")]
    type_field: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_module_type_from_path() {
        assert_eq!(ModuleType::from_path(Path::new("foo.mjs")), ModuleType::Esm);
        assert_eq!(
            ModuleType::from_path(Path::new("foo.cjs")),
            ModuleType::CommonJs
        );
        assert_eq!(
            ModuleType::from_path(Path::new("foo.json")),
            ModuleType::Json
        );
        assert_eq!(
            ModuleType::from_path(Path::new("foo.js")),
            ModuleType::Unknown
        );
    }

    #[test]
    fn test_module_type_from_package() {
        assert_eq!(
            ModuleType::from_package_type(Some("module")),
            ModuleType::Esm
        );
        assert_eq!(
            ModuleType::from_package_type(Some("commonjs")),
            ModuleType::CommonJs
        );
        assert_eq!(ModuleType::from_package_type(None), ModuleType::Esm);
    }

    #[test]
    fn bare_specifiers_are_rejected() {
        let resolver = ModuleResolver::new();
        match resolver.resolve("lodash", None) {
            Err(EsmError::InvalidSpecifier { specifier, .. }) => {
                assert_eq!(specifier, "lodash");
            }
            other => panic!("expected InvalidSpecifier, got {other:?}"),
        }
    }

    #[test]
    fn relative_reference_requires_referrer() {
        let resolver = ModuleResolver::new();
        assert!(matches!(
            resolver.resolve("./mock.mjs", None),
            Err(EsmError::InvalidSpecifier { .. })
        ));
    }

    #[test]
    fn non_file_schemes_are_rejected() {
        let resolver = ModuleResolver::new();
        match resolver.resolve("https://example.com/mod.mjs", None) {
            Err(EsmError::UnsupportedScheme { scheme, .. }) => assert_eq!(scheme, "https"),
            other => panic!("expected UnsupportedScheme, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_module_not_found() {
        let resolver = ModuleResolver::new();
        assert!(matches!(
            resolver.resolve("file:///non-existent-module.js", None),
            Err(EsmError::ModuleNotFound(_))
        ));
    }

    #[test]
    fn resolves_existing_file_and_detects_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mock.mjs");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "export const testValue = 42;").unwrap();

        let resolver = ModuleResolver::new();
        let url = Url::from_file_path(&path).unwrap();
        let resolved = resolver.resolve(url.as_str(), None).unwrap();
        assert_eq!(resolved.module_type, ModuleType::Esm);
        assert!(resolved.path.ends_with("mock.mjs"));
    }

    #[test]
    fn relative_reference_joins_against_referrer() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dep.mjs"), "export const x = 1;").unwrap();
        let referrer = Url::from_file_path(dir.path().join("main.mjs")).unwrap();

        let resolver = ModuleResolver::new();
        let resolved = resolver.resolve("./dep.mjs", Some(&referrer)).unwrap();
        assert!(resolved.path.ends_with("dep.mjs"));
    }

    #[test]
    fn package_type_governs_js_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"type": "commonjs"}"#).unwrap();
        std::fs::write(dir.path().join("mod.js"), "module.exports = 1;").unwrap();

        let resolver = ModuleResolver::new();
        let url = Url::from_file_path(dir.path().join("mod.js")).unwrap();
        let resolved = resolver.resolve(url.as_str(), None).unwrap();
        assert_eq!(resolved.module_type, ModuleType::CommonJs);
    }
}
