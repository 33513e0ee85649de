//! Integration tests for dynamic ES module loading
//!
//! Modules under test are written to a tempdir and loaded through `file://`
//! URL locators, exactly as a host runtime's `import()` would see them.

use skiff_esm::{EsmError, EsmLoader, load_esm};
use skiff_js::Value;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use url::Url;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Writes a module file into the tempdir and returns its path.
fn write_module(dir: &TempDir, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, source).unwrap();
    path
}

fn file_url(path: &Path) -> Url {
    Url::from_file_path(path).unwrap()
}

#[tokio::test]
async fn loads_an_es_module_dynamically() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    // Mock ES module file for testing.
    let module_path = write_module(&dir, "mock.mjs", "export const testValue = 42;\n");

    // Load the ES module dynamically using load_esm.
    let locator = format!("file://{}", module_path.display());
    let namespace = load_esm(&locator).await.unwrap();

    // Verify the loaded module.
    assert_eq!(namespace.to_string(), "[object Module]");
    assert_eq!(namespace.get("testValue"), Some(&Value::Number(42.0)));
}

#[tokio::test]
async fn rejects_when_the_module_path_is_invalid() {
    init_tracing();
    let invalid_path = "file:///non-existent-module.js";

    let error = load_esm(invalid_path).await.unwrap_err();

    // The failure is an error-typed value, not an empty namespace
    let as_std_error: &dyn std::error::Error = &error;
    assert!(as_std_error.to_string().contains("non-existent-module.js"));
    assert!(matches!(error, EsmError::ModuleNotFound(_)));
}

#[tokio::test]
async fn namespace_exposes_all_named_exports() {
    let dir = TempDir::new().unwrap();
    let path = write_module(
        &dir,
        "exports.mjs",
        r#"
        export const testValue = 42;
        export let label = 'mock';
        export function double(n) { return n * 2; }
        export default testValue + 1;
        "#,
    );

    let namespace = load_esm(file_url(&path).as_str()).await.unwrap();
    assert_eq!(namespace.names(), vec!["default", "double", "label", "testValue"]);
    assert_eq!(namespace.get("label"), Some(&Value::String("mock".into())));
    assert_eq!(namespace.default_export(), Some(&Value::Number(43.0)));
    assert!(namespace.get("double").is_some_and(|v| v.is_function()));
    assert!(!namespace.contains("missing"));
}

#[tokio::test]
async fn same_locator_loads_once_per_context() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, "counted.mjs", "export const value = [1, 2, 3];\n");
    let locator = file_url(&path);

    let loader = EsmLoader::new();
    let first = loader.load_esm(locator.as_str()).await.unwrap();
    let second = loader.load_esm(locator.as_str()).await.unwrap();

    // The identical namespace, not a re-evaluation
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(loader.cached_modules(), 1);
    // The exported array is the same object too
    assert_eq!(first.get("value"), second.get("value"));
}

#[tokio::test]
async fn fresh_contexts_reevaluate() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, "fresh.mjs", "export const value = { n: 1 };\n");
    let locator = file_url(&path);

    let first = load_esm(locator.as_str()).await.unwrap();
    let second = load_esm(locator.as_str()).await.unwrap();

    // Distinct load contexts produce distinct (but equivalent) namespaces
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(first.contains("value") && second.contains("value"));
}

#[tokio::test]
async fn static_imports_link_before_evaluation() {
    let dir = TempDir::new().unwrap();
    write_module(&dir, "dep.mjs", "export const base = 40;\nexport default 'dep';\n");
    let main = write_module(
        &dir,
        "main.mjs",
        r#"
        import label, { base } from './dep.mjs';
        import * as dep from './dep.mjs';
        export const total = base + 2;
        export const tag = label + ':' + dep.base;
        "#,
    );

    let namespace = load_esm(file_url(&main).as_str()).await.unwrap();
    assert_eq!(namespace.get("total"), Some(&Value::Number(42.0)));
    assert_eq!(namespace.get("tag"), Some(&Value::String("dep:40".into())));
}

#[tokio::test]
async fn reexports_pass_through() {
    let dir = TempDir::new().unwrap();
    write_module(
        &dir,
        "inner.mjs",
        "export const a = 1;\nexport const b = 2;\nexport default 3;\n",
    );
    let outer = write_module(
        &dir,
        "outer.mjs",
        r#"
        export * from './inner.mjs';
        export { a as first } from './inner.mjs';
        export * as inner from './inner.mjs';
        "#,
    );

    let namespace = load_esm(file_url(&outer).as_str()).await.unwrap();
    assert_eq!(namespace.get("a"), Some(&Value::Number(1.0)));
    assert_eq!(namespace.get("b"), Some(&Value::Number(2.0)));
    assert_eq!(namespace.get("first"), Some(&Value::Number(1.0)));
    // `export *` does not re-export default
    assert!(!namespace.contains("default"));
    match namespace.get("inner") {
        Some(Value::Object(obj)) => {
            assert_eq!(obj.class(), "Module");
            assert_eq!(obj.get("default"), Some(Value::Number(3.0)));
        }
        other => panic!("expected namespace object, got {other:?}"),
    }
}

#[tokio::test]
async fn shared_dependency_evaluates_once() {
    let dir = TempDir::new().unwrap();
    write_module(&dir, "shared.mjs", "export const token = { id: 7 };\n");
    write_module(&dir, "a.mjs", "export { token } from './shared.mjs';\n");
    write_module(&dir, "b.mjs", "export { token as other } from './shared.mjs';\n");
    let main = write_module(
        &dir,
        "diamond.mjs",
        r#"
        import { token } from './a.mjs';
        import { other } from './b.mjs';
        export const same = token === other;
        "#,
    );

    let namespace = load_esm(file_url(&main).as_str()).await.unwrap();
    // Both paths observe the same evaluated object
    assert_eq!(namespace.get("same"), Some(&Value::Boolean(true)));
}

#[tokio::test]
async fn json_modules_load_as_default_export() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, "config.json", r#"{"name": "skiff", "port": 8080}"#);

    let namespace = load_esm(file_url(&path).as_str()).await.unwrap();
    match namespace.default_export() {
        Some(Value::Object(obj)) => {
            assert_eq!(obj.get("name"), Some(Value::String("skiff".into())));
            assert_eq!(obj.get("port"), Some(Value::Number(8080.0)));
        }
        other => panic!("expected default export object, got {other:?}"),
    }
}

#[tokio::test]
async fn module_side_effects_run_once() {
    let dir = TempDir::new().unwrap();
    // The module body mutates its own exported object when it runs
    write_module(
        &dir,
        "effect.mjs",
        "export const state = { runs: 0 };\nstate.runs = state.runs + 1;\n",
    );
    let main = write_module(
        &dir,
        "entry.mjs",
        r#"
        import { state } from './effect.mjs';
        import * as again from './effect.mjs';
        export const runs = state.runs;
        export const sameState = state === again.state;
        "#,
    );

    let namespace = load_esm(file_url(&main).as_str()).await.unwrap();
    assert_eq!(namespace.get("runs"), Some(&Value::Number(1.0)));
    assert_eq!(namespace.get("sameState"), Some(&Value::Boolean(true)));
}

// --- Failure outcomes ---

#[tokio::test]
async fn syntax_errors_reject() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, "broken.mjs", "export const = ;\n");

    match load_esm(file_url(&path).as_str()).await {
        Err(EsmError::Engine(skiff_js::Error::SyntaxError(_))) => {}
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[tokio::test]
async fn evaluation_errors_reject() {
    let dir = TempDir::new().unwrap();
    let path = write_module(
        &dir,
        "throws.mjs",
        "export const ok = 1;\nthrow new Error('boom');\n",
    );

    match load_esm(file_url(&path).as_str()).await {
        Err(EsmError::Engine(skiff_js::Error::Thrown(value))) => {
            assert_eq!(value.to_string(), "Error: boom");
        }
        other => panic!("expected thrown error, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_dependency_fails_the_importer() {
    let dir = TempDir::new().unwrap();
    let main = write_module(&dir, "main.mjs", "import { x } from './missing.mjs';\n");

    match load_esm(file_url(&main).as_str()).await {
        Err(EsmError::ModuleNotFound(specifier)) => {
            assert_eq!(specifier, "./missing.mjs");
        }
        other => panic!("expected ModuleNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_named_export_rejects() {
    let dir = TempDir::new().unwrap();
    write_module(&dir, "dep.mjs", "export const present = 1;\n");
    let main = write_module(&dir, "main.mjs", "import { absent } from './dep.mjs';\n");

    match load_esm(file_url(&main).as_str()).await {
        Err(EsmError::Engine(skiff_js::Error::SyntaxError(message))) => {
            assert!(message.contains("absent"));
        }
        other => panic!("expected missing-export error, got {other:?}"),
    }
}

#[tokio::test]
async fn import_cycles_are_rejected() {
    let dir = TempDir::new().unwrap();
    write_module(&dir, "a.mjs", "import { b } from './b.mjs';\nexport const a = 1;\n");
    let b = write_module(&dir, "b.mjs", "import { a } from './a.mjs';\nexport const b = 2;\n");

    match load_esm(file_url(&b).as_str()).await {
        Err(EsmError::CircularDependency(_)) => {}
        other => panic!("expected CircularDependency, got {other:?}"),
    }
}

#[tokio::test]
async fn unsupported_schemes_reject() {
    match load_esm("https://example.com/mod.mjs").await {
        Err(EsmError::UnsupportedScheme { scheme, .. }) => assert_eq!(scheme, "https"),
        other => panic!("expected UnsupportedScheme, got {other:?}"),
    }
}

#[tokio::test]
async fn bare_and_empty_specifiers_reject() {
    assert!(matches!(
        load_esm("some-package").await,
        Err(EsmError::InvalidSpecifier { .. })
    ));
    assert!(matches!(
        load_esm("").await,
        Err(EsmError::InvalidSpecifier { .. })
    ));
    // Relative references only make sense from inside a module
    assert!(matches!(
        load_esm("./mock.mjs").await,
        Err(EsmError::InvalidSpecifier { .. })
    ));
}

#[tokio::test]
async fn commonjs_files_reject() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, "legacy.cjs", "module.exports = 42;\n");

    match load_esm(file_url(&path).as_str()).await {
        Err(EsmError::NotEsm(_)) => {}
        other => panic!("expected NotEsm, got {other:?}"),
    }
}

#[tokio::test]
async fn package_type_commonjs_rejects_js_files() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("package.json"), r#"{"type": "commonjs"}"#).unwrap();
    let path = write_module(&dir, "mod.js", "module.exports = 42;\n");

    match load_esm(file_url(&path).as_str()).await {
        Err(EsmError::NotEsm(_)) => {}
        other => panic!("expected NotEsm, got {other:?}"),
    }
}

#[tokio::test]
async fn package_type_module_allows_js_files() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("package.json"), r#"{"type": "module"}"#).unwrap();
    let path = write_module(&dir, "mod.js", "export const testValue = 42;\n");

    let namespace = load_esm(file_url(&path).as_str()).await.unwrap();
    assert_eq!(namespace.get("testValue"), Some(&Value::Number(42.0)));
}

#[tokio::test]
async fn malformed_json_module_rejects() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, "bad.json", "{not json");

    match load_esm(file_url(&path).as_str()).await {
        Err(EsmError::JsonParse(_)) => {}
        other => panic!("expected JsonParse, got {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_loads_of_distinct_locators_proceed_independently() {
    let dir = TempDir::new().unwrap();
    let a = write_module(&dir, "one.mjs", "export const n = 1;\n");
    let b = write_module(&dir, "two.mjs", "export const n = 2;\n");

    let loader = EsmLoader::new();
    let url_a = file_url(&a);
    let url_b = file_url(&b);
    let (ra, rb) = tokio::join!(
        loader.load_esm(url_a.as_str()),
        loader.load_esm(url_b.as_str()),
    );
    assert_eq!(ra.unwrap().get("n"), Some(&Value::Number(1.0)));
    assert_eq!(rb.unwrap().get("n"), Some(&Value::Number(2.0)));
}
