//! File-backed tests for documents, schema resolution and term registries.

use std::fs;

use serde_json::json;
use tempfile::TempDir;

use recform_ingest::{
    DirectorySchemaResolver, IngestError, JsonTermRegistry, load_document, write_document,
};
use recform_model::{RegistryError, SchemaResolver, TermRecord, TermRegistry};

fn record(name: &str, url: &str) -> TermRecord {
    TermRecord {
        name: name.to_string(),
        url: url.to_string(),
    }
}

// ============================================================================
// Documents
// ============================================================================

#[test]
fn documents_load_by_extension() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.json"), r#"{"name": "Max", "age": 3}"#).unwrap();
    fs::write(dir.path().join("b.yml"), "name: Max\nage: 3\n").unwrap();
    fs::write(dir.path().join("c.csv"), "name,age\nMax,3\n").unwrap();

    assert_eq!(
        load_document(&dir.path().join("a.json")).unwrap(),
        json!({"name": "Max", "age": 3})
    );
    assert_eq!(
        load_document(&dir.path().join("b.yml")).unwrap(),
        json!({"name": "Max", "age": 3})
    );
    assert_eq!(
        load_document(&dir.path().join("c.csv")).unwrap(),
        json!([{"name": "Max", "age": "3"}])
    );
}

#[test]
fn missing_and_unsupported_files() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("none.json");
    assert!(matches!(load_document(&missing), Err(IngestError::Io { .. })));

    let csv_out = dir.path().join("out.csv");
    let error = write_document(&csv_out, &json!([])).unwrap_err();
    assert!(matches!(error, IngestError::UnsupportedFormat { .. }));
    assert_eq!(error.path(), csv_out.as_path());
}

#[test]
fn written_documents_read_back() {
    let dir = TempDir::new().unwrap();
    let tree = json!({"people": [{"full-name": "Max", "age": 1.5}], "ok": true});
    let nested = dir.path().join("out/deeper/tree.yaml");
    write_document(&nested, &tree).unwrap();
    assert_eq!(load_document(&nested).unwrap(), tree);

    let json_path = dir.path().join("tree.json");
    write_document(&json_path, &tree).unwrap();
    assert!(fs::read_to_string(&json_path).unwrap().ends_with("}\n"));
}

// ============================================================================
// Schema resolution
// ============================================================================

#[test]
fn schemas_resolve_by_slug_and_extend() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("person.yaml"),
        "'*': Person\nname:\n  '*': full-name\nage:\n  '*': age|lambda x: int(x)\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("employee.json"),
        r#"{"_:extends": "person", "age": {"*": "years"}, "salary": {"*": "pay"}}"#,
    )
    .unwrap();
    let resolver = DirectorySchemaResolver::new(dir.path());

    assert_eq!(
        resolver.resolve("https://example.org/schemas/Person", false),
        Some(json!({"*": "Person", "name": {"*": "full-name"}, "age": {"*": "age|lambda x: int(x)"}}))
    );
    assert_eq!(
        resolver.resolve("Employee", false),
        Some(json!({"name": {"*": "full-name"}, "age": {"*": "years"}, "salary": {"*": "pay"}}))
    );
    assert_eq!(resolver.resolve("unknown", false), None);
}

#[test]
fn refresh_bypasses_the_cache() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("s.json");
    fs::write(&file, r#"{"a": {"*": "one"}}"#).unwrap();
    let resolver = DirectorySchemaResolver::new(dir.path());
    assert_eq!(resolver.resolve("s", false), Some(json!({"a": {"*": "one"}})));

    fs::write(&file, r#"{"a": {"*": "two"}}"#).unwrap();
    assert_eq!(resolver.resolve("s", false), Some(json!({"a": {"*": "one"}})));
    assert_eq!(resolver.resolve("s", true), Some(json!({"a": {"*": "two"}})));
    assert_eq!(resolver.resolve("s", false), Some(json!({"a": {"*": "two"}})));
}

#[test]
fn extension_cycles_terminate() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.json"), r#"{"_:extends": "b", "x": {"*": "a"}}"#).unwrap();
    fs::write(dir.path().join("b.json"), r#"{"_:extends": "a", "y": {"*": "b"}}"#).unwrap();
    let resolver = DirectorySchemaResolver::new(dir.path());
    let resolved = resolver.resolve("a", false).unwrap();
    assert_eq!(resolved["x"], json!({"*": "a"}));
    assert_eq!(resolved["y"], json!({"*": "b"}));
}

// ============================================================================
// Term registry
// ============================================================================

#[test]
fn registry_persists_and_rejects_duplicates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("terms/registry.json");
    let registry = JsonTermRegistry::open(&path).unwrap();
    registry.register(record("b", "B")).unwrap();
    registry
        .register(record("wd-q82799", "WD:Q82799"))
        .unwrap();
    assert!(matches!(
        registry.register(record("b", "other")),
        Err(RegistryError::Conflict { name }) if name == "b"
    ));

    let reopened = JsonTermRegistry::open(&path).unwrap();
    assert_eq!(
        reopened.records(),
        vec![record("b", "B"), record("wd-q82799", "WD:Q82799")]
    );
    assert_eq!(reopened.lookup("b").map(|found| found.url), Some("B".to_string()));
}

#[test]
fn corrupt_registry_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("registry.json");
    fs::write(&path, "{not json").unwrap();
    assert!(matches!(
        JsonTermRegistry::open(&path),
        Err(IngestError::Json { .. })
    ));
}
