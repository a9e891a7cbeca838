//! Integration tests for response materialization against a real filesystem.

use codeloom::{FileRegistry, Materializer};
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, Materializer, FileRegistry) {
    let dir = TempDir::new().unwrap();
    let materializer = Materializer::new(dir.path().join("project"));
    (dir, materializer, FileRegistry::new())
}

#[test]
fn well_formed_segments_all_land_on_disk() {
    let (dir, materializer, mut registry) = setup();
    let response = "Here is the first pass.\n\n\
        File: src/app.py\n\
        ```python\n\
        print(\"app\")\n\
        ```\n\n\
        File: static/style.css\n\
        ```css\n\
        body { margin: 0; }\n\
        ```\n\n\
        File: index.html\n\
        ```html\n\
        <html></html>\n\
        ```\n";

    let report = materializer.materialize(response, &mut registry, 1);

    assert_eq!(report.written.len(), 3);
    assert!(report.warnings.is_empty());
    assert_eq!(registry.len(), 3);
    assert_eq!(
        fs::read_to_string(dir.path().join("project/src/app.py")).unwrap(),
        "print(\"app\")\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("project/static/style.css")).unwrap(),
        "body { margin: 0; }\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("project/index.html")).unwrap(),
        "<html></html>\n"
    );
}

#[test]
fn repeated_path_overwrites_without_growing_registry() {
    let (dir, materializer, mut registry) = setup();
    let first = "File: src/app.py\n```python\nprint(\"v1\")\n```\n";
    let second = "File: src/app.py\n```python\nprint(\"v2\")\n```\n";

    materializer.materialize(first, &mut registry, 1);
    assert_eq!(registry.len(), 1);

    let report = materializer.materialize(second, &mut registry, 2);
    assert_eq!(report.written.len(), 1);
    assert_eq!(registry.len(), 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("project/src/app.py")).unwrap(),
        "print(\"v2\")\n"
    );
    assert_eq!(registry.get("src/app.py").unwrap().round, 2);
}

#[test]
fn identical_content_is_reported_unchanged() {
    let (dir, materializer, mut registry) = setup();
    let response = "File: src/app.py\n```python\nprint(\"same\")\n```\n";

    materializer.materialize(response, &mut registry, 1);
    let report = materializer.materialize(response, &mut registry, 2);

    assert!(report.written.is_empty());
    assert_eq!(report.unchanged, vec!["src/app.py".to_string()]);
    assert_eq!(registry.len(), 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("project/src/app.py")).unwrap(),
        "print(\"same\")\n"
    );
}

#[test]
fn response_without_segments_writes_nothing() {
    let (dir, materializer, mut registry) = setup();
    let response = "I will start by outlining the architecture. The app has three layers.\n\
        Each layer talks only to its neighbor.";

    let report = materializer.materialize(response, &mut registry, 1);

    assert_eq!(report.files_touched(), 0);
    assert!(registry.is_empty());
    assert!(!dir.path().join("project").exists());
}

#[test]
fn nested_directory_creation_is_idempotent() {
    let (dir, materializer, mut registry) = setup();
    let response = "File: a/b/c/deep.py\n```python\nx = 1\n```\n";

    let first = materializer.materialize(response, &mut registry, 1);
    let second = materializer.materialize(response, &mut registry, 2);

    assert!(first.warnings.is_empty());
    assert!(second.warnings.is_empty());
    assert!(dir.path().join("project/a/b/c/deep.py").exists());
    assert_eq!(registry.len(), 1);
}

#[test]
fn comment_marker_without_fence_still_materializes() {
    let (dir, materializer, mut registry) = setup();
    let response = "// file: src/main.py\nprint(\"hi\")";

    let report = materializer.materialize(response, &mut registry, 1);

    assert_eq!(report.written, vec!["src/main.py".to_string()]);
    assert_eq!(
        fs::read_to_string(dir.path().join("project/src/main.py")).unwrap(),
        "print(\"hi\")\n"
    );
    assert!(registry.contains("src/main.py"));
}

#[test]
fn malformed_segments_warn_but_do_not_abort() {
    let (dir, materializer, mut registry) = setup();
    // One pathless block, one traversal attempt, one good file.
    let response = "```\nmystery content\n```\n\n\
        File: ../escape.py\n\
        ```python\nprint(\"bad\")\n```\n\n\
        File: ok.py\n\
        ```python\nprint(\"good\")\n```\n";

    let report = materializer.materialize(response, &mut registry, 1);

    assert_eq!(report.written, vec!["ok.py".to_string()]);
    assert_eq!(report.warnings.len(), 2);
    assert_eq!(registry.len(), 1);
    assert!(dir.path().join("project/ok.py").exists());
    assert!(!dir.path().join("escape.py").exists());
}

#[test]
fn structure_section_directories_are_created() {
    let (dir, materializer, mut registry) = setup();
    let response = "## Project Structure\n\
        ├── src/\n\
        │   ├── models/\n\
        │   └── views/\n\
        ├── tests/\n\
        \n\
        File: src/models/user.py\n\
        ```python\nclass User: pass\n```\n";

    let report = materializer.materialize(response, &mut registry, 1);

    assert!(dir.path().join("project/src").is_dir());
    assert!(dir.path().join("project/tests").is_dir());
    // Parent directories for written files appear regardless of the section.
    assert!(dir.path().join("project/src/models").is_dir());
    assert_eq!(report.written, vec!["src/models/user.py".to_string()]);
}
