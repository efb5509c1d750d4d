//! Integration tests for cross-file import resolution.

use std::fs;
use std::path::PathBuf;

use semgraph::{
    analyze_file, register_grammars, AnalysisRecord, Classification, DependencyRecord, Engine,
    EngineConfig,
};
use tempfile::TempDir;

fn sample_repo() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/sample_repo")
}

fn setup() {
    register_grammars();
}

fn dependency<'a>(record: &'a AnalysisRecord, import_name: &str) -> &'a DependencyRecord {
    record
        .dependencies
        .iter()
        .find(|d| d.import_name == import_name)
        .unwrap_or_else(|| panic!("no dependency {:?}", import_name))
}

#[test]
fn test_python_internal_module() {
    setup();
    let record = analyze_file(sample_repo(), "app/main.py");
    let expected = fs::read_to_string(sample_repo().join("pkg/util.py")).unwrap();

    let util = dependency(&record, "pkg.util");
    assert_eq!(util.classification, Classification::Internal);
    assert_eq!(util.resolved_module, "pkg/util");
    assert_eq!(util.target_path.as_deref(), Some("pkg/util.py"));
    assert_eq!(util.source.as_deref(), Some(expected.as_str()));
    assert_eq!(util.line_count, expected.lines().count());
    assert_eq!(util.byte_size, expected.len() as u64);
    assert_eq!(util.referenced_by, vec!["pkg.util.helper"]);
}

#[test]
fn test_python_package_and_relative_imports() {
    setup();
    let record = analyze_file(sample_repo(), "app/main.py");

    let package = dependency(&record, "pkg");
    assert_eq!(package.classification, Classification::Internal);
    assert_eq!(package.target_path.as_deref(), Some("pkg/__init__.py"));
    assert_eq!(package.resolved_module, "pkg");

    let settings = dependency(&record, ".settings");
    assert_eq!(settings.classification, Classification::Internal);
    assert_eq!(settings.target_path.as_deref(), Some("app/settings.py"));
}

#[test]
fn test_python_external_module() {
    setup();
    let record = analyze_file(sample_repo(), "app/main.py");

    let os = dependency(&record, "os");
    assert_eq!(os.classification, Classification::External);
    assert_eq!(os.resolved_module, "os");
    assert!(os.target_path.is_none());
    assert!(os.source.is_none());
    assert!(os.snippet.is_none());
    assert_eq!(os.referenced_by, vec!["os.path.join"]);

    let external: Vec<&str> = record.external_dependencies().collect();
    assert_eq!(external, vec!["os"]);
}

#[test]
fn test_one_dependency_per_import_in_order() {
    setup();
    let record = analyze_file(sample_repo(), "app/main.py");
    let names: Vec<&str> = record
        .dependencies
        .iter()
        .map(|d| d.import_name.as_str())
        .collect();
    let modules: Vec<&str> = record.imports.iter().map(|i| i.module.as_str()).collect();
    assert_eq!(names, modules);
}

#[test]
fn test_javascript_relative_and_bare_specifiers() {
    setup();
    let record = analyze_file(sample_repo(), "web/app.js");

    let util = dependency(&record, "./util");
    assert_eq!(util.classification, Classification::Internal);
    assert_eq!(util.target_path.as_deref(), Some("web/util.js"));
    assert_eq!(util.resolved_module, "web/util");

    let path = dependency(&record, "path");
    assert_eq!(path.classification, Classification::External);
}

#[test]
fn test_typescript_resolves_javascript_sibling() {
    setup();
    let record = analyze_file(sample_repo(), "web/types.ts");
    let app = dependency(&record, "./app");
    assert_eq!(app.classification, Classification::Internal);
    assert_eq!(app.target_path.as_deref(), Some("web/app.js"));
}

#[test]
fn test_go_module_package() {
    setup();
    let record = analyze_file(sample_repo(), "cmd/server/main.go");

    let store = dependency(&record, "example.com/sample/internal/store");
    assert_eq!(store.classification, Classification::Internal);
    assert_eq!(store.target_path.as_deref(), Some("internal/store/store.go"));
    assert_eq!(store.referenced_by, vec!["store.New"]);

    let fmt = dependency(&record, "fmt");
    assert_eq!(fmt.classification, Classification::External);
    assert_eq!(fmt.referenced_by, vec!["fmt.Println"]);
}

#[test]
fn test_rust_module_paths() {
    setup();
    let record = analyze_file(sample_repo(), "src/lib.rs");

    let module = dependency(&record, "graph");
    assert_eq!(module.classification, Classification::Internal);
    assert_eq!(module.target_path.as_deref(), Some("src/graph.rs"));
    assert_eq!(module.referenced_by, vec!["graph::Graph::new"]);

    let crate_path = dependency(&record, "crate::graph::Graph");
    assert_eq!(crate_path.classification, Classification::Internal);
    assert_eq!(crate_path.target_path.as_deref(), Some("src/graph.rs"));

    let std = dependency(&record, "std::collections::HashMap");
    assert_eq!(std.classification, Classification::External);
}

#[test]
fn test_snippet_budget_from_config() {
    setup();
    let config = EngineConfig {
        snippet_budget: 10,
        ..EngineConfig::default()
    };
    let record = Engine::with_config(sample_repo(), config).analyze_file("app/main.py");
    let util = dependency(&record, "pkg.util");

    assert_eq!(util.snippet.as_deref(), Some("def helper"));
    // the full source is still attached
    assert!(util.source.as_ref().unwrap().len() > 10);
}

#[test]
fn test_project_prefix() {
    setup();
    let dir = TempDir::new().unwrap();
    let write = |rel: &str, content: &str| {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    };
    write("lib/shared/text.py", "def clean(s):\n    return s.strip()\n");
    write("app.py", "import shared.text\n");

    let record = analyze_file(dir.path(), "app.py");
    assert_eq!(
        dependency(&record, "shared.text").classification,
        Classification::External
    );

    let config = EngineConfig {
        project_prefixes: vec!["lib".to_string()],
        ..EngineConfig::default()
    };
    let record = Engine::with_config(dir.path(), config).analyze_file("app.py");
    let text = dependency(&record, "shared.text");
    assert_eq!(text.classification, Classification::Internal);
    assert_eq!(text.target_path.as_deref(), Some("lib/shared/text.py"));
}

#[test]
fn test_resolution_stays_inside_root() {
    setup();
    let outer = TempDir::new().unwrap();
    let root = outer.path().join("repo");
    fs::create_dir_all(&root).unwrap();
    fs::write(outer.path().join("secret.js"), "module.exports = 1;\n").unwrap();
    fs::write(root.join("main.js"), "const s = require('../secret');\n").unwrap();

    let record = analyze_file(&root, "main.js");
    assert_eq!(
        dependency(&record, "../secret").classification,
        Classification::External
    );
}
