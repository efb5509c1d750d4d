//! Integration tests for parsing and structural extraction.
//!
//! These tests validate definition, import and call extraction for each
//! language through the public parse/extract API.

use semgraph::grammar::grammar_for_id;
use semgraph::{
    extract, grammar_for, parse, register_grammars, ImportKind, Language, StructuralFacts,
};

/// Initialize grammars before running tests.
fn setup() {
    register_grammars();
}

fn facts(path: &str, source: &str) -> StructuralFacts {
    setup();
    let language = Language::from_path(path).expect("supported extension");
    let parsed = parse(path, source.as_bytes(), language, None).expect("should parse");
    extract(&parsed, grammar_for(language))
}

fn names(records: &[semgraph::DefinitionRecord]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

// =============================================================================
// Registry
// =============================================================================

#[test]
fn test_grammar_lookup() {
    setup();
    for id in ["python", "javascript", "typescript", "go", "rust"] {
        let grammar = grammar_for_id(id).expect("grammar should be registered");
        assert_eq!(grammar.language().as_str(), id);
        assert!(grammar.queries().failures().is_empty(), "{} queries degraded", id);
    }
    assert!(grammar_for_id("cobol").is_err());
}

#[test]
fn test_extension_detection() {
    assert_eq!(Language::from_path("a/b.py"), Some(Language::Python));
    assert_eq!(Language::from_path("web/app.ts"), Some(Language::TypeScript));
    assert_eq!(Language::from_path("web/app.tsx"), None);
    assert_eq!(Language::from_path("Makefile"), None);
}

// =============================================================================
// Python
// =============================================================================

#[test]
fn test_python_extraction() {
    let source = r#"import json
from collections import OrderedDict as OD

class Cache:
    def get(self, key):
        return self.items.get(key)

def load(path):
    with open(path) as f:
        return json.load(f)
"#;
    let facts = facts("cache.py", source);

    assert_eq!(names(&facts.functions), vec!["get", "load"]);
    assert_eq!(names(&facts.types), vec!["Cache"]);

    let get = &facts.functions[0];
    assert_eq!(get.start_line(), 5);
    assert_eq!(get.parameters.as_deref(), Some("(self, key)"));
    assert!(get.source.starts_with("def get(self, key):"));

    assert_eq!(facts.imports[0].module, "json");
    assert_eq!(facts.imports[0].kind, ImportKind::Direct);
    assert_eq!(facts.imports[1].module, "collections");
    assert_eq!(facts.imports[1].kind, ImportKind::From);

    let callees: Vec<&str> = facts.calls.iter().map(|c| c.callee.as_str()).collect();
    assert_eq!(callees, vec!["self.items.get", "open", "json.load"]);
}

// =============================================================================
// JavaScript / TypeScript
// =============================================================================

#[test]
fn test_javascript_extraction() {
    let source = r#"const fs = require('fs');
import { join } from './paths.js';

class Loader {
  read(name) {
    return fs.readFileSync(join('.', name));
  }
}

const handler = function () {};
"#;
    let facts = facts("loader.js", source);

    assert_eq!(names(&facts.functions), vec!["read", "anonymous_at_line_10"]);
    assert_eq!(names(&facts.types), vec!["Loader"]);

    let modules: Vec<&str> = facts.imports.iter().map(|i| i.module.as_str()).collect();
    assert_eq!(modules, vec!["fs", "./paths.js"]);
}

#[test]
fn test_typescript_extraction() {
    let source = r#"import type { Options } from "./options";

export type Id = string;

export enum Mode {
  Fast,
  Safe,
}

export abstract class Base {
  abstract run(opts: Options): void;
}

export function start(mode: Mode): Id {
  return String(mode);
}
"#;
    let facts = facts("start.ts", source);

    assert_eq!(names(&facts.types), vec!["Id", "Mode", "Base"]);
    assert!(facts.functions.iter().any(|f| f.name == "start"));
    assert_eq!(facts.imports[0].module, "./options");
}

// =============================================================================
// Go
// =============================================================================

#[test]
fn test_go_extraction() {
    let source = r#"package main

import (
	"fmt"
	str "strings"
)

type Config struct {
	Name string
}

func (c *Config) Validate() error {
	return nil
}

func main() {
	fmt.Println(str.ToUpper("hello"))
}
"#;
    let facts = facts("main.go", source);

    assert_eq!(names(&facts.functions), vec!["Validate", "main"]);
    assert_eq!(names(&facts.types), vec!["Config"]);

    let modules: Vec<&str> = facts.imports.iter().map(|i| i.module.as_str()).collect();
    assert_eq!(modules, vec!["fmt", "strings"]);
    assert_eq!(facts.imports[1].line, 5);
}

// =============================================================================
// Rust
// =============================================================================

#[test]
fn test_rust_extraction() {
    let source = r#"use std::collections::{HashMap, HashSet};
use serde::Serialize;

pub trait Store {
    fn get(&self, key: &str) -> Option<String>;
}

pub struct Memory {
    items: HashMap<String, String>,
}

impl Store for Memory {
    fn get(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }
}
"#;
    let facts = facts("store.rs", source);

    let modules: Vec<&str> = facts.imports.iter().map(|i| i.module.as_str()).collect();
    assert_eq!(modules, vec!["std::collections", "serde::Serialize"]);
    assert_eq!(names(&facts.types), vec!["Store", "Memory", "Memory"]);
    assert_eq!(names(&facts.functions), vec!["get"]);
}

#[test]
fn test_extraction_survives_syntax_errors() {
    let facts = facts("partial.py", "def good():\n    return 1\n\nclass (:\n");
    assert!(facts.functions.iter().any(|f| f.name == "good"));
}
