//! Rust grammar.
//!
//! `impl` blocks are type scopes named after the implemented type, so
//! methods end up contained by their type. `mod foo;` declarations count
//! as imports of the module file.

use std::path::{Path, PathBuf};

use tree_sitter::Node;

use super::queries::{QuerySet, QuerySources};
use super::{Candidate, ImportSite, LanguageGrammar};
use crate::language::Language;
use crate::model::ImportKind;
use crate::parse::ParsedSource;

const QUERIES: QuerySources = QuerySources {
    functions: &[r#"
        (function_item
          name: (identifier) @name
          parameters: (parameters) @params) @definition
    "#],
    types: &[
        r#"(struct_item name: (type_identifier) @name) @definition"#,
        r#"(enum_item name: (type_identifier) @name) @definition"#,
        r#"(union_item name: (type_identifier) @name) @definition"#,
        r#"(trait_item name: (type_identifier) @name) @definition"#,
        r#"(type_item name: (type_identifier) @name) @definition"#,
        r#"(impl_item type: (_)) @definition"#,
    ],
    imports: &[
        r#"(use_declaration argument: (_) @module) @import"#,
        r#"(extern_crate_declaration name: (identifier) @module) @import"#,
        r#"(mod_item name: (identifier) @module !body) @import"#,
    ],
    calls: &[r#"(call_expression function: (_) @callee) @call"#],
};

pub struct RustGrammar {
    queries: QuerySet,
}

impl RustGrammar {
    pub fn new() -> Self {
        let lang = tree_sitter_rust::LANGUAGE.into();
        Self {
            queries: QuerySet::compile(&lang, "rust", &QUERIES),
        }
    }
}

impl Default for RustGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageGrammar for RustGrammar {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn queries(&self) -> &QuerySet {
        &self.queries
    }

    fn function_kinds(&self) -> &'static [&'static str] {
        &["function_item"]
    }

    fn type_kinds(&self) -> &'static [&'static str] {
        &[
            "struct_item",
            "enum_item",
            "union_item",
            "trait_item",
            "type_item",
            "impl_item",
        ]
    }

    fn import_kinds(&self) -> &'static [&'static str] {
        &["use_declaration", "extern_crate_declaration", "mod_item"]
    }

    fn call_kinds(&self) -> &'static [&'static str] {
        &["call_expression"]
    }

    fn definition_name(&self, node: Node, parsed: &ParsedSource) -> Option<String> {
        let field = if node.kind() == "impl_item" { "type" } else { "name" };
        let text = parsed.text(node.child_by_field_name(field)?);
        let name = strip_generics(&text);
        (!name.is_empty()).then(|| name.to_string())
    }

    fn definition_metadata(&self, node: Node, parsed: &ParsedSource) -> Vec<(String, String)> {
        if node.kind() != "impl_item" {
            return Vec::new();
        }
        node.child_by_field_name("trait")
            .map(|t| vec![("trait".to_string(), strip_generics(&parsed.text(t)).to_string())])
            .unwrap_or_default()
    }

    fn normalize_module(&self, raw: &str) -> Option<String> {
        let unaliased = raw.split(" as ").next().unwrap_or(raw);
        let path: String = unaliased.chars().filter(|c| !c.is_whitespace()).collect();
        let mut path = path.as_str().trim_start_matches("::");

        if let Some(inner) = path.strip_prefix('{') {
            // `use {a, b};` records the first item
            path = inner.split([',', '}']).next().unwrap_or("");
        }
        if let Some(idx) = path.find("::{") {
            path = &path[..idx];
        }
        let path = path.trim_end_matches("::*").trim_end_matches("::");
        (!path.is_empty()).then(|| path.to_string())
    }

    fn module_candidates(&self, module: &str, site: &ImportSite) -> Vec<Candidate> {
        let segments: Vec<&str> = module.split("::").filter(|s| !s.is_empty()).collect();
        let Some(first) = segments.first() else {
            return Vec::new();
        };

        let root = crate_root(site.importer);
        let here = module_dir(site.importer);

        let (bases, rest) = match *first {
            "crate" => (vec![root], &segments[1..]),
            "self" => (vec![here], &segments[1..]),
            "super" => {
                let mut dir = here;
                let mut consumed = 0;
                while segments.get(consumed) == Some(&"super") {
                    if !dir.pop() {
                        return Vec::new();
                    }
                    consumed += 1;
                }
                (vec![dir], &segments[consumed..])
            }
            _ if here == root => (vec![here], &segments[..]),
            _ => (vec![here, root], &segments[..]),
        };

        let mut candidates = Vec::new();
        for base in bases {
            if rest.is_empty() {
                candidates.push(Candidate::File(base.with_extension("rs")));
                candidates.push(Candidate::File(base.join("mod.rs")));
                continue;
            }
            // Longest module path first; trailing segments may be items.
            for len in (1..=rest.len()).rev() {
                let stem: PathBuf = base.join(rest[..len].iter().collect::<PathBuf>());
                candidates.push(Candidate::File(stem.with_extension("rs")));
                candidates.push(Candidate::File(stem.join("mod.rs")));
            }
        }
        candidates
    }

    fn binding_name(&self, module: &str, _kind: ImportKind) -> Option<String> {
        module
            .rsplit("::")
            .next()
            .filter(|s| !matches!(*s, "" | "self" | "super" | "crate"))
            .map(str::to_string)
    }
}

fn strip_generics(text: &str) -> &str {
    text.split('<').next().unwrap_or("").trim()
}

/// Nearest `src` directory above the file, or the file's own directory.
fn crate_root(importer: &Path) -> PathBuf {
    let dir = importer.parent().unwrap_or(Path::new(""));
    dir.ancestors()
        .find(|a| a.file_name().map(|n| n == "src").unwrap_or(false))
        .unwrap_or(dir)
        .to_path_buf()
}

/// Directory holding the children of the file's module.
fn module_dir(importer: &Path) -> PathBuf {
    let dir = importer.parent().unwrap_or(Path::new("")).to_path_buf();
    match importer.file_stem().and_then(|s| s.to_str()) {
        Some("mod") | Some("lib") | Some("main") | None => dir,
        Some(stem) => dir.join(stem),
    }
}
