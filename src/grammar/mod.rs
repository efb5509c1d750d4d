//! Grammar registry: one `LanguageGrammar` implementation per language.
//!
//! Each implementation bundles:
//! - the tree-sitter grammar
//! - a compiled `QuerySet` (functions, types, imports, calls)
//! - node-kind tables used by the semantic graph walk
//! - module-path hooks used by the cross-file resolver
//!
//! Implementations are created once, stored in process-wide `OnceCell`s
//! and shared read-only between concurrent analyses.
//!
//! # Adding a New Language
//!
//! 1. Create a module here (e.g. `ruby.rs`) implementing `LanguageGrammar`
//! 2. Add the variant to `Language` and its extension to the table
//! 3. Register the implementation in `grammar_for`

mod go;
mod javascript;
mod python;
mod queries;
mod rust_lang;
mod typescript;

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tree_sitter::Node;

pub use go::GoGrammar;
pub use javascript::JavaScriptGrammar;
pub use python::PythonGrammar;
pub use queries::{CategoryQuery, QuerySet, QuerySources};
pub use rust_lang::RustGrammar;
pub use typescript::TypeScriptGrammar;

use crate::error::AnalysisError;
use crate::language::Language;
use crate::model::ImportKind;
use crate::parse::ParsedSource;

/// A place the resolver should look for an imported module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// A source file, relative to the repository root.
    File(PathBuf),
    /// A package directory whose first source file stands for the module.
    PackageDir(PathBuf),
}

impl Candidate {
    pub fn path(&self) -> &Path {
        match self {
            Candidate::File(p) | Candidate::PackageDir(p) => p,
        }
    }
}

/// Facts about the importing file the resolver hands to `module_candidates`.
#[derive(Debug, Clone)]
pub struct ImportSite<'a> {
    /// Importing file path, relative to the repository root.
    pub importer: &'a Path,
    /// Module path declared in the repository's `go.mod`, if any.
    pub go_module: Option<&'a str>,
}

impl ImportSite<'_> {
    /// Directory of the importing file ("" for files at the root).
    pub fn importer_dir(&self) -> PathBuf {
        self.importer
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

/// Language-specific grammar, queries and naming rules.
///
/// The structural extractor, the semantic graph builder and the
/// resolver only talk to this trait; none of them branch on the
/// language tag.
pub trait LanguageGrammar: Send + Sync {
    fn language(&self) -> Language;

    /// The tree-sitter grammar.
    fn ts_language(&self) -> tree_sitter::Language;

    /// Compiled structural queries.
    fn queries(&self) -> &QuerySet;

    /// Node kinds that open a function scope.
    fn function_kinds(&self) -> &'static [&'static str];

    /// Node kinds that open a type scope.
    fn type_kinds(&self) -> &'static [&'static str];

    /// Node kinds matched as `@import` by the imports query.
    fn import_kinds(&self) -> &'static [&'static str];

    /// Node kinds that are call expressions.
    fn call_kinds(&self) -> &'static [&'static str];

    /// Name of a definition node, `None` for anonymous definitions.
    fn definition_name(&self, node: Node, parsed: &ParsedSource) -> Option<String> {
        node.child_by_field_name("name")
            .map(|n| parsed.text(n).trim().to_string())
            .filter(|n| !n.is_empty())
    }

    /// Parameter list text of a function node.
    fn parameters(&self, node: Node, parsed: &ParsedSource) -> Option<String> {
        node.child_by_field_name("parameters")
            .or_else(|| node.child_by_field_name("parameter"))
            .map(|n| parsed.text(n).into_owned())
    }

    /// Extra key/value facts for a definition (e.g. a Go method receiver).
    fn definition_metadata(&self, _node: Node, _parsed: &ParsedSource) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Turn the captured module text into the identifier recorded on
    /// the import (quotes stripped, use-lists trimmed, ...).
    fn normalize_module(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Import kind for a capture name of the imports query.
    fn import_kind(&self, capture_name: &str) -> ImportKind {
        if capture_name == "from_module" {
            ImportKind::From
        } else {
            ImportKind::Direct
        }
    }

    /// Statically visible callee text of a call node.
    fn callee_name(&self, node: Node, parsed: &ParsedSource) -> Option<String> {
        let callee = node.child_by_field_name("function")?;
        callee_text(&parsed.text(callee))
    }

    /// Root-relative places to look for `module`, in priority order.
    fn module_candidates(&self, module: &str, site: &ImportSite) -> Vec<Candidate>;

    /// Local name the import binds, used to link call targets to it.
    fn binding_name(&self, module: &str, kind: ImportKind) -> Option<String>;
}

/// Callee expression text up to the first `(`, whitespace removed.
///
/// `obj.method(x).other` becomes `obj.method`.
pub fn callee_text(raw: &str) -> Option<String> {
    let head = raw.split('(').next().unwrap_or("");
    let name: String = head.chars().filter(|c| !c.is_whitespace()).collect();
    (!name.is_empty()).then_some(name)
}

/// Synthesized name for a definition without a name.
pub fn anonymous_name(line: usize) -> String {
    format!("anonymous_at_line_{}", line)
}

static PYTHON: OnceCell<PythonGrammar> = OnceCell::new();
static JAVASCRIPT: OnceCell<JavaScriptGrammar> = OnceCell::new();
static TYPESCRIPT: OnceCell<TypeScriptGrammar> = OnceCell::new();
static GO: OnceCell<GoGrammar> = OnceCell::new();
static RUST: OnceCell<RustGrammar> = OnceCell::new();

/// The grammar implementation for a language.
///
/// Grammars are built lazily on first use and live for the process.
pub fn grammar_for(language: Language) -> &'static dyn LanguageGrammar {
    match language {
        Language::Python => PYTHON.get_or_init(PythonGrammar::new),
        Language::JavaScript => JAVASCRIPT.get_or_init(JavaScriptGrammar::new),
        Language::TypeScript => TYPESCRIPT.get_or_init(TypeScriptGrammar::new),
        Language::Go => GO.get_or_init(GoGrammar::new),
        Language::Rust => RUST.get_or_init(RustGrammar::new),
    }
}

/// The grammar implementation for a language identifier.
///
/// Fails with `UnsupportedLanguage` outside the five known identifiers.
pub fn grammar_for_id(id: &str) -> Result<&'static dyn LanguageGrammar, AnalysisError> {
    let language: Language = id.parse()?;
    Ok(grammar_for(language))
}

/// Build every grammar up front (e.g. before spawning workers).
pub fn register_grammars() {
    for language in Language::ALL {
        grammar_for(language);
    }
}

/// Strip one layer of matching string quotes.
pub(crate) fn strip_quotes(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\'', '`'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

/// Lexically join `rel` onto `base`, resolving `.` and `..`.
///
/// Returns `None` when `..` climbs above `base`'s root.
pub(crate) fn join_relative(base: &Path, rel: &str) -> Option<PathBuf> {
    let mut parts: Vec<String> = base
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    for segment in rel.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other.to_string()),
        }
    }
    Some(parts.iter().collect())
}
