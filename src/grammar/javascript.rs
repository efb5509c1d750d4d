//! JavaScript grammar. The TypeScript grammar reuses the module helpers here.

use std::path::{Path, PathBuf};

use super::queries::{QuerySet, QuerySources};
use super::{join_relative, strip_quotes, Candidate, ImportSite, LanguageGrammar};
use crate::language::Language;
use crate::model::ImportKind;

pub(super) const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "generator_function",
    "arrow_function",
    "method_definition",
];

const QUERIES: QuerySources = QuerySources {
    functions: &[
        r#"(function_declaration name: (identifier) @name parameters: (formal_parameters) @params) @definition"#,
        r#"(generator_function_declaration name: (identifier) @name parameters: (formal_parameters) @params) @definition"#,
        r#"(function_expression parameters: (formal_parameters) @params) @definition"#,
        r#"(generator_function parameters: (formal_parameters) @params) @definition"#,
        r#"(arrow_function) @definition"#,
        r#"(method_definition name: (_) @name parameters: (formal_parameters) @params) @definition"#,
    ],
    types: &[r#"(class_declaration name: (identifier) @name) @definition"#],
    imports: &[
        r#"(import_statement source: (string) @module) @import"#,
        r#"(export_statement source: (string) @module) @import"#,
        r#"
        (call_expression
          function: (identifier) @_require
          arguments: (arguments . (string) @module)
          (#eq? @_require "require")) @import
        "#,
    ],
    calls: &[r#"(call_expression function: (_) @callee) @call"#],
};

pub struct JavaScriptGrammar {
    queries: QuerySet,
}

impl JavaScriptGrammar {
    pub fn new() -> Self {
        let lang = tree_sitter_javascript::LANGUAGE.into();
        Self {
            queries: QuerySet::compile(&lang, "javascript", &QUERIES),
        }
    }
}

impl Default for JavaScriptGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageGrammar for JavaScriptGrammar {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_javascript::LANGUAGE.into()
    }

    fn queries(&self) -> &QuerySet {
        &self.queries
    }

    fn function_kinds(&self) -> &'static [&'static str] {
        FUNCTION_KINDS
    }

    fn type_kinds(&self) -> &'static [&'static str] {
        &["class_declaration"]
    }

    fn import_kinds(&self) -> &'static [&'static str] {
        &["import_statement", "export_statement", "call_expression"]
    }

    fn call_kinds(&self) -> &'static [&'static str] {
        &["call_expression"]
    }

    fn normalize_module(&self, raw: &str) -> Option<String> {
        normalize_specifier(raw)
    }

    fn module_candidates(&self, module: &str, site: &ImportSite) -> Vec<Candidate> {
        specifier_candidates(module, site, &["js"])
    }

    fn binding_name(&self, module: &str, _kind: ImportKind) -> Option<String> {
        specifier_binding(module)
    }
}

pub(super) fn normalize_specifier(raw: &str) -> Option<String> {
    let spec = strip_quotes(raw).trim();
    (!spec.is_empty()).then(|| spec.to_string())
}

/// Candidates for an import specifier.
///
/// Relative specifiers (`./x`, `../x`) resolve against the importing
/// file's directory; bare specifiers are tried from the root and usually
/// end up external.
pub(super) fn specifier_candidates(
    module: &str,
    site: &ImportSite,
    extensions: &[&str],
) -> Vec<Candidate> {
    let relative = module.starts_with("./") || module.starts_with("../") || module == ".";
    let base = if relative {
        match join_relative(&site.importer_dir(), module) {
            Some(base) => base,
            None => return Vec::new(),
        }
    } else if module.starts_with('/') {
        PathBuf::from(module.trim_start_matches('/'))
    } else {
        PathBuf::from(module)
    };
    if base.as_os_str().is_empty() {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    if has_known_extension(&base, extensions) {
        candidates.push(Candidate::File(base.clone()));
        // `./util.js` written in TypeScript source refers to `util.ts`.
        for ext in extensions {
            let swapped = base.with_extension(ext);
            if swapped != base {
                candidates.push(Candidate::File(swapped));
            }
        }
    }
    for ext in extensions {
        let mut file = base.clone().into_os_string();
        file.push(".");
        file.push(ext);
        candidates.push(Candidate::File(PathBuf::from(file)));
    }
    for ext in extensions {
        candidates.push(Candidate::File(base.join(format!("index.{}", ext))));
    }
    candidates
}

fn has_known_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.contains(&e) || e == "js" || e == "mjs" || e == "cjs")
        .unwrap_or(false)
}

/// Last path segment without extension: `./lib/http-client.js` binds `http-client`.
pub(super) fn specifier_binding(module: &str) -> Option<String> {
    let last = module.trim_end_matches('/').rsplit('/').next()?;
    let stem = last.split('.').next().unwrap_or(last);
    (!stem.is_empty()).then(|| stem.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(importer: &str) -> ImportSite<'_> {
        ImportSite {
            importer: Path::new(importer),
            go_module: None,
        }
    }

    #[test]
    fn test_relative_specifier() {
        let candidates = specifier_candidates("./util", &site("web/app.js"), &["js"]);
        assert_eq!(
            candidates,
            vec![
                Candidate::File(PathBuf::from("web/util.js")),
                Candidate::File(PathBuf::from("web/util/index.js")),
            ]
        );
    }

    #[test]
    fn test_parent_specifier_with_extension() {
        let candidates =
            specifier_candidates("../lib/db.js", &site("web/src/app.ts"), &["ts", "js"]);
        assert_eq!(candidates[0], Candidate::File(PathBuf::from("web/lib/db.js")));
        assert_eq!(candidates[1], Candidate::File(PathBuf::from("web/lib/db.ts")));
    }

    #[test]
    fn test_escaping_specifier_has_no_candidates() {
        assert!(specifier_candidates("../../x", &site("a.js"), &["js"]).is_empty());
    }

    #[test]
    fn test_normalize_and_bind() {
        assert_eq!(normalize_specifier("'./util'"), Some("./util".to_string()));
        assert_eq!(normalize_specifier("\"\""), None);
        assert_eq!(specifier_binding("./lib/http.js"), Some("http".to_string()));
        assert_eq!(specifier_binding("lodash"), Some("lodash".to_string()));
    }
}
