//! TypeScript grammar (`.ts`, not TSX).

use super::javascript::{
    normalize_specifier, specifier_binding, specifier_candidates, FUNCTION_KINDS,
};
use super::queries::{QuerySet, QuerySources};
use super::{Candidate, ImportSite, LanguageGrammar};
use crate::language::Language;
use crate::model::ImportKind;

const QUERIES: QuerySources = QuerySources {
    functions: &[
        r#"(function_declaration name: (identifier) @name parameters: (formal_parameters) @params) @definition"#,
        r#"(generator_function_declaration name: (identifier) @name parameters: (formal_parameters) @params) @definition"#,
        r#"(function_expression parameters: (formal_parameters) @params) @definition"#,
        r#"(generator_function parameters: (formal_parameters) @params) @definition"#,
        r#"(arrow_function) @definition"#,
        r#"(method_definition name: (_) @name parameters: (formal_parameters) @params) @definition"#,
    ],
    types: &[
        r#"(class_declaration name: (type_identifier) @name) @definition"#,
        r#"(abstract_class_declaration name: (type_identifier) @name) @definition"#,
        r#"(interface_declaration name: (type_identifier) @name) @definition"#,
        r#"(type_alias_declaration name: (type_identifier) @name) @definition"#,
        r#"(enum_declaration name: (identifier) @name) @definition"#,
    ],
    imports: &[
        r#"(import_statement source: (string) @module) @import"#,
        r#"(import_statement (import_require_clause (string) @module)) @import"#,
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

const EXTENSIONS: &[&str] = &["ts", "js"];

pub struct TypeScriptGrammar {
    queries: QuerySet,
}

impl TypeScriptGrammar {
    pub fn new() -> Self {
        let lang = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
        Self {
            queries: QuerySet::compile(&lang, "typescript", &QUERIES),
        }
    }
}

impl Default for TypeScriptGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageGrammar for TypeScriptGrammar {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }

    fn queries(&self) -> &QuerySet {
        &self.queries
    }

    fn function_kinds(&self) -> &'static [&'static str] {
        FUNCTION_KINDS
    }

    fn type_kinds(&self) -> &'static [&'static str] {
        &[
            "class_declaration",
            "abstract_class_declaration",
            "interface_declaration",
            "type_alias_declaration",
            "enum_declaration",
        ]
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
        specifier_candidates(module, site, EXTENSIONS)
    }

    fn binding_name(&self, module: &str, _kind: ImportKind) -> Option<String> {
        specifier_binding(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_ts_prefers_ts_sources() {
        let grammar = TypeScriptGrammar::new();
        let site = ImportSite {
            importer: Path::new("web/app.ts"),
            go_module: None,
        };
        let candidates = grammar.module_candidates("./models", &site);
        assert_eq!(candidates[0], Candidate::File(PathBuf::from("web/models.ts")));
        assert_eq!(candidates[1], Candidate::File(PathBuf::from("web/models.js")));
        assert_eq!(
            candidates[2],
            Candidate::File(PathBuf::from("web/models/index.ts"))
        );
    }
}
