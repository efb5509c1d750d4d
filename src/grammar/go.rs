//! Go grammar.

use std::path::PathBuf;

use tree_sitter::Node;

use super::queries::{QuerySet, QuerySources};
use super::{strip_quotes, Candidate, ImportSite, LanguageGrammar};
use crate::language::Language;
use crate::model::ImportKind;
use crate::parse::ParsedSource;

const QUERIES: QuerySources = QuerySources {
    functions: &[
        r#"(function_declaration name: (identifier) @name parameters: (parameter_list) @params) @definition"#,
        r#"(method_declaration name: (field_identifier) @name parameters: (parameter_list) @params) @definition"#,
        r#"(func_literal parameters: (parameter_list) @params) @definition"#,
    ],
    types: &[
        r#"(type_spec name: (type_identifier) @name) @definition"#,
        r#"(type_alias name: (type_identifier) @name) @definition"#,
    ],
    imports: &[r#"(import_spec path: (_) @module) @import"#],
    calls: &[r#"(call_expression function: (_) @callee) @call"#],
};

pub struct GoGrammar {
    queries: QuerySet,
}

impl GoGrammar {
    pub fn new() -> Self {
        let lang = tree_sitter_go::LANGUAGE.into();
        Self {
            queries: QuerySet::compile(&lang, "go", &QUERIES),
        }
    }
}

impl Default for GoGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageGrammar for GoGrammar {
    fn language(&self) -> Language {
        Language::Go
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_go::LANGUAGE.into()
    }

    fn queries(&self) -> &QuerySet {
        &self.queries
    }

    fn function_kinds(&self) -> &'static [&'static str] {
        &["function_declaration", "method_declaration", "func_literal"]
    }

    fn type_kinds(&self) -> &'static [&'static str] {
        &["type_spec", "type_alias"]
    }

    fn import_kinds(&self) -> &'static [&'static str] {
        &["import_spec"]
    }

    fn call_kinds(&self) -> &'static [&'static str] {
        &["call_expression"]
    }

    fn definition_metadata(&self, node: Node, parsed: &ParsedSource) -> Vec<(String, String)> {
        if node.kind() != "method_declaration" {
            return Vec::new();
        }
        node.child_by_field_name("receiver")
            .and_then(|params| receiver_type(params, parsed))
            .map(|ty| vec![("receiver".to_string(), ty)])
            .unwrap_or_default()
    }

    fn normalize_module(&self, raw: &str) -> Option<String> {
        let path = strip_quotes(raw).trim();
        (!path.is_empty()).then(|| path.to_string())
    }

    fn module_candidates(&self, module: &str, site: &ImportSite) -> Vec<Candidate> {
        // With a go.mod, only paths under its module are local.
        if let Some(prefix) = site.go_module {
            if module == prefix {
                return vec![Candidate::PackageDir(PathBuf::new())];
            }
            return module
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('/'))
                .map(|rest| vec![Candidate::PackageDir(PathBuf::from(rest))])
                .unwrap_or_default();
        }

        // Without one, strip host-qualified paths segment by segment; bare
        // paths like `net/http` are the standard library.
        let segments: Vec<&str> = module.split('/').collect();
        if segments.len() < 2 {
            return Vec::new();
        }
        if segments[0].contains('.') {
            (1..segments.len())
                .map(|start| Candidate::PackageDir(segments[start..].iter().collect()))
                .collect()
        } else {
            vec![Candidate::PackageDir(PathBuf::from(module))]
        }
    }

    fn binding_name(&self, module: &str, _kind: ImportKind) -> Option<String> {
        module
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// `(c *Config)` yields `Config`.
fn receiver_type(params: Node, parsed: &ParsedSource) -> Option<String> {
    let mut cursor = params.walk();
    let decl = params
        .named_children(&mut cursor)
        .find(|c| c.kind() == "parameter_declaration")?;
    let ty = decl.child_by_field_name("type")?;
    let text = parsed.text(ty);
    let name = text.trim_start_matches('*').split('[').next().unwrap_or("").trim();
    (!name.is_empty()).then(|| name.to_string())
}
