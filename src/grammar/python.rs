//! Python grammar.

use std::path::PathBuf;

use super::queries::{QuerySet, QuerySources};
use super::{Candidate, ImportSite, LanguageGrammar};
use crate::language::Language;
use crate::model::ImportKind;

const QUERIES: QuerySources = QuerySources {
    functions: &[r#"
        (function_definition
          name: (identifier) @name
          parameters: (parameters) @params) @definition
    "#],
    types: &[r#"
        (class_definition
          name: (identifier) @name) @definition
    "#],
    imports: &[
        r#"(import_statement name: (dotted_name) @module) @import"#,
        r#"(import_statement name: (aliased_import name: (dotted_name) @module)) @import"#,
        r#"(import_from_statement module_name: (dotted_name) @from_module) @import"#,
        r#"(import_from_statement module_name: (relative_import) @from_module) @import"#,
    ],
    calls: &[r#"(call function: (_) @callee) @call"#],
};

pub struct PythonGrammar {
    queries: QuerySet,
}

impl PythonGrammar {
    pub fn new() -> Self {
        let lang = tree_sitter_python::LANGUAGE.into();
        Self {
            queries: QuerySet::compile(&lang, "python", &QUERIES),
        }
    }
}

impl Default for PythonGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageGrammar for PythonGrammar {
    fn language(&self) -> Language {
        Language::Python
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn queries(&self) -> &QuerySet {
        &self.queries
    }

    fn function_kinds(&self) -> &'static [&'static str] {
        &["function_definition"]
    }

    fn type_kinds(&self) -> &'static [&'static str] {
        &["class_definition"]
    }

    fn import_kinds(&self) -> &'static [&'static str] {
        &["import_statement", "import_from_statement"]
    }

    fn call_kinds(&self) -> &'static [&'static str] {
        &["call"]
    }

    fn module_candidates(&self, module: &str, site: &ImportSite) -> Vec<Candidate> {
        let dots = module.chars().take_while(|c| *c == '.').count();
        let rest = &module[dots..];

        let base = if dots > 0 {
            // One dot is the importing package, each further dot climbs a level.
            let mut base = site.importer_dir();
            for _ in 1..dots {
                if !base.pop() {
                    return Vec::new();
                }
            }
            base
        } else {
            PathBuf::new()
        };

        let mut stem = base;
        for part in rest.split('.').filter(|p| !p.is_empty()) {
            stem.push(part);
        }
        if stem.as_os_str().is_empty() {
            return Vec::new();
        }
        // A bare `.` or `..` names a package, never a sibling module.
        if rest.is_empty() {
            return vec![Candidate::File(stem.join("__init__.py"))];
        }

        vec![
            Candidate::File(stem.with_extension("py")),
            Candidate::File(stem.join("__init__.py")),
        ]
    }

    fn binding_name(&self, module: &str, kind: ImportKind) -> Option<String> {
        // `from x import y` binds `y`, which the module text does not carry.
        match kind {
            ImportKind::Direct => module.split('.').next().map(str::to_string),
            ImportKind::From => None,
        }
    }
}
