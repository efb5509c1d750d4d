//! Compiled structural queries, one set per grammar.
//!
//! Every pattern is compiled on its own so a single pattern that does not
//! fit the linked grammar version costs only that pattern, not the whole
//! category.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};
use tracing::warn;

use crate::error::AnalysisError;
use crate::model::QueryCategory;

/// Query sources for the four structural categories.
///
/// Capture conventions:
/// - `@definition` the function/type node, `@name` its name, `@params` its parameters
/// - `@import` the import statement, `@module` / `@from_module` the module text
/// - `@call` the call node, `@callee` the callee expression
///
/// An empty slice means the category is absent for the language.
pub struct QuerySources {
    pub functions: &'static [&'static str],
    pub types: &'static [&'static str],
    pub imports: &'static [&'static str],
    pub calls: &'static [&'static str],
}

impl QuerySources {
    fn get(&self, category: QueryCategory) -> &'static [&'static str] {
        match category {
            QueryCategory::Functions => self.functions,
            QueryCategory::Types => self.types,
            QueryCategory::Imports => self.imports,
            QueryCategory::Calls => self.calls,
        }
    }
}

/// One match, flattened to `(capture name, node)` pairs.
pub struct QueryHit<'q, 'tree> {
    captures: Vec<(&'q str, Node<'tree>)>,
}

impl<'q, 'tree> QueryHit<'q, 'tree> {
    /// First node captured under `name`.
    pub fn get(&self, name: &str) -> Option<Node<'tree>> {
        self.captures
            .iter()
            .find(|(capture, _)| *capture == name)
            .map(|(_, node)| *node)
    }

    pub fn captures(&self) -> impl Iterator<Item = (&'q str, Node<'tree>)> + '_ {
        self.captures.iter().copied()
    }
}

/// The compiled patterns of one category.
#[derive(Default)]
pub struct CategoryQuery {
    patterns: Vec<Query>,
}

impl CategoryQuery {
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Run every pattern under `node`.
    pub fn hits<'q, 'tree>(&'q self, node: Node<'tree>, source: &[u8]) -> Vec<QueryHit<'q, 'tree>> {
        let mut hits = Vec::new();
        for query in &self.patterns {
            let names = query.capture_names();
            let mut cursor = QueryCursor::new();
            let mut matches = cursor.matches(query, node, source);
            while let Some(m) = matches.next() {
                let captures = m
                    .captures
                    .iter()
                    .map(|c| (names[c.index as usize], c.node))
                    .collect();
                hits.push(QueryHit { captures });
            }
        }
        hits
    }
}

/// The four compiled categories plus any compile failures.
pub struct QuerySet {
    language: &'static str,
    functions: CategoryQuery,
    types: CategoryQuery,
    imports: CategoryQuery,
    calls: CategoryQuery,
    failures: Vec<(QueryCategory, String)>,
}

impl QuerySet {
    /// Compile all patterns against `grammar`, recording failures.
    pub fn compile(
        grammar: &tree_sitter::Language,
        language: &'static str,
        sources: &QuerySources,
    ) -> Self {
        let mut failures = Vec::new();
        let mut compile = |category: QueryCategory| {
            let mut compiled = CategoryQuery::default();
            for source in sources.get(category) {
                match Query::new(grammar, source) {
                    Ok(query) => compiled.patterns.push(query),
                    Err(e) => {
                        warn!(language, %category, error = %e, "query pattern rejected");
                        failures.push((category, e.to_string()));
                    }
                }
            }
            compiled
        };

        let functions = compile(QueryCategory::Functions);
        let types = compile(QueryCategory::Types);
        let imports = compile(QueryCategory::Imports);
        let calls = compile(QueryCategory::Calls);

        Self {
            language,
            functions,
            types,
            imports,
            calls,
            failures,
        }
    }

    pub fn get(&self, category: QueryCategory) -> &CategoryQuery {
        match category {
            QueryCategory::Functions => &self.functions,
            QueryCategory::Types => &self.types,
            QueryCategory::Imports => &self.imports,
            QueryCategory::Calls => &self.calls,
        }
    }

    pub fn failures(&self) -> &[(QueryCategory, String)] {
        &self.failures
    }

    /// Whether any pattern of `category` failed to compile.
    pub fn category_failed(&self, category: QueryCategory) -> bool {
        self.failures.iter().any(|(c, _)| *c == category)
    }

    /// Compile failures as pipeline errors, one per rejected pattern.
    pub fn failure_errors(&self) -> Vec<AnalysisError> {
        self.failures
            .iter()
            .map(|(category, message)| AnalysisError::QueryFailure {
                language: self.language,
                category: *category,
                message: message.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BROKEN: QuerySources = QuerySources {
        functions: &["(function_definition name: (identifier) @name) @definition"],
        types: &["(no_such_node) @definition"],
        imports: &[],
        calls: &["(call function: (_) @callee) @call"],
    };

    #[test]
    fn test_bad_pattern_degrades_only_its_category() {
        let grammar: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        let set = QuerySet::compile(&grammar, "python", &BROKEN);

        assert!(!set.get(QueryCategory::Functions).is_empty());
        assert!(set.get(QueryCategory::Types).is_empty());
        assert!(set.category_failed(QueryCategory::Types));
        assert!(!set.category_failed(QueryCategory::Calls));

        // Absent is not a failure.
        assert!(set.get(QueryCategory::Imports).is_empty());
        assert!(!set.category_failed(QueryCategory::Imports));

        let errors = set.failure_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].stage(), "extract");
    }

    #[test]
    fn test_hits_flatten_captures() {
        let grammar: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        let set = QuerySet::compile(&grammar, "python", &BROKEN);

        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&grammar).unwrap();
        let source = b"def alpha(x):\n    beta(x)\n";
        let tree = parser.parse(source, None).unwrap();

        let hits = set
            .get(QueryCategory::Functions)
            .hits(tree.root_node(), source);
        assert_eq!(hits.len(), 1);
        let name = hits[0].get("name").unwrap();
        assert_eq!(name.utf8_text(source).unwrap(), "alpha");
        assert!(hits[0].get("missing").is_none());
    }
}
