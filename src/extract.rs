//! Structural extraction: definitions, imports and calls via queries.
//!
//! Each category is independent. A category whose patterns failed to
//! compile still returns whatever the surviving patterns matched, and the
//! failures come back as `QueryFailure`s for the caller to record.

use std::collections::HashSet;

use tracing::{debug, warn};
use tree_sitter::Node;

use crate::error::AnalysisError;
use crate::grammar::{anonymous_name, LanguageGrammar};
use crate::model::{
    CallRecord, DefinitionKind, DefinitionRecord, ImportRecord, QueryCategory, Span,
};
use crate::parse::ParsedSource;

/// Flat structural facts for one file, in source order.
#[derive(Debug, Default)]
pub struct StructuralFacts {
    pub functions: Vec<DefinitionRecord>,
    pub types: Vec<DefinitionRecord>,
    pub imports: Vec<ImportRecord>,
    pub calls: Vec<CallRecord>,
    /// Query compile failures, one per rejected pattern.
    pub failures: Vec<AnalysisError>,
}

impl StructuralFacts {
    /// Whether any imports pattern was rejected.
    pub fn imports_degraded(&self) -> bool {
        self.failures.iter().any(|f| {
            matches!(
                f,
                AnalysisError::QueryFailure {
                    category: QueryCategory::Imports,
                    ..
                }
            )
        })
    }
}

/// Run all four query categories over the whole tree.
pub fn extract(parsed: &ParsedSource, grammar: &dyn LanguageGrammar) -> StructuralFacts {
    let failures = grammar.queries().failure_errors();
    for failure in &failures {
        warn!(file = %parsed.path, error = %failure, "structural query degraded");
    }

    let facts = StructuralFacts {
        functions: definitions(parsed, grammar, DefinitionKind::Function),
        types: definitions(parsed, grammar, DefinitionKind::Type),
        imports: imports_under(parsed, grammar, parsed.root(), None),
        calls: calls(parsed, grammar),
        failures,
    };

    debug!(
        file = %parsed.path,
        functions = facts.functions.len(),
        types = facts.types.len(),
        imports = facts.imports.len(),
        calls = facts.calls.len(),
        "structural extraction complete"
    );
    facts
}

/// Build a definition record for `node`, naming it the same way the
/// graph builder does.
pub fn definition_record(
    parsed: &ParsedSource,
    grammar: &dyn LanguageGrammar,
    node: Node,
    kind: DefinitionKind,
    name_capture: Option<Node>,
) -> DefinitionRecord {
    let span = Span::from_node(node);
    let name = definition_name(parsed, grammar, node, name_capture);
    let parameters = match kind {
        DefinitionKind::Function => grammar.parameters(node, parsed),
        DefinitionKind::Type => None,
    };
    DefinitionRecord {
        kind,
        name,
        file_path: parsed.path.clone(),
        span,
        source: parsed.text(node).into_owned(),
        parameters,
    }
}

/// Name of a definition: the name capture, else the grammar's rule,
/// else `anonymous_at_line_N`.
pub fn definition_name(
    parsed: &ParsedSource,
    grammar: &dyn LanguageGrammar,
    node: Node,
    name_capture: Option<Node>,
) -> String {
    name_capture
        .map(|n| parsed.text(n).trim().to_string())
        .filter(|n| !n.is_empty())
        .or_else(|| grammar.definition_name(node, parsed))
        .unwrap_or_else(|| anonymous_name(node.start_position().row + 1))
}

fn definitions(
    parsed: &ParsedSource,
    grammar: &dyn LanguageGrammar,
    kind: DefinitionKind,
) -> Vec<DefinitionRecord> {
    let category = match kind {
        DefinitionKind::Function => QueryCategory::Functions,
        DefinitionKind::Type => QueryCategory::Types,
    };

    let mut seen = HashSet::new();
    let mut found: Vec<DefinitionRecord> = Vec::new();
    for hit in grammar
        .queries()
        .get(category)
        .hits(parsed.root(), &parsed.source)
    {
        let Some(node) = hit.get("definition") else {
            continue;
        };
        // Overlapping patterns may report the same node twice.
        if !seen.insert(node.id()) {
            continue;
        }
        found.push(definition_record(parsed, grammar, node, kind, hit.get("name")));
    }
    found.sort_by_key(|d| d.span.start_byte);
    found
}

/// Imports under `node`.
///
/// With `statement` set, only matches whose `@import` capture is that
/// exact node are kept, so a statement never reports imports nested in
/// its children.
pub fn imports_under(
    parsed: &ParsedSource,
    grammar: &dyn LanguageGrammar,
    node: Node,
    statement: Option<Node>,
) -> Vec<ImportRecord> {
    let mut keyed = Vec::new();
    let mut seen = HashSet::new();
    for hit in grammar
        .queries()
        .get(QueryCategory::Imports)
        .hits(node, &parsed.source)
    {
        if let Some(statement) = statement {
            if hit.get("import").map(|n| n.id()) != Some(statement.id()) {
                continue;
            }
        }
        for (capture, module_node) in hit.captures() {
            if capture != "module" && capture != "from_module" {
                continue;
            }
            if !seen.insert(module_node.id()) {
                continue;
            }
            let Some(module) = grammar.normalize_module(&parsed.text(module_node)) else {
                continue;
            };
            keyed.push((
                module_node.start_byte(),
                ImportRecord {
                    module,
                    line: module_node.start_position().row + 1,
                    kind: grammar.import_kind(capture),
                },
            ));
        }
    }
    keyed.sort_by_key(|(start, _)| *start);
    keyed.into_iter().map(|(_, record)| record).collect()
}

/// Imports named by one import statement node.
pub fn imports_of(
    parsed: &ParsedSource,
    grammar: &dyn LanguageGrammar,
    statement: Node,
) -> Vec<ImportRecord> {
    imports_under(parsed, grammar, statement, Some(statement))
}

fn calls(parsed: &ParsedSource, grammar: &dyn LanguageGrammar) -> Vec<CallRecord> {
    let mut seen = HashSet::new();
    let mut keyed = Vec::new();
    for hit in grammar
        .queries()
        .get(QueryCategory::Calls)
        .hits(parsed.root(), &parsed.source)
    {
        let Some(call) = hit.get("call") else {
            continue;
        };
        if !seen.insert(call.id()) {
            continue;
        }
        let Some(callee) = grammar.callee_name(call, parsed) else {
            continue;
        };
        keyed.push((
            call.start_byte(),
            CallRecord {
                callee,
                line: call.start_position().row + 1,
            },
        ));
    }
    keyed.sort_by_key(|(start, _)| *start);
    keyed.into_iter().map(|(_, record)| record).collect()
}
