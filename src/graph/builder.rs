//! Pre-order walk that turns a syntax tree into a `SemanticGraph`.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};
use tree_sitter::Node;

use super::{file_id, node_id, EdgeKind, NodeKind, ScopeStack, SemanticGraph, SemanticNode};
use crate::extract::{definition_name, imports_of};
use crate::grammar::LanguageGrammar;
use crate::parse::ParsedSource;

pub const DEFAULT_MAX_SCOPE_DEPTH: usize = 512;

/// Graph construction stopped early. `partial` holds what was built.
#[derive(Debug)]
pub struct GraphFault {
    pub reason: String,
    pub partial: SemanticGraph,
}

impl fmt::Display for GraphFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph construction aborted: {}", self.reason)
    }
}

impl std::error::Error for GraphFault {}

pub struct GraphBuilder<'g> {
    grammar: &'g dyn LanguageGrammar,
    file_path: String,
    max_scope_depth: usize,
}

impl<'g> GraphBuilder<'g> {
    pub fn new(grammar: &'g dyn LanguageGrammar, file_path: &str) -> Self {
        Self {
            grammar,
            file_path: file_path.to_string(),
            max_scope_depth: DEFAULT_MAX_SCOPE_DEPTH,
        }
    }

    /// Abort once definitions nest deeper than `depth`.
    pub fn with_max_scope_depth(mut self, depth: usize) -> Self {
        self.max_scope_depth = depth;
        self
    }

    /// Walk the whole tree.
    ///
    /// Each node is visited with the scope stack of its parent; entering
    /// a function or type pushes that definition for the node's children
    /// only.
    pub fn build(&self, parsed: &ParsedSource) -> Result<SemanticGraph, GraphFault> {
        let mut graph = SemanticGraph::new(&self.file_path);
        let anchor = file_id(&self.file_path);
        let root = parsed.root();
        graph.add_node(SemanticNode {
            id: anchor.clone(),
            kind: NodeKind::File,
            name: self.file_path.clone(),
            file_path: self.file_path.clone(),
            line: 1,
            start_byte: root.start_byte(),
            end_byte: root.end_byte(),
            code: None,
            parameters: None,
            metadata: BTreeMap::new(),
        });

        let mut pending: Vec<(Node, ScopeStack)> = vec![(root, ScopeStack::new())];
        while let Some((node, scope)) = pending.pop() {
            let inner = match self.visit(node, &scope, parsed, &mut graph, &anchor) {
                Ok(inner) => inner,
                Err(reason) => {
                    warn!(file = %self.file_path, %reason, "semantic graph aborted");
                    return Err(GraphFault {
                        reason,
                        partial: graph,
                    });
                }
            };

            let mut cursor = node.walk();
            let children: Vec<Node> = node.children(&mut cursor).collect();
            pending.extend(children.into_iter().rev().map(|child| (child, inner.clone())));
        }

        debug!(
            file = %self.file_path,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "semantic graph built"
        );
        Ok(graph)
    }

    /// Emit nodes and edges for one tree node; returns the scope for its children.
    fn visit(
        &self,
        node: Node,
        scope: &ScopeStack,
        parsed: &ParsedSource,
        graph: &mut SemanticGraph,
        anchor: &str,
    ) -> Result<ScopeStack, String> {
        let kind = node.kind();
        let line = node.start_position().row + 1;
        let mut inner = scope.clone();

        let definition = if self.grammar.function_kinds().contains(&kind) {
            Some(NodeKind::Function)
        } else if self.grammar.type_kinds().contains(&kind) {
            Some(NodeKind::Type)
        } else {
            None
        };

        if let Some(def_kind) = definition {
            let name = definition_name(parsed, self.grammar, node, None);
            let id = node_id(&self.file_path, def_kind, &name);
            let parameters = match def_kind {
                NodeKind::Function => self.grammar.parameters(node, parsed),
                _ => None,
            };
            graph.add_node(SemanticNode {
                id: id.clone(),
                kind: def_kind,
                name,
                file_path: self.file_path.clone(),
                line,
                start_byte: node.start_byte(),
                end_byte: node.end_byte(),
                code: Some(parsed.text(node).into_owned()),
                parameters,
                metadata: self
                    .grammar
                    .definition_metadata(node, parsed)
                    .into_iter()
                    .collect(),
            });
            if let Some(parent) = scope.top() {
                graph.add_edge(parent, &id, EdgeKind::Contains, line);
            }
            inner = scope.push(id);
            if inner.depth() > self.max_scope_depth {
                return Err(format!(
                    "definitions nested deeper than {} at line {}",
                    self.max_scope_depth, line
                ));
            }
        }

        if self.grammar.import_kinds().contains(&kind) {
            for import in imports_of(parsed, self.grammar, node) {
                let id = node_id(&self.file_path, NodeKind::Import, &import.module);
                let mut metadata = BTreeMap::new();
                metadata.insert("kind".to_string(), import.kind.as_str().to_string());
                graph.add_node(SemanticNode {
                    id: id.clone(),
                    kind: NodeKind::Import,
                    name: import.module.clone(),
                    file_path: self.file_path.clone(),
                    line: import.line,
                    start_byte: node.start_byte(),
                    end_byte: node.end_byte(),
                    code: None,
                    parameters: None,
                    metadata,
                });
                match scope.top() {
                    Some(owner) => graph.add_edge(owner, &id, EdgeKind::UsesImport, import.line),
                    None => graph.add_edge(anchor, &id, EdgeKind::Imports, import.line),
                };
            }
        }

        if self.grammar.call_kinds().contains(&kind) {
            // Module-level calls have no caller node.
            if let Some(caller) = scope.top() {
                if let Some(callee) = self.grammar.callee_name(node, parsed) {
                    let id = node_id(&self.file_path, NodeKind::CallTarget, &callee);
                    graph.add_node(SemanticNode {
                        id: id.clone(),
                        kind: NodeKind::CallTarget,
                        name: callee,
                        file_path: self.file_path.clone(),
                        line,
                        start_byte: node.start_byte(),
                        end_byte: node.end_byte(),
                        code: None,
                        parameters: None,
                        metadata: BTreeMap::new(),
                    });
                    graph.add_edge(caller, &id, EdgeKind::Calls, line);
                }
            }
        }

        Ok(inner)
    }
}
