//! Per-file semantic graph.
//!
//! Nodes are keyed by ids derived only from (file, kind, name), so two
//! analyses of the same bytes produce the same id set. Edges are directed
//! and may repeat between the same pair (one per occurrence).

mod builder;
mod scope;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

pub use builder::{GraphBuilder, GraphFault, DEFAULT_MAX_SCOPE_DEPTH};
pub use scope::ScopeStack;

use crate::model::{ImportKind, ImportRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Function,
    Type,
    Import,
    CallTarget,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Function => "function",
            NodeKind::Type => "type",
            NodeKind::Import => "import",
            NodeKind::CallTarget => "call_target",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Contains,
    Imports,
    UsesImport,
    Calls,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "contains",
            EdgeKind::Imports => "imports",
            EdgeKind::UsesImport => "uses_import",
            EdgeKind::Calls => "calls",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node id for the file anchor.
pub fn file_id(file: &str) -> String {
    format!("{}::file", file)
}

/// Node id for a definition, import or call target.
pub fn node_id(file: &str, kind: NodeKind, name: &str) -> String {
    match kind {
        NodeKind::File => file_id(file),
        NodeKind::Function => format!("{}::function::{}", file, name),
        NodeKind::Type => format!("{}::type::{}", file, name),
        NodeKind::Import => format!("{}::import::{}", file, name),
        NodeKind::CallTarget => format!("{}::call::{}", file, name),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticNode {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub file_path: String,
    /// 1-based line of the first occurrence.
    pub line: usize,
    pub start_byte: usize,
    pub end_byte: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticEdge {
    pub kind: EdgeKind,
    /// 1-based line of the occurrence that produced the edge.
    pub line: usize,
}

/// An edge with its endpoints resolved to ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeView<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub kind: EdgeKind,
    pub line: usize,
}

/// Node and edge counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub functions: usize,
    pub types: usize,
    pub imports: usize,
    pub call_targets: usize,
    pub edges_by_kind: BTreeMap<EdgeKind, usize>,
}

/// Directed graph of one file's definitions, imports and call targets.
#[derive(Debug, Clone)]
pub struct SemanticGraph {
    file_path: String,
    graph: DiGraph<SemanticNode, SemanticEdge>,
    index: HashMap<String, NodeIndex>,
}

impl SemanticGraph {
    /// An empty graph for `file_path`.
    pub fn new(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Insert `node` unless its id already exists. Returns the id's index.
    pub fn add_node(&mut self, node: SemanticNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node.id) {
            return idx;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        idx
    }

    /// Add an edge between two existing ids. Returns false if either is missing.
    pub fn add_edge(&mut self, source: &str, target: &str, kind: EdgeKind, line: usize) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&s), Some(&t)) => {
                self.graph.add_edge(s, t, SemanticEdge { kind, line });
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&SemanticNode> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Nodes in insertion (pre-order) order.
    pub fn nodes(&self) -> impl Iterator<Item = &SemanticNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> {
        self.graph.edge_references().map(move |e| EdgeView {
            source: self.graph[e.source()].id.as_str(),
            target: self.graph[e.target()].id.as_str(),
            kind: e.weight().kind,
            line: e.weight().line,
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Targets of `kind` edges leaving `id`, in insertion order, repeated
    /// once per parallel edge.
    pub fn outgoing(&self, id: &str, kind: EdgeKind) -> Vec<&SemanticNode> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        self.graph
            .edge_references()
            .filter(|e| e.source() == idx && e.weight().kind == kind)
            .map(|e| &self.graph[e.target()])
            .collect()
    }

    pub fn has_edge(&self, source: &str, target: &str, kind: EdgeKind) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&s), Some(&t)) => self
                .graph
                .edges_connecting(s, t)
                .any(|e| e.weight().kind == kind),
            _ => false,
        }
    }

    /// Nodes of one kind, in insertion order.
    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &SemanticNode> {
        self.nodes().filter(move |n| n.kind == kind)
    }

    /// Function name -> distinct callee names, in first-call order.
    pub fn function_dependencies(&self) -> BTreeMap<String, Vec<String>> {
        self.names_by_edge(NodeKind::Function, EdgeKind::Calls)
    }

    /// Definition name -> distinct module names used inside it.
    pub fn import_usage(&self) -> BTreeMap<String, Vec<String>> {
        let mut usage = self.names_by_edge(NodeKind::Function, EdgeKind::UsesImport);
        for (name, modules) in self.names_by_edge(NodeKind::Type, EdgeKind::UsesImport) {
            let entry = usage.entry(name).or_default();
            for module in modules {
                if !entry.contains(&module) {
                    entry.push(module);
                }
            }
        }
        usage
    }

    fn names_by_edge(&self, from: NodeKind, kind: EdgeKind) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for node in self.nodes_of(from) {
            let targets = self.outgoing(&node.id, kind);
            if targets.is_empty() {
                continue;
            }
            let entry = map.entry(node.name.clone()).or_default();
            for target in targets {
                if !entry.contains(&target.name) {
                    entry.push(target.name.clone());
                }
            }
        }
        map
    }

    /// Imports reconstructed from import nodes, one per occurrence edge.
    ///
    /// Used when the structural imports query is unavailable.
    pub fn import_records(&self) -> Vec<ImportRecord> {
        let mut records: Vec<ImportRecord> = self
            .edges()
            .filter(|e| matches!(e.kind, EdgeKind::Imports | EdgeKind::UsesImport))
            .filter_map(|e| self.node(e.target).map(|node| (node, e.line)))
            .map(|(node, line)| ImportRecord {
                module: node.name.clone(),
                line,
                kind: match node.metadata.get("kind").map(String::as_str) {
                    Some("from") => ImportKind::From,
                    _ => ImportKind::Direct,
                },
            })
            .collect();
        records.sort_by_key(|r| r.line);
        records
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            nodes: self.node_count(),
            edges: self.edge_count(),
            ..GraphStats::default()
        };
        for node in self.nodes() {
            match node.kind {
                NodeKind::Function => stats.functions += 1,
                NodeKind::Type => stats.types += 1,
                NodeKind::Import => stats.imports += 1,
                NodeKind::CallTarget => stats.call_targets += 1,
                NodeKind::File => {}
            }
        }
        for edge in self.graph.edge_weights() {
            *stats.edges_by_kind.entry(edge.kind).or_default() += 1;
        }
        stats
    }
}

impl Serialize for SemanticGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nodes: Vec<&SemanticNode> = self.nodes().collect();
        let edges: Vec<EdgeView> = self.edges().collect();
        let mut state = serializer.serialize_struct("SemanticGraph", 2)?;
        state.serialize_field("nodes", &nodes)?;
        state.serialize_field("edges", &edges)?;
        state.end()
    }
}
