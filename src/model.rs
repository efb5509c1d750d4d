//! Records produced by the analysis pipeline.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::SemanticGraph;
use crate::language::Language;

/// Source location span with byte offsets and line positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// End line (1-indexed).
    pub end_line: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: node.start_position().row + 1, // tree-sitter is 0-indexed
            end_line: node.end_position().row + 1,
        }
    }
}

/// The four structural query categories every grammar exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryCategory {
    Functions,
    Types,
    Imports,
    Calls,
}

impl QueryCategory {
    pub const ALL: [QueryCategory; 4] = [
        QueryCategory::Functions,
        QueryCategory::Types,
        QueryCategory::Imports,
        QueryCategory::Calls,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryCategory::Functions => "functions",
            QueryCategory::Types => "types",
            QueryCategory::Imports => "imports",
            QueryCategory::Calls => "calls",
        }
    }
}

impl fmt::Display for QueryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of a definition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Function,
    Type,
}

impl DefinitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionKind::Function => "function",
            DefinitionKind::Type => "type",
        }
    }
}

/// A function or type definition found in a file.
///
/// Duplicate names are legal: a file may define `foo` twice in
/// different scopes and both records are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionRecord {
    pub kind: DefinitionKind,
    pub name: String,
    pub file_path: String,
    #[serde(flatten)]
    pub span: Span,
    /// Verbatim source of the whole definition.
    pub source: String,
    /// Parameter list text (functions only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
}

impl DefinitionRecord {
    pub fn start_line(&self) -> usize {
        self.span.start_line
    }

    pub fn end_line(&self) -> usize {
        self.span.end_line
    }

    /// Number of source lines covered by the definition.
    pub fn line_count(&self) -> usize {
        self.span.end_line - self.span.start_line + 1
    }
}

/// How a module was brought in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    /// `import x`, `use x`, `require("x")`, Go import specs.
    Direct,
    /// `from x import y`.
    From,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Direct => "direct",
            ImportKind::From => "from",
        }
    }
}

/// One module named by an import statement, as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub module: String,
    pub line: usize,
    pub kind: ImportKind,
}

/// One call expression, keyed by the statically visible callee text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub callee: String,
    pub line: usize,
}

/// Whether an import resolved to a file inside the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Internal,
    External,
}

/// Cross-file context for one import.
///
/// External records carry the name only: no path, source or metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Module identifier as written in the import.
    pub import_name: String,
    /// Module path of the resolved file (`pkg/util`); the import name when external.
    pub resolved_module: String,
    pub line: usize,
    pub classification: Classification,
    /// Path of the resolved file, relative to the repository root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
    /// Full source of the resolved file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Source truncated to the display budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Line count of the untruncated source.
    pub line_count: usize,
    /// Byte size of the untruncated source.
    pub byte_size: u64,
    /// Call targets in the importing file that go through this import.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_by: Vec<String>,
}

impl DependencyRecord {
    /// Build a record for an import that matched no file.
    pub fn external(import_name: &str, resolved_module: &str, line: usize) -> Self {
        Self {
            import_name: import_name.to_string(),
            resolved_module: resolved_module.to_string(),
            line,
            classification: Classification::External,
            target_path: None,
            source: None,
            snippet: None,
            line_count: 0,
            byte_size: 0,
            referenced_by: Vec::new(),
        }
    }

    pub fn is_internal(&self) -> bool {
        self.classification == Classification::Internal
    }
}

/// Severity levels for security findings and insights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// Heuristic security finding category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityCategory {
    HardcodedSecret,
    DynamicEval,
}

impl SecurityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityCategory::HardcodedSecret => "hardcoded_secret",
            SecurityCategory::DynamicEval => "dynamic_eval",
        }
    }
}

/// A heuristic security finding. Not a soundness guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityFinding {
    pub category: SecurityCategory,
    pub line: usize,
    /// The literal (truncated) for secrets, the callee name for eval.
    pub value: String,
    pub severity: Severity,
}

/// High-level observation derived from enrichment results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    HighComplexityFunctions,
    SecurityConcerns,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
    pub severity: Severity,
}

/// Which stages contributed to an analysis record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMethod {
    /// Structural extraction, semantic graph and enrichment all succeeded.
    Full,
    /// Enrichment failed or is unavailable for the language.
    GraphOnly,
    /// The semantic graph failed; structural lists are authoritative.
    StructuralOnly,
    /// Unsupported extension or excluded path.
    NoOp,
    /// The file could not be read or parsed.
    None,
}

impl AnalysisMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMethod::Full => "full",
            AnalysisMethod::GraphOnly => "graph_only",
            AnalysisMethod::StructuralOnly => "structural_only",
            AnalysisMethod::NoOp => "no_op",
            AnalysisMethod::None => "none",
        }
    }
}

impl fmt::Display for AnalysisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a stage degraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub stage: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::error::AnalysisError> for Diagnostic {
    fn from(err: &crate::error::AnalysisError) -> Self {
        Diagnostic::new(err.stage(), err.to_string())
    }
}

/// Per-file analysis output consumed by the indexing and prompt-assembly
/// collaborators. Always produced, whatever failed along the way.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    pub file_path: String,
    pub language: Option<Language>,
    pub functions: Vec<DefinitionRecord>,
    pub types: Vec<DefinitionRecord>,
    pub imports: Vec<ImportRecord>,
    pub calls: Vec<CallRecord>,
    pub graph: SemanticGraph,
    pub dependencies: Vec<DependencyRecord>,
    pub complexity: BTreeMap<String, u32>,
    pub security_findings: Vec<SecurityFinding>,
    pub insights: Vec<Insight>,
    pub analysis_method: AnalysisMethod,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisRecord {
    /// An empty record for `file_path` with the given method.
    pub fn empty(file_path: &str, language: Option<Language>, method: AnalysisMethod) -> Self {
        Self {
            file_path: file_path.to_string(),
            language,
            functions: Vec::new(),
            types: Vec::new(),
            imports: Vec::new(),
            calls: Vec::new(),
            graph: SemanticGraph::new(file_path),
            dependencies: Vec::new(),
            complexity: BTreeMap::new(),
            security_findings: Vec::new(),
            insights: Vec::new(),
            analysis_method: method,
            diagnostics: Vec::new(),
        }
    }

    /// Find a function record by name (first match in source order).
    pub fn function(&self, name: &str) -> Option<&DefinitionRecord> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Internal dependencies only.
    pub fn internal_dependencies(&self) -> impl Iterator<Item = &DependencyRecord> {
        self.dependencies.iter().filter(|d| d.is_internal())
    }

    /// External module names only.
    pub fn external_dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(|d| !d.is_internal())
            .map(|d| d.import_name.as_str())
    }
}
