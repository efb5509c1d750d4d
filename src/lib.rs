//! semgraph - multi-language semantic graph engine.
//!
//! For one source file of a repository, semgraph produces an
//! [`AnalysisRecord`]: the file's definitions, imports and calls, a
//! per-file semantic graph, the imports resolved against the repository
//! (internal files come with their source), cyclomatic complexity per
//! function, and heuristic security findings.
//!
//! # Architecture
//!
//! The codebase uses tree-sitter for every syntactic step:
//!
//! - `language`: supported languages and extension detection
//! - `parse`: tree-sitter parsing with an optional time limit
//! - `grammar`: per-language query sets and import resolution rules
//! - `extract`: structural facts (functions, types, imports, calls)
//! - `graph`: the per-file semantic graph and its builder
//! - `resolve`: cross-file import resolution
//! - `enrich`: complexity scores and security findings
//! - `engine`: the per-file pipeline that ties the stages together
//! - `config`: YAML engine configuration
//! - `report`: output formatting (pretty, JSON, markdown)
//!
//! Every stage degrades independently: a failure lowers the record's
//! [`AnalysisMethod`] and leaves a diagnostic, it never aborts the file.
//!
//! # Adding a New Language
//!
//! See `src/grammar/` for examples. Implement the `LanguageGrammar`
//! trait, register it in `grammar/mod.rs`, and add an `EnrichmentRules`
//! table in `enrich/rules.rs`.

pub mod cli;
pub mod config;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod grammar;
pub mod graph;
pub mod language;
pub mod logging;
pub mod model;
pub mod parse;
pub mod report;
pub mod resolve;

pub use config::EngineConfig;
pub use engine::{analyze_file, Engine};
pub use enrich::{enricher_for, Enricher, Enrichment};
pub use error::AnalysisError;
pub use extract::{extract, StructuralFacts};
pub use grammar::{grammar_for, register_grammars, LanguageGrammar};
pub use graph::{EdgeKind, GraphBuilder, NodeKind, SemanticGraph, SemanticNode};
pub use language::Language;
pub use model::{
    AnalysisMethod, AnalysisRecord, CallRecord, Classification, DefinitionKind,
    DefinitionRecord, DependencyRecord, Diagnostic, ImportKind, ImportRecord, Insight,
    SecurityCategory, SecurityFinding, Severity,
};
pub use parse::{parse, ParsedSource};
pub use resolve::CrossFileResolver;
