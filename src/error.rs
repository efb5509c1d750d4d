//! Error taxonomy for the analysis pipeline.
//!
//! Only `ParseFailure` and `Io` are fatal, and only for the file being
//! analyzed. Everything else degrades a single stage or category.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::QueryCategory;

/// Errors raised inside the engine. None of them escape `analyze_file`.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Extension or language identifier outside the supported table.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The grammar produced no tree for the byte stream (or timed out).
    #[error("failed to parse {path}: {reason}")]
    ParseFailure { path: String, reason: String },

    /// A structural query could not be compiled or run for a language.
    #[error("{category} query failed for {language}: {message}")]
    QueryFailure {
        language: &'static str,
        category: QueryCategory,
        message: String,
    },

    /// The deep per-language enrichment pass could not complete.
    #[error("enrichment failed for {path}: {reason}")]
    EnrichmentFailure { path: String, reason: String },

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AnalysisError {
    /// Short stage label used in diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            AnalysisError::UnsupportedLanguage(_) => "language",
            AnalysisError::ParseFailure { .. } => "parse",
            AnalysisError::QueryFailure { .. } => "extract",
            AnalysisError::EnrichmentFailure { .. } => "enrich",
            AnalysisError::Io { .. } => "io",
        }
    }
}
