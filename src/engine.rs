//! Per-file pipeline: parse, extract, graph, resolve, enrich, assemble.
//!
//! Every entry point returns an `AnalysisRecord`. Stage failures are
//! recorded as diagnostics and reflected in `analysis_method`; they never
//! escape as errors or panics.

use std::any::Any;
use std::fs;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{self, EngineConfig};
use crate::enrich::{enricher_for, insights};
use crate::error::AnalysisError;
use crate::extract::{extract, StructuralFacts};
use crate::grammar::grammar_for;
use crate::graph::{GraphBuilder, SemanticGraph};
use crate::language::Language;
use crate::model::{AnalysisMethod, AnalysisRecord, Diagnostic};
use crate::parse::parse;
use crate::resolve::CrossFileResolver;

/// Analysis engine bound to one repository checkout.
pub struct Engine {
    root: PathBuf,
    config: EngineConfig,
}

impl Engine {
    /// Engine with the default configuration.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self::with_config(root, EngineConfig::default())
    }

    pub fn with_config<P: AsRef<Path>>(root: P, config: EngineConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze one file given relative to the repository root.
    pub fn analyze_file(&self, rel_path: &str) -> AnalysisRecord {
        let Some(language) = Language::from_path(rel_path) else {
            debug!(file = rel_path, "unsupported extension, skipping");
            return AnalysisRecord::empty(rel_path, None, AnalysisMethod::NoOp);
        };
        if self.config.is_path_excluded(Path::new(rel_path)) {
            debug!(file = rel_path, "excluded by configuration");
            return AnalysisRecord::empty(rel_path, Some(language), AnalysisMethod::NoOp);
        }

        let resolver = CrossFileResolver::new(&self.root, &self.config);
        // Only files inside the root are read.
        let Some(located) = resolver.locate_source_file(Path::new(rel_path)) else {
            let err = AnalysisError::Io {
                path: PathBuf::from(rel_path),
                source: io::Error::new(
                    io::ErrorKind::NotFound,
                    "no such file under the repository root",
                ),
            };
            return self.failed(rel_path, language, &err);
        };

        let source = match fs::read(self.root.join(&located)) {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = AnalysisError::Io {
                    path: PathBuf::from(rel_path),
                    source: e,
                };
                return self.failed(rel_path, language, &err);
            }
        };

        let importer = located.to_string_lossy().replace('\\', "/");
        let parsed = match parse(rel_path, &source, language, self.config.parse_timeout()) {
            Ok(parsed) => parsed,
            Err(err) => return self.failed(rel_path, language, &err),
        };

        let grammar = grammar_for(language);
        let mut record = AnalysisRecord::empty(rel_path, Some(language), AnalysisMethod::Full);

        // Structural facts
        let facts = match catch_unwind(AssertUnwindSafe(|| extract(&parsed, grammar))) {
            Ok(facts) => facts,
            Err(panic) => {
                let reason = panic_message(panic);
                warn!(file = rel_path, %reason, "structural extraction panicked");
                record.diagnostics.push(Diagnostic::new("extract", reason));
                StructuralFacts::default()
            }
        };
        record
            .diagnostics
            .extend(facts.failures.iter().map(Diagnostic::from));

        // Semantic graph
        let builder = GraphBuilder::new(grammar, rel_path)
            .with_max_scope_depth(self.config.max_scope_depth);
        let built = catch_unwind(AssertUnwindSafe(|| builder.build(&parsed)));
        let (graph, graph_failed) = match built {
            Ok(Ok(graph)) => (graph, false),
            Ok(Err(fault)) => {
                record.diagnostics.push(Diagnostic::new("graph", fault.reason));
                (fault.partial, true)
            }
            Err(panic) => {
                let reason = panic_message(panic);
                warn!(file = rel_path, %reason, "semantic graph panicked");
                record.diagnostics.push(Diagnostic::new("graph", reason));
                (SemanticGraph::new(rel_path), true)
            }
        };

        // Cross-file dependencies
        let imports = if facts.imports_degraded() && !graph_failed {
            graph.import_records()
        } else {
            facts.imports.clone()
        };
        record.dependencies = resolver.resolve(&importer, language, &imports, &facts.calls);

        // Enrichment
        let enriched = self.enrich(&parsed, language, &mut record);

        record.functions = facts.functions;
        record.types = facts.types;
        record.imports = facts.imports;
        record.calls = facts.calls;
        record.graph = graph;
        record.analysis_method = if graph_failed {
            AnalysisMethod::StructuralOnly
        } else if enriched {
            AnalysisMethod::Full
        } else {
            AnalysisMethod::GraphOnly
        };

        info!(
            file = rel_path,
            method = %record.analysis_method,
            functions = record.functions.len(),
            dependencies = record.dependencies.len(),
            "file analyzed"
        );
        record
    }

    /// Run the enricher into `record`. Returns whether it succeeded.
    fn enrich(
        &self,
        parsed: &crate::parse::ParsedSource,
        language: Language,
        record: &mut AnalysisRecord,
    ) -> bool {
        if !self.config.enrichment {
            record
                .diagnostics
                .push(Diagnostic::new("enrich", "enrichment disabled by configuration"));
            return false;
        }
        let Some(enricher) = enricher_for(language) else {
            record.diagnostics.push(Diagnostic::new(
                "enrich",
                format!("no enricher for {}", language),
            ));
            return false;
        };

        match catch_unwind(AssertUnwindSafe(|| enricher.enrich(parsed))) {
            Ok(Ok(enrichment)) => {
                record.insights = insights(&enrichment, self.config.high_complexity_threshold);
                record.complexity = enrichment.complexity;
                record.security_findings = enrichment.security_findings;
                true
            }
            Ok(Err(err)) => {
                warn!(file = %record.file_path, error = %err, "enrichment degraded");
                record.diagnostics.push(Diagnostic::from(&err));
                false
            }
            Err(panic) => {
                let reason = panic_message(panic);
                warn!(file = %record.file_path, %reason, "enrichment panicked");
                record.diagnostics.push(Diagnostic::new("enrich", reason));
                false
            }
        }
    }

    fn failed(&self, rel_path: &str, language: Language, err: &AnalysisError) -> AnalysisRecord {
        warn!(file = rel_path, error = %err, "analysis failed");
        let mut record = AnalysisRecord::empty(rel_path, Some(language), AnalysisMethod::None);
        record.diagnostics.push(Diagnostic::from(err));
        record
    }

    /// Analyze several files in parallel.
    ///
    /// Uses rayon for parallel processing. Results are sorted by path.
    pub fn analyze_files<S: AsRef<str> + Sync>(&self, paths: &[S]) -> Vec<AnalysisRecord> {
        use rayon::prelude::*;

        let mut records: Vec<AnalysisRecord> = paths
            .par_iter()
            .map(|p| self.analyze_file(p.as_ref()))
            .collect();

        // Sort by path for deterministic ordering
        records.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        records
    }
}

/// Analyze one file with the configuration discovered at `repo_root`
/// (defaults when there is none or it does not load or validate).
pub fn analyze_file<P: AsRef<Path>>(repo_root: P, rel_path: &str) -> AnalysisRecord {
    let root = repo_root.as_ref();
    let config = EngineConfig::load_for_root(root)
        .and_then(|loaded| config::validate(&loaded).map(|_| loaded))
        .unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unusable configuration");
            EngineConfig::default()
        });
    Engine::with_config(root, config).analyze_file(rel_path)
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_method_none() {
        let dir = TempDir::new().unwrap();
        let record = Engine::new(dir.path()).analyze_file("gone.py");
        assert_eq!(record.analysis_method, AnalysisMethod::None);
        assert_eq!(record.diagnostics[0].stage, "io");
    }

    #[test]
    fn test_excluded_path_is_no_op() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("vendor")).unwrap();
        fs::write(dir.path().join("vendor/lib.py"), "def f():\n    pass\n").unwrap();

        let config = EngineConfig {
            excluded_paths: vec!["vendor/**".to_string()],
            ..EngineConfig::default()
        };
        let record = Engine::with_config(dir.path(), config).analyze_file("vendor/lib.py");
        assert_eq!(record.analysis_method, AnalysisMethod::NoOp);
        assert!(record.functions.is_empty());
    }

    #[test]
    fn test_enrichment_disabled_is_graph_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def f():\n    return 1\n").unwrap();

        let config = EngineConfig {
            enrichment: false,
            ..EngineConfig::default()
        };
        let record = Engine::with_config(dir.path(), config).analyze_file("a.py");
        assert_eq!(record.analysis_method, AnalysisMethod::GraphOnly);
        assert_eq!(record.functions.len(), 1);
        assert!(record.complexity.is_empty());
    }

    #[test]
    fn test_panic_message() {
        let panic = catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(panic), "panic: boom");
    }
}
