//! Cross-file resolution of imports to files inside the repository.
//!
//! Resolution only reads the filesystem. An import that matches no file
//! is classified `external`; that is an outcome, not an error.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::EngineConfig;
use crate::grammar::{grammar_for, Candidate, ImportSite, LanguageGrammar};
use crate::language::Language;
use crate::model::{CallRecord, Classification, DependencyRecord, ImportRecord};

/// Resolves one file's imports against a repository checkout.
pub struct CrossFileResolver<'c> {
    root: PathBuf,
    canonical_root: Option<PathBuf>,
    config: &'c EngineConfig,
}

impl<'c> CrossFileResolver<'c> {
    pub fn new(root: impl Into<PathBuf>, config: &'c EngineConfig) -> Self {
        let root = root.into();
        let canonical_root = root.canonicalize().ok();
        Self {
            root,
            canonical_root,
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// One `DependencyRecord` per import, in import order.
    pub fn resolve(
        &self,
        file_path: &str,
        language: Language,
        imports: &[ImportRecord],
        calls: &[CallRecord],
    ) -> Vec<DependencyRecord> {
        let grammar = grammar_for(language);
        let importer = Path::new(file_path);
        let go_module = match language {
            Language::Go => self.go_module(importer),
            _ => None,
        };
        let site = ImportSite {
            importer,
            go_module: go_module.as_deref(),
        };

        imports
            .iter()
            .map(|import| self.resolve_import(grammar, &site, import, calls))
            .collect()
    }

    fn resolve_import(
        &self,
        grammar: &dyn LanguageGrammar,
        site: &ImportSite,
        import: &ImportRecord,
        calls: &[CallRecord],
    ) -> DependencyRecord {
        let mut record = DependencyRecord::external(&import.module, &import.module, import.line);
        record.referenced_by = referencing_calls(grammar, import, calls);

        let extension = grammar.language().extension();
        let found = grammar
            .module_candidates(&import.module, site)
            .into_iter()
            .find_map(|candidate| self.locate_candidate(&candidate, site.importer, extension));

        let Some(relative) = found else {
            debug!(module = %import.module, "import is external");
            return record;
        };

        let bytes = match fs::read(self.root.join(&relative)) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(
                    module = %import.module,
                    error = %e,
                    "candidate unreadable, treating as external"
                );
                return record;
            }
        };
        let source = String::from_utf8_lossy(&bytes).into_owned();

        debug!(module = %import.module, target = %relative.display(), "import resolved");
        record.classification = Classification::Internal;
        record.resolved_module = module_path_of(&relative);
        record.target_path = Some(path_string(&relative));
        record.line_count = source.lines().count();
        record.byte_size = bytes.len() as u64;
        record.snippet = Some(source.chars().take(self.config.snippet_budget).collect());
        record.source = Some(source);
        record
    }

    /// Find the first existing file for a candidate, trying each prefix variant.
    ///
    /// Returns the path relative to the root.
    fn locate_candidate(
        &self,
        candidate: &Candidate,
        importer: &Path,
        ext: &str,
    ) -> Option<PathBuf> {
        for variant in self.variants(candidate.path(), importer) {
            let found = match candidate {
                Candidate::File(_) => self.existing_file(&variant),
                Candidate::PackageDir(_) => self.package_file(&variant, ext),
            };
            if found.is_some() {
                return found;
            }
        }
        None
    }

    /// Locate the analyzed file itself, tolerating a leading project
    /// directory that the checkout does not have.
    pub fn locate_source_file(&self, rel: &Path) -> Option<PathBuf> {
        self.existing_file(rel)
            .or_else(|| strip_leading(rel).and_then(|stripped| self.existing_file(&stripped)))
    }

    /// `path` under every prefix worth trying, most specific first.
    fn variants(&self, path: &Path, importer: &Path) -> Vec<PathBuf> {
        let mut variants = vec![path.to_path_buf()];

        let importer_dir = importer.parent().unwrap_or(Path::new(""));
        for ancestor in importer_dir.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                variants.push(ancestor.join(path));
            }
        }
        for prefix in &self.config.project_prefixes {
            variants.push(Path::new(prefix).join(path));
        }
        if let Some(stripped) = strip_leading(path) {
            variants.push(stripped);
        }

        let mut seen = HashSet::new();
        variants.retain(|v| seen.insert(v.clone()));
        variants
    }

    fn existing_file(&self, rel: &Path) -> Option<PathBuf> {
        if rel.as_os_str().is_empty() || !is_plain_relative(rel) {
            return None;
        }
        let full = self.root.join(rel);
        (full.is_file() && self.inside_root(&full)).then(|| rel.to_path_buf())
    }

    /// First non-test source file directly inside a package directory.
    fn package_file(&self, rel: &Path, ext: &str) -> Option<PathBuf> {
        if !is_plain_relative(rel) {
            return None;
        }
        let dir = self.root.join(rel);
        if !dir.is_dir() || !self.inside_root(&dir) {
            return None;
        }
        let test_suffix = format!("_test.{}", ext);
        WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .find(|name| {
                Path::new(name).extension().and_then(|e| e.to_str()) == Some(ext)
                    && !name.ends_with(&test_suffix)
            })
            .map(|name| rel.join(name))
    }

    /// Reject paths that leave the root through symlinks.
    fn inside_root(&self, full: &Path) -> bool {
        match (&self.canonical_root, full.canonicalize()) {
            (Some(root), Ok(path)) => path.starts_with(root),
            _ => false,
        }
    }

    /// Module path from the nearest `go.mod` above the importing file.
    fn go_module(&self, importer: &Path) -> Option<String> {
        let dir = importer.parent().unwrap_or(Path::new(""));
        dir.ancestors().find_map(|ancestor| {
            let content = fs::read_to_string(self.root.join(ancestor).join("go.mod")).ok()?;
            content.lines().find_map(|line| {
                line.trim()
                    .strip_prefix("module ")
                    .map(|m| m.trim().trim_matches('"').to_string())
            })
        })
    }
}

/// Call targets that go through the import's local binding.
fn referencing_calls(
    grammar: &dyn LanguageGrammar,
    import: &ImportRecord,
    calls: &[CallRecord],
) -> Vec<String> {
    let Some(binding) = grammar.binding_name(&import.module, import.kind) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    calls
        .iter()
        .filter(|call| first_segment(&call.callee) == binding)
        .filter(|call| seen.insert(call.callee.as_str()))
        .map(|call| call.callee.clone())
        .collect()
}

fn first_segment(callee: &str) -> &str {
    let end = callee
        .find(|c| c == '.' || c == ':')
        .unwrap_or(callee.len());
    &callee[..end]
}

fn strip_leading(path: &Path) -> Option<PathBuf> {
    let mut components = path.components();
    components.next()?;
    let rest = components.as_path();
    (!rest.as_os_str().is_empty()).then(|| rest.to_path_buf())
}

fn is_plain_relative(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_)))
}

fn path_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// `pkg/util.py` -> `pkg/util`; package entry files name their directory.
fn module_path_of(path: &Path) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let dir = path.parent().unwrap_or(Path::new(""));
    let module = match stem {
        "__init__" | "index" | "mod" => dir.to_path_buf(),
        _ => dir.join(stem),
    };
    path_string(&module)
}
