//! Engine configuration.
//!
//! Loaded from YAML; every field has a default, so an empty file (or no
//! file at all) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::graph::DEFAULT_MAX_SCOPE_DEPTH;

/// File names looked up at the repository root, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["semgraph.yaml", ".semgraph.yaml"];

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum characters of a resolved dependency's source kept as snippet.
    pub snippet_budget: usize,
    /// Extra directories (relative to the root) tried before each import candidate.
    pub project_prefixes: Vec<String>,
    /// Glob patterns for paths to skip entirely (e.g. "**/vendor/**").
    pub excluded_paths: Vec<String>,
    /// Whether to run complexity and security enrichment.
    pub enrichment: bool,
    /// Complexity above which a function is reported in insights.
    pub high_complexity_threshold: u32,
    /// Definition nesting depth at which graph construction gives up.
    pub max_scope_depth: usize,
    /// Per-file parse time limit in milliseconds.
    pub parse_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snippet_budget: 1000,
            project_prefixes: Vec::new(),
            excluded_paths: Vec::new(),
            enrichment: true,
            high_complexity_threshold: 10,
            max_scope_depth: DEFAULT_MAX_SCOPE_DEPTH,
            parse_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to unit, not a map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: EngineConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Find a configuration file at the repository root.
    pub fn discover(root: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
    }

    /// Load the discovered configuration, or defaults when there is none.
    pub fn load_for_root(root: &Path) -> anyhow::Result<Self> {
        match Self::discover(root) {
            Some(path) => Self::parse_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    /// Uses globset for matching, which supports `**` for recursive directory matching.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();

        for pattern in &self.excluded_paths {
            if let Ok(glob) = globset::Glob::new(pattern) {
                let matcher = glob.compile_matcher();
                if matcher.is_match(&*path_str) {
                    return true;
                }
            }
        }
        false
    }

    pub fn parse_timeout(&self) -> Option<Duration> {
        self.parse_timeout_ms.map(Duration::from_millis)
    }
}

/// Validate a configuration for correctness.
pub fn validate(config: &EngineConfig) -> anyhow::Result<()> {
    if config.snippet_budget == 0 {
        anyhow::bail!("snippet_budget must be greater than zero");
    }
    if config.max_scope_depth == 0 {
        anyhow::bail!("max_scope_depth must be greater than zero");
    }
    if config.parse_timeout_ms == Some(0) {
        anyhow::bail!("parse_timeout_ms must be greater than zero when set");
    }

    for pattern in &config.excluded_paths {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
    }

    for prefix in &config.project_prefixes {
        if Path::new(prefix).is_absolute() || prefix.split('/').any(|s| s == "..") {
            anyhow::bail!("project prefix {:?} must stay inside the repository", prefix);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
snippet_budget: 200
project_prefixes:
  - backend
excluded_paths:
  - "**/vendor/**"
enrichment: false
"#;
        let config = EngineConfig::parse_str(yaml).unwrap();
        assert_eq!(config.snippet_budget, 200);
        assert_eq!(config.project_prefixes, vec!["backend"]);
        assert!(!config.enrichment);
        // Unset fields keep their defaults.
        assert_eq!(config.high_complexity_threshold, 10);
        assert_eq!(config.max_scope_depth, DEFAULT_MAX_SCOPE_DEPTH);
        assert!(config.parse_timeout().is_none());
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = EngineConfig::parse_str("  \n").unwrap();
        assert_eq!(config.snippet_budget, 1000);
        assert!(config.enrichment);
    }

    #[test]
    fn test_excluded_paths() {
        let config = EngineConfig {
            excluded_paths: vec!["**/vendor/**".to_string(), "*.gen.go".to_string()],
            ..EngineConfig::default()
        };
        assert!(config.is_path_excluded(Path::new("third/vendor/lib/a.go")));
        assert!(config.is_path_excluded(Path::new("api.gen.go")));
        assert!(!config.is_path_excluded(Path::new("cmd/main.go")));
    }

    #[test]
    fn test_validate() {
        assert!(validate(&EngineConfig::default()).is_ok());

        let bad_glob = EngineConfig {
            excluded_paths: vec!["[".to_string()],
            ..EngineConfig::default()
        };
        assert!(validate(&bad_glob).is_err());

        let zero_budget = EngineConfig {
            snippet_budget: 0,
            ..EngineConfig::default()
        };
        assert!(validate(&zero_budget).is_err());

        let escaping = EngineConfig {
            project_prefixes: vec!["../other".to_string()],
            ..EngineConfig::default()
        };
        assert!(validate(&escaping).is_err());
    }

    #[test]
    fn test_discover() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(EngineConfig::discover(dir.path()).is_none());

        fs::write(dir.path().join(".semgraph.yaml"), "snippet_budget: 10\n").unwrap();
        let found = EngineConfig::discover(dir.path()).unwrap();
        assert!(found.ends_with(".semgraph.yaml"));
        assert_eq!(EngineConfig::load_for_root(dir.path()).unwrap().snippet_budget, 10);
    }
}
