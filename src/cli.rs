//! Command-line interface for semgraph.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{self, EngineConfig};
use crate::engine::Engine;
use crate::grammar::{grammar_for, register_grammars};
use crate::language::Language;
use crate::model::AnalysisMethod;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Directories never entered when collecting files.
const SKIPPED_DIRS: &[&str] = &["node_modules", "vendor", "target", "__pycache__", "dist", "build"];

/// Multi-language semantic graph engine.
///
/// Builds a per-file semantic graph (definitions, imports, calls) for
/// Python, JavaScript, TypeScript, Go and Rust sources, resolves imports
/// against the repository, and reports complexity and security findings.
#[derive(Parser)]
#[command(name = "semgraph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze files of a repository
    Analyze(AnalyzeArgs),
    /// List supported languages
    Languages,
    /// Write a default configuration file
    Init(InitArgs),
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Repository root
    pub root: PathBuf,

    /// Files to analyze, relative to the root (default: every supported file)
    pub files: Vec<String>,

    /// Path to configuration YAML file (default: auto-discover at the root)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty, json, or markdown
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Worker threads (default: one per core)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "semgraph.yaml")]
    pub output: PathBuf,
}

const CONFIG_TEMPLATE: &str = include_str!("templates/semgraph.yaml");

/// Collect supported files under `root`, relative and with forward slashes.
fn collect_files(root: &Path, config: &EngineConfig) -> anyhow::Result<Vec<String>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && !SKIPPED_DIRS.contains(&&*name)
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() || Language::from_path(entry.path()).is_none() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        if config.is_path_excluded(rel) {
            continue;
        }
        files.push(rel.to_string_lossy().replace('\\', "/"));
    }

    Ok(files)
}

fn load_config(args: &AnalyzeArgs, root: &Path) -> anyhow::Result<EngineConfig> {
    let config = match &args.config {
        Some(path) => EngineConfig::parse_file(path)?,
        None => EngineConfig::load_for_root(root)?,
    };
    config::validate(&config)?;
    Ok(config)
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    register_grammars();

    // Validate format
    if !matches!(args.format.as_str(), "pretty" | "json" | "markdown") {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty', 'json', or 'markdown'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    if !args.root.is_dir() {
        eprintln!("Error: root is not a directory: {}", args.root.display());
        return Ok(EXIT_ERROR);
    }

    let config = match load_config(args, &args.root) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: invalid configuration: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let files = if args.files.is_empty() {
        collect_files(&args.root, &config)?
    } else {
        args.files.clone()
    };

    if files.is_empty() {
        eprintln!("Warning: no files to analyze");
        return Ok(EXIT_SUCCESS);
    }

    let engine = Engine::with_config(&args.root, config);
    let records = match args.jobs {
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
            pool.install(|| engine.analyze_files(&files))
        }
        None => engine.analyze_files(&files),
    };

    let root_str = args.root.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_json(&root_str, &records)?,
        "markdown" => report::write_markdown(&records),
        _ => report::write_pretty(&root_str, &records),
    }

    if records
        .iter()
        .any(|r| r.analysis_method == AnalysisMethod::None)
    {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the languages command.
pub fn run_languages() -> anyhow::Result<i32> {
    println!("Supported languages:");
    println!();

    for language in Language::ALL {
        let grammar = grammar_for(language);
        let failures = grammar.queries().failures();
        let status = if failures.is_empty() {
            "ok".to_string()
        } else {
            let categories: Vec<&str> = failures.iter().map(|(c, _)| c.as_str()).collect();
            format!("degraded ({})", categories.join(", "))
        };
        println!("  {:<12} .{:<4} {}", language.as_str(), language.extension(), status);
    }

    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, CONFIG_TEMPLATE) {
        eprintln!("Error: failed to write configuration: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_template_is_valid_config() {
        let config = EngineConfig::parse_str(CONFIG_TEMPLATE).unwrap();
        config::validate(&config).unwrap();
        assert_eq!(config.snippet_budget, 1000);
        assert_eq!(config.excluded_paths.len(), 2);
    }

    #[test]
    fn test_collect_files_skips_hidden_and_vendor() {
        let dir = TempDir::new().unwrap();
        for path in [
            "app/main.py",
            "app/README.md",
            "node_modules/dep/index.js",
            ".git/hook.py",
            "src/lib.rs",
            "gen/skip.go",
        ] {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, "").unwrap();
        }
        let config = EngineConfig {
            excluded_paths: vec!["gen/**".to_string()],
            ..EngineConfig::default()
        };

        let files = collect_files(dir.path(), &config).unwrap();
        assert_eq!(files, vec!["app/main.py", "src/lib.rs"]);
    }
}
