//! Output formatting for analysis records.
//!
//! Supports three output formats:
//! - Pretty: colored terminal summary per file
//! - JSON: the full records for programmatic consumption
//! - Markdown: the per-file context block handed to prompt assembly

use std::fmt::Write as _;

use colored::*;
use serde::Serialize;

use crate::model::{AnalysisMethod, AnalysisRecord, DependencyRecord, Severity};

// =============================================================================
// JSON Format
// =============================================================================

/// Top-level JSON document.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub version: String,
    pub root: String,
    pub files_analyzed: usize,
    pub files: &'a [AnalysisRecord],
}

/// Render records as pretty-printed JSON.
pub fn render_json(root: &str, records: &[AnalysisRecord]) -> anyhow::Result<String> {
    let report = JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        root: root.to_string(),
        files_analyzed: records.len(),
        files: records,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Write records in JSON format.
pub fn write_json(root: &str, records: &[AnalysisRecord]) -> anyhow::Result<()> {
    println!("{}", render_json(root, records)?);
    Ok(())
}

// =============================================================================
// Markdown Format
// =============================================================================

/// Render the markdown context block for one file.
pub fn render_markdown(record: &AnalysisRecord) -> String {
    let mut md = String::new();
    let stats = record.graph.stats();

    let _ = writeln!(md, "## Enhanced File Analysis: `{}`\n", record.file_path);
    let _ = writeln!(md, "### Analysis Summary");
    let _ = writeln!(md, "- **Analysis Method**: {}", record.analysis_method);
    let _ = writeln!(md, "- **Functions**: {}", record.functions.len());
    let _ = writeln!(md, "- **Types**: {}", record.types.len());
    let _ = writeln!(md, "- **Imports**: {}", record.imports.len());
    let _ = writeln!(md, "- **Semantic Graph Nodes**: {}", stats.nodes);
    let _ = writeln!(md, "- **Semantic Graph Edges**: {}\n", stats.edges);

    if !record.types.is_empty() {
        md.push_str("### Types\n\n");
        for ty in &record.types {
            let _ = writeln!(md, "- **{}** (line {})", ty.name, ty.start_line());
        }
        md.push('\n');
    }

    let fence = record.language.map(|l| l.as_str()).unwrap_or("");
    let calls = record.graph.function_dependencies();
    let usage = record.graph.import_usage();

    if !record.functions.is_empty() {
        md.push_str("### Functions\n\n");
        for func in &record.functions {
            let _ = writeln!(md, "#### {} (line {})\n", func.name, func.start_line());
            if let Some(params) = &func.parameters {
                let _ = writeln!(md, "**Parameters:** `{}`\n", params);
            }
            let _ = writeln!(md, "```{}\n{}\n```\n", fence, func.source);
            let _ = writeln!(md, "- **Function Calls**: {}", join_or_none(calls.get(&func.name)));
            let _ = writeln!(md, "- **Imports Used**: {}", join_or_none(usage.get(&func.name)));
            if let Some(score) = record.complexity.get(&func.name) {
                let _ = writeln!(md, "- **Complexity**: {}", score);
            }
            let _ = writeln!(md, "- **Code Lines**: {}\n", func.line_count());
        }
    }

    if !calls.is_empty() {
        md.push_str("### Function Dependencies\n\n");
        for (caller, callees) in &calls {
            for callee in callees {
                let _ = writeln!(md, "- **{}()** → **{}()**", caller, callee);
            }
        }
        md.push('\n');
    }

    if !usage.is_empty() {
        md.push_str("### Import Usage\n\n");
        for (name, modules) in &usage {
            let _ = writeln!(md, "- **{}()** uses: {}", name, modules.join(", "));
        }
        md.push('\n');
    }

    if !record.imports.is_empty() {
        md.push_str("### Imports\n\n");
        for import in &record.imports {
            let _ = writeln!(
                md,
                "- **{}** ({} import, line {})",
                import.module,
                import.kind.as_str(),
                import.line
            );
        }
        md.push('\n');
    }

    let internal: Vec<&DependencyRecord> = record.internal_dependencies().collect();
    if !internal.is_empty() {
        md.push_str("### Internal Dependencies\n\n");
        for dep in internal {
            let _ = writeln!(
                md,
                "#### `{}` → `{}` ({} lines)\n",
                dep.import_name,
                dep.target_path.as_deref().unwrap_or(&dep.resolved_module),
                dep.line_count
            );
            if !dep.referenced_by.is_empty() {
                let _ = writeln!(md, "Referenced by: {}\n", dep.referenced_by.join(", "));
            }
            if let Some(snippet) = &dep.snippet {
                let _ = writeln!(md, "```{}\n{}\n```\n", fence, snippet);
            }
        }
    }

    let external: Vec<&str> = record.external_dependencies().collect();
    if !external.is_empty() {
        let _ = writeln!(md, "### External Dependencies\n\n{}\n", external.join(", "));
    }

    if !record.security_findings.is_empty() || !record.insights.is_empty() {
        md.push_str("### Security & Insights\n\n");
        for finding in &record.security_findings {
            let _ = writeln!(
                md,
                "- **{}** (line {}, {}): `{}`",
                finding.category.as_str(),
                finding.line,
                finding.severity,
                finding.value
            );
        }
        for insight in &record.insights {
            let _ = writeln!(md, "- {} ({})", insight.message, insight.severity);
        }
        md.push('\n');
    }

    md
}

fn join_or_none(names: Option<&Vec<String>>) -> String {
    match names {
        Some(names) if !names.is_empty() => names.join(", "),
        _ => "None".to_string(),
    }
}

/// Write records in markdown format, one block per file.
pub fn write_markdown(records: &[AnalysisRecord]) {
    for record in records {
        println!("{}", render_markdown(record));
    }
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write records in pretty (human-readable) format.
pub fn write_pretty(root: &str, records: &[AnalysisRecord]) {
    // Header
    println!();
    print!("  ");
    print!("{}", "semgraph".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Root:  ".dimmed());
    println!("{}", root);
    print!("  {}", "Files: ".dimmed());
    println!("{}", records.len());
    println!();

    for record in records {
        write_file(record);
        println!();
    }

    write_final_status(records);
    println!();
}

fn write_file(record: &AnalysisRecord) {
    print!("  ");
    write_method_tag(record.analysis_method);
    print!("  {}", record.file_path.blue());
    if let Some(language) = record.language {
        print!("  {}", format!("({})", language).dimmed());
    }
    println!();

    if record.analysis_method == AnalysisMethod::NoOp {
        return;
    }

    let stats = record.graph.stats();
    println!(
        "    {} {}  {} {}  {} {}  {} {}/{}",
        "functions".dimmed(),
        record.functions.len(),
        "types".dimmed(),
        record.types.len(),
        "imports".dimmed(),
        record.imports.len(),
        "graph".dimmed(),
        stats.nodes,
        stats.edges
    );

    let internal: Vec<&str> = record
        .internal_dependencies()
        .map(|d| d.import_name.as_str())
        .collect();
    if !internal.is_empty() {
        println!("    {} {}", "internal".dimmed(), internal.join(", "));
    }
    let external: Vec<&str> = record.external_dependencies().collect();
    if !external.is_empty() {
        println!("    {} {}", "external".dimmed(), external.join(", "));
    }

    if !record.complexity.is_empty() {
        let scores: Vec<String> = record
            .complexity
            .iter()
            .map(|(name, score)| format!("{}={}", name, score))
            .collect();
        println!("    {} {}", "complexity".dimmed(), scores.join(" "));
    }

    for finding in &record.security_findings {
        print!("    ");
        write_severity_tag(finding.severity);
        print!(" {:<18}", finding.category.as_str().dimmed());
        print!("{}", format!("line {}", finding.line).dimmed());
        println!("  {}", finding.value);
    }

    for insight in &record.insights {
        print!("    ");
        write_severity_tag(insight.severity);
        println!(" {}", insight.message);
    }

    for diagnostic in &record.diagnostics {
        println!(
            "    {} {}",
            format!("[{}]", diagnostic.stage).dimmed(),
            diagnostic.message.dimmed()
        );
    }
}

fn write_method_tag(method: AnalysisMethod) {
    let label = format!("{:<15}", method.as_str());
    match method {
        AnalysisMethod::Full => print!("{}", label.green()),
        AnalysisMethod::GraphOnly | AnalysisMethod::StructuralOnly => print!("{}", label.yellow()),
        AnalysisMethod::NoOp => print!("{}", label.dimmed()),
        AnalysisMethod::None => print!("{}", label.red()),
    }
}

fn write_severity_tag(severity: Severity) {
    match severity {
        Severity::High => print!("{}", "HIGH".red()),
        Severity::Medium => print!("{}", "MED ".yellow()),
        Severity::Low => print!("{}", "LOW ".blue()),
    }
}

fn write_final_status(records: &[AnalysisRecord]) {
    let failed = records
        .iter()
        .filter(|r| r.analysis_method == AnalysisMethod::None)
        .count();
    let findings: usize = records.iter().map(|r| r.security_findings.len()).sum();

    print!("  {}", format!("Findings: {}", findings).dimmed());
    print!("  ");
    if failed == 0 {
        print!("{}", "OK".green());
    } else {
        print!("{}", format!("{} FAILED", failed).red());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{node_id, EdgeKind, NodeKind, SemanticNode};
    use crate::language::Language;
    use crate::model::{
        DefinitionKind, DefinitionRecord, ImportKind, ImportRecord, SecurityCategory,
        SecurityFinding, Span,
    };
    use std::collections::BTreeMap;

    fn sample_record() -> AnalysisRecord {
        let mut record =
            AnalysisRecord::empty("app/main.py", Some(Language::Python), AnalysisMethod::Full);
        record.functions.push(DefinitionRecord {
            kind: DefinitionKind::Function,
            name: "run".to_string(),
            file_path: "app/main.py".to_string(),
            span: Span {
                start_byte: 0,
                end_byte: 30,
                start_line: 3,
                end_line: 4,
            },
            source: "def run():\n    helper()".to_string(),
            parameters: Some("()".to_string()),
        });
        record.imports.push(ImportRecord {
            module: "os".to_string(),
            line: 1,
            kind: ImportKind::Direct,
        });
        record.dependencies.push(DependencyRecord::external("os", "os", 1));
        record.complexity.insert("run".to_string(), 1);
        record.security_findings.push(SecurityFinding {
            category: SecurityCategory::HardcodedSecret,
            line: 2,
            value: "abc123".to_string(),
            severity: Severity::High,
        });

        let function_id = node_id("app/main.py", NodeKind::Function, "run");
        let callee_id = node_id("app/main.py", NodeKind::CallTarget, "helper");
        for (id, kind, name) in [
            (function_id.clone(), NodeKind::Function, "run"),
            (callee_id.clone(), NodeKind::CallTarget, "helper"),
        ] {
            record.graph.add_node(SemanticNode {
                id,
                kind,
                name: name.to_string(),
                file_path: "app/main.py".to_string(),
                line: 3,
                start_byte: 0,
                end_byte: 0,
                code: None,
                parameters: None,
                metadata: BTreeMap::new(),
            });
        }
        record.graph.add_edge(&function_id, &callee_id, EdgeKind::Calls, 4);
        record
    }

    #[test]
    fn test_markdown_sections() {
        let md = render_markdown(&sample_record());
        assert!(md.starts_with("## Enhanced File Analysis: `app/main.py`"));
        assert!(md.contains("- **Analysis Method**: full"));
        assert!(md.contains("#### run (line 3)"));
        assert!(md.contains("```python\ndef run():\n    helper()\n```"));
        assert!(md.contains("- **Function Calls**: helper"));
        assert!(md.contains("- **Imports Used**: None"));
        assert!(md.contains("- **run()** → **helper()**"));
        assert!(md.contains("- **os** (direct import, line 1)"));
        assert!(md.contains("### External Dependencies\n\nos"));
        assert!(md.contains("- **hardcoded_secret** (line 2, high): `abc123`"));
    }

    #[test]
    fn test_markdown_empty_record() {
        let record = AnalysisRecord::empty("README.md", None, AnalysisMethod::NoOp);
        let md = render_markdown(&record);
        assert!(md.contains("- **Analysis Method**: no_op"));
        assert!(!md.contains("### Functions"));
        assert!(!md.contains("### Imports"));
    }

    #[test]
    fn test_json_report() {
        let records = vec![sample_record()];
        let json = render_json("/repo", &records).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["root"], "/repo");
        assert_eq!(value["files_analyzed"], 1);
        assert_eq!(value["files"][0]["analysis_method"], "full");
        assert_eq!(value["files"][0]["dependencies"][0]["classification"], "external");
        assert_eq!(value["files"][0]["graph"]["edges"][0]["kind"], "calls");
    }
}
