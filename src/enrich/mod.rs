//! Deep per-file enrichment: cyclomatic complexity and security findings.
//!
//! One walker (`RuleEnricher`) covers every language; the differences live
//! in the `EnrichmentRules` tables.

mod rules;
mod security;

use std::collections::BTreeMap;

use once_cell::sync::OnceCell;
use tracing::debug;
use tree_sitter::Node;

pub use rules::{rules_for, EnrichmentRules};
pub use security::{is_hardcoded_secret, literal_value};

use crate::error::AnalysisError;
use crate::extract::definition_name;
use crate::grammar::{callee_text, grammar_for};
use crate::language::Language;
use crate::model::{Insight, InsightKind, SecurityCategory, SecurityFinding, Severity};
use crate::parse::ParsedSource;

/// Output of one enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    /// Function name -> complexity (>= 1). Later same-name functions overwrite.
    pub complexity: BTreeMap<String, u32>,
    pub security_findings: Vec<SecurityFinding>,
}

/// A deep analysis pass over an already parsed file.
pub trait Enricher: Send + Sync {
    fn language(&self) -> Language;

    fn enrich(&self, parsed: &ParsedSource) -> Result<Enrichment, AnalysisError>;
}

/// Tree walker driven by a rule table.
pub struct RuleEnricher {
    rules: &'static EnrichmentRules,
}

impl RuleEnricher {
    pub fn new(rules: &'static EnrichmentRules) -> Self {
        Self { rules }
    }

    fn is_eval_call(&self, node: Node, parsed: &ParsedSource) -> Option<String> {
        if self.rules.eval_callees.is_empty() {
            return None;
        }
        let (_, field) = self
            .rules
            .call_kinds
            .iter()
            .find(|(kind, _)| *kind == node.kind())?;
        let callee = node.child_by_field_name(field)?;
        // Only direct calls: `eval(x)`, not `obj.eval(x)`.
        if callee.kind() != "identifier" {
            return None;
        }
        let name = callee_text(&parsed.text(callee))?;
        self.rules
            .eval_callees
            .contains(&name.as_str())
            .then_some(name)
    }

    fn is_boolean_branch(&self, node: Node, parsed: &ParsedSource) -> bool {
        if !self.rules.boolean_kinds.contains(&node.kind()) {
            return false;
        }
        let Some(op) = operator_text(node, parsed) else {
            return false;
        };
        if !self.rules.boolean_operators.contains(&op.as_str()) {
            return false;
        }
        if self.rules.flatten_boolean_chains {
            if let Some(parent) = node.parent() {
                if parent.kind() == node.kind() && operator_text(parent, parsed) == Some(op) {
                    return false;
                }
            }
        }
        true
    }
}

impl Enricher for RuleEnricher {
    fn language(&self) -> Language {
        self.rules.language
    }

    fn enrich(&self, parsed: &ParsedSource) -> Result<Enrichment, AnalysisError> {
        if self.rules.strict_syntax && parsed.has_syntax_errors() {
            return Err(AnalysisError::EnrichmentFailure {
                path: parsed.path.clone(),
                reason: format!(
                    "syntax error at line {}",
                    parsed.first_error_line().unwrap_or(1)
                ),
            });
        }

        let grammar = grammar_for(self.rules.language);
        // (name, score) per function, in pre-order.
        let mut scores: Vec<(String, u32)> = Vec::new();
        let mut findings = Vec::new();

        // Each entry carries the index of the nearest enclosing function.
        let mut pending: Vec<(Node, Option<usize>)> = vec![(parsed.root(), None)];
        while let Some((node, owner)) = pending.pop() {
            let kind = node.kind();
            let mut inner = owner;

            if self.rules.function_kinds.contains(&kind) {
                scores.push((definition_name(parsed, grammar, node, None), 1));
                inner = Some(scores.len() - 1);
            } else if self.rules.branch_kinds.contains(&kind)
                || self.is_boolean_branch(node, parsed)
            {
                if let Some(idx) = owner {
                    scores[idx].1 += 1;
                }
            }

            if self.rules.string_kinds.contains(&kind)
                && is_hardcoded_secret(node, parsed, self.rules.assignment_kinds)
            {
                findings.push(SecurityFinding {
                    category: SecurityCategory::HardcodedSecret,
                    line: node.start_position().row + 1,
                    value: literal_value(&parsed.text(node)),
                    severity: Severity::High,
                });
            }

            if let Some(callee) = self.is_eval_call(node, parsed) {
                findings.push(SecurityFinding {
                    category: SecurityCategory::DynamicEval,
                    line: node.start_position().row + 1,
                    value: callee,
                    severity: Severity::High,
                });
            }

            // Literal contents hold no further constructs of interest.
            if self.rules.string_kinds.contains(&kind) {
                continue;
            }
            let mut cursor = node.walk();
            let children: Vec<Node> = node.children(&mut cursor).collect();
            pending.extend(children.into_iter().rev().map(|child| (child, inner)));
        }

        let complexity: BTreeMap<String, u32> = scores.into_iter().collect();
        debug!(
            file = %parsed.path,
            functions = complexity.len(),
            findings = findings.len(),
            "enrichment complete"
        );
        Ok(Enrichment {
            complexity,
            security_findings: findings,
        })
    }
}

fn operator_text(node: Node, parsed: &ParsedSource) -> Option<String> {
    node.child_by_field_name("operator")
        .map(|op| parsed.text(op).trim().to_string())
}

static PYTHON: OnceCell<RuleEnricher> = OnceCell::new();
static JAVASCRIPT: OnceCell<RuleEnricher> = OnceCell::new();
static TYPESCRIPT: OnceCell<RuleEnricher> = OnceCell::new();
static GO: OnceCell<RuleEnricher> = OnceCell::new();
static RUST: OnceCell<RuleEnricher> = OnceCell::new();

/// The enricher for a language, if one exists.
pub fn enricher_for(language: Language) -> Option<&'static dyn Enricher> {
    let cell = match language {
        Language::Python => &PYTHON,
        Language::JavaScript => &JAVASCRIPT,
        Language::TypeScript => &TYPESCRIPT,
        Language::Go => &GO,
        Language::Rust => &RUST,
    };
    Some(cell.get_or_init(|| RuleEnricher::new(rules_for(language))))
}

/// Summaries over an enrichment pass.
pub fn insights(enrichment: &Enrichment, high_complexity_threshold: u32) -> Vec<Insight> {
    let mut insights = Vec::new();

    let complex: Vec<&str> = enrichment
        .complexity
        .iter()
        .filter(|(_, score)| **score > high_complexity_threshold)
        .map(|(name, _)| name.as_str())
        .collect();
    if !complex.is_empty() {
        insights.push(Insight {
            kind: InsightKind::HighComplexityFunctions,
            message: format!("Functions with high complexity: {}", complex.join(", ")),
            severity: Severity::Medium,
        });
    }

    if !enrichment.security_findings.is_empty() {
        insights.push(Insight {
            kind: InsightKind::SecurityConcerns,
            message: format!(
                "Found {} potential security issues",
                enrichment.security_findings.len()
            ),
            severity: Severity::High,
        });
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    fn enrich(path: &str, source: &str, language: Language) -> Enrichment {
        let parsed = parse(path, source.as_bytes(), language, None).unwrap();
        enricher_for(language).unwrap().enrich(&parsed).unwrap()
    }

    #[test]
    fn test_python_complexity() {
        let source = r#"def calculate(a, b):
    if a > b:
        return a - b
    return a + b

def busy(items):
    for item in items:
        if item and not item.done or item.retry:
            try:
                item.run()
            except ValueError:
                pass
            except KeyError:
                pass
        elif item is None:
            continue
    while False:
        pass
"#;
        let result = enrich("c.py", source, Language::Python);
        assert_eq!(result.complexity.get("calculate"), Some(&2));
        // 1 + for + if + and + or + 2 except + elif + while
        assert_eq!(result.complexity.get("busy"), Some(&9));
        assert!(result.security_findings.is_empty());
    }

    #[test]
    fn test_python_boolean_chain_counts_once() {
        let source = "def f(a, b, c):\n    if a and b and c:\n        pass\n\ndef g(a, b, c):\n    return (a or b) or c and a\n";
        let result = enrich("b.py", source, Language::Python);
        // 1 + if + one `and` chain
        assert_eq!(result.complexity.get("f"), Some(&3));
        // parenthesized `or`, outer `or`, `and`
        assert_eq!(result.complexity.get("g"), Some(&4));

        let js = "function f(a, b, c) {\n  return a && b && c;\n}\n";
        let result = enrich("b.js", js, Language::JavaScript);
        assert_eq!(result.complexity.get("f"), Some(&3));
    }

    #[test]
    fn test_nested_functions_are_not_double_counted() {
        let source = "def outer(x):\n    if x:\n        pass\n    def inner(y):\n        if y:\n            pass\n        for _ in y:\n            pass\n    return inner\n";
        let result = enrich("n.py", source, Language::Python);
        assert_eq!(result.complexity.get("outer"), Some(&2));
        assert_eq!(result.complexity.get("inner"), Some(&3));
    }

    #[test]
    fn test_python_secrets_and_eval() {
        let source = "password = \"abc123\"\nname = \"bob\"\nconnect(api_key='k-1')\n\ndef run(code):\n    eval(code)\n    obj.eval(code)\n";
        let result = enrich("s.py", source, Language::Python);

        let secrets: Vec<_> = result
            .security_findings
            .iter()
            .filter(|f| f.category == SecurityCategory::HardcodedSecret)
            .collect();
        assert_eq!(secrets.len(), 2);
        assert_eq!(secrets[0].line, 1);
        assert_eq!(secrets[0].value, "abc123");
        assert_eq!(secrets[1].line, 3);

        let evals: Vec<_> = result
            .security_findings
            .iter()
            .filter(|f| f.category == SecurityCategory::DynamicEval)
            .collect();
        assert_eq!(evals.len(), 1);
        assert_eq!(evals[0].line, 6);
        assert_eq!(evals[0].value, "eval");
    }

    #[test]
    fn test_python_syntax_error_fails_enrichment() {
        let parsed = parse("bad.py", b"def f(:\n    pass\n", Language::Python, None).unwrap();
        let err = enricher_for(Language::Python)
            .unwrap()
            .enrich(&parsed)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EnrichmentFailure { .. }));
    }

    #[test]
    fn test_javascript_rules() {
        let source = "function check(a, b) {\n  if (a && b) { return 1; }\n  const token = \"s3cr3t\";\n  return a ?? new Function(\"x\", \"return x\");\n}\n";
        let result = enrich("a.js", source, Language::JavaScript);
        // 1 + if + && + ??
        assert_eq!(result.complexity.get("check"), Some(&4));
        let categories: Vec<_> = result.security_findings.iter().map(|f| f.category).collect();
        assert_eq!(
            categories,
            vec![SecurityCategory::HardcodedSecret, SecurityCategory::DynamicEval]
        );
    }

    #[test]
    fn test_go_and_rust_complexity() {
        let go = "package p\n\nfunc f(x int) int {\n\tswitch x {\n\tcase 1:\n\t\treturn 1\n\tcase 2:\n\t\treturn 2\n\t}\n\tif x > 0 && x < 9 {\n\t\treturn 3\n\t}\n\treturn 0\n}\n";
        assert_eq!(enrich("p.go", go, Language::Go).complexity.get("f"), Some(&5));

        let rust = "fn g(x: Option<u8>) -> u8 {\n    match x {\n        Some(v) => v,\n        None => 0,\n    }\n}\n";
        assert_eq!(enrich("g.rs", rust, Language::Rust).complexity.get("g"), Some(&3));
    }

    #[test]
    fn test_insights() {
        let mut enrichment = Enrichment::default();
        assert!(insights(&enrichment, 10).is_empty());

        enrichment.complexity.insert("big".to_string(), 11);
        enrichment.complexity.insert("small".to_string(), 10);
        enrichment.security_findings.push(SecurityFinding {
            category: SecurityCategory::DynamicEval,
            line: 1,
            value: "eval".to_string(),
            severity: Severity::High,
        });

        let found = insights(&enrichment, 10);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].kind, InsightKind::HighComplexityFunctions);
        assert_eq!(found[0].message, "Functions with high complexity: big");
        assert_eq!(found[1].message, "Found 1 potential security issues");
    }
}
