//! Heuristic secret detection for string literals.

use lazy_static::lazy_static;
use regex::Regex;
use tree_sitter::Node;

use crate::parse::ParsedSource;

lazy_static! {
    /// `name = "value"` (or `name := "value"`) where the name looks like a credential.
    static ref SECRET_ASSIGNMENT: Regex = Regex::new(
        r#"(?i)(password|api_key|secret|token|key)\s*:?=\s*["'][^"']+["']"#
    ).unwrap();
}

/// Maximum characters of a literal kept in a finding.
pub const VALUE_LIMIT: usize = 50;

/// How far up the tree to look for an assignment around a literal.
const CONTEXT_DEPTH: usize = 3;

/// Whether the literal at `node` is assigned to a credential-like name.
///
/// The literal's own text is checked first, then the nearest enclosing
/// assignment-like ancestor. A context match only counts if it covers
/// the literal, so `key = "a" if x else "b"` flags `"a"` alone.
pub fn is_hardcoded_secret(node: Node, parsed: &ParsedSource, assignment_kinds: &[&str]) -> bool {
    if SECRET_ASSIGNMENT.is_match(&parsed.text(node)) {
        return true;
    }

    let mut ancestor = node.parent();
    for _ in 0..CONTEXT_DEPTH {
        let Some(current) = ancestor else {
            return false;
        };
        if assignment_kinds.contains(&current.kind()) {
            let context = parsed.text(current);
            let offset = node.start_byte().saturating_sub(current.start_byte());
            let len = node.end_byte() - node.start_byte();
            return SECRET_ASSIGNMENT
                .find_iter(&context)
                .any(|m| m.start() <= offset && m.end() >= offset + len);
        }
        ancestor = current.parent();
    }
    false
}

/// The literal's value without quotes, truncated for reporting.
pub fn literal_value(raw: &str) -> String {
    let body = raw.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let body = ["\"\"\"", "'''", "\"", "'", "`"]
        .iter()
        .find(|q| body.len() >= 2 * q.len() && body.starts_with(**q) && body.ends_with(**q))
        .map(|q| &body[q.len()..body.len() - q.len()])
        .unwrap_or(body);
    truncate(body)
}

/// First `VALUE_LIMIT` characters, with `...` when anything was cut.
pub fn truncate(value: &str) -> String {
    if value.chars().count() > VALUE_LIMIT {
        let head: String = value.chars().take(VALUE_LIMIT).collect();
        format!("{}...", head)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern() {
        assert!(SECRET_ASSIGNMENT.is_match(r#"password = "abc123""#));
        assert!(SECRET_ASSIGNMENT.is_match(r#"API_KEY="xyz""#));
        assert!(SECRET_ASSIGNMENT.is_match(r#"token := "t""#));
        assert!(!SECRET_ASSIGNMENT.is_match(r#"password = get_password()"#));
        assert!(!SECRET_ASSIGNMENT.is_match(r#"name = "bob""#));
        assert!(!SECRET_ASSIGNMENT.is_match(r#"password = """#));
    }

    #[test]
    fn test_literal_value() {
        assert_eq!(literal_value("\"abc123\""), "abc123");
        assert_eq!(literal_value("f'{x}'"), "{x}");
        assert_eq!(literal_value("\"\"\"doc\"\"\""), "doc");
        let long = format!("\"{}\"", "a".repeat(60));
        let value = literal_value(&long);
        assert_eq!(value.len(), VALUE_LIMIT + 3);
        assert!(value.ends_with("..."));
    }
}
