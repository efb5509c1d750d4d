//! Thin adapter over tree-sitter: bytes in, concrete syntax tree out.

use std::borrow::Cow;
use std::time::Duration;

use tree_sitter::{Node, Parser, Tree};

use crate::error::AnalysisError;
use crate::grammar::grammar_for;
use crate::language::Language;

/// A parsed tree-sitter tree and the bytes it was parsed from.
///
/// Owned by a single analysis pass; never shared across files.
pub struct ParsedSource {
    /// The tree-sitter parse tree.
    pub tree: Tree,
    /// The original source bytes (kept for node text extraction).
    pub source: Vec<u8>,
    /// The language the tree was parsed with.
    pub language: Language,
    /// The file path, relative to the repository root.
    pub path: String,
}

impl ParsedSource {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Decoded text for a node.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD instead of failing.
    pub fn text(&self, node: Node) -> Cow<'_, str> {
        let end = node.end_byte().min(self.source.len());
        let start = node.start_byte().min(end);
        String::from_utf8_lossy(&self.source[start..end])
    }

    /// Whether the tree contains ERROR or MISSING nodes.
    pub fn has_syntax_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// 1-based line of the first syntax error, if any.
    pub fn first_error_line(&self) -> Option<usize> {
        let mut stack = vec![self.tree.root_node()];
        while let Some(node) = stack.pop() {
            if node.is_error() || node.is_missing() {
                return Some(node.start_position().row + 1);
            }
            if !node.has_error() {
                continue;
            }
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        None
    }
}

/// Parse `source` as `language`.
///
/// Deterministic: the same bytes and language always yield an isomorphic
/// tree. Syntax errors still produce a tree; only a grammar that yields
/// nothing (or a timeout) is a `ParseFailure`.
pub fn parse(
    path: &str,
    source: &[u8],
    language: Language,
    timeout: Option<Duration>,
) -> Result<ParsedSource, AnalysisError> {
    let grammar = grammar_for(language);
    let mut parser = Parser::new();
    parser
        .set_language(&grammar.ts_language())
        .map_err(|e| AnalysisError::ParseFailure {
            path: path.to_string(),
            reason: format!("incompatible grammar: {}", e),
        })?;
    if let Some(limit) = timeout {
        parser.set_timeout_micros(limit.as_micros() as u64);
    }

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| AnalysisError::ParseFailure {
            path: path.to_string(),
            reason: match timeout {
                Some(limit) => format!("parser produced no tree within {:?}", limit),
                None => "parser produced no tree".to_string(),
            },
        })?;

    Ok(ParsedSource {
        tree,
        source: source.to_vec(),
        language,
        path: path.to_string(),
    })
}
