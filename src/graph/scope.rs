//! Persistent scope stack for the graph walk.
//!
//! `push` never mutates: it returns a new stack sharing the tail with the
//! old one. Each tree node carries the stack it was entered with, so a
//! subtree's scopes disappear as soon as the walk moves to a sibling.

use std::rc::Rc;

struct Frame {
    id: String,
    parent: Option<Rc<Frame>>,
    depth: usize,
}

/// Enclosing definition ids, innermost on top.
#[derive(Clone, Default)]
pub struct ScopeStack {
    head: Option<Rc<Frame>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new stack with `id` on top; `self` is unchanged.
    pub fn push(&self, id: impl Into<String>) -> Self {
        Self {
            head: Some(Rc::new(Frame {
                id: id.into(),
                parent: self.head.clone(),
                depth: self.depth() + 1,
            })),
        }
    }

    /// Innermost definition id.
    pub fn top(&self) -> Option<&str> {
        self.head.as_deref().map(|f| f.id.as_str())
    }

    pub fn depth(&self) -> usize {
        self.head.as_ref().map(|f| f.depth).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Ids from innermost to outermost.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::successors(self.head.as_deref(), |f| f.parent.as_deref())
            .map(|f| f.id.as_str())
    }
}

impl std::fmt::Debug for ScopeStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
