use std::collections::HashMap;

use crate::model::{DocumentPath, LineSpan, NodeId};

/// One indexed (node, span) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub node: NodeId,
    pub span: LineSpan,
}

/// Line-range index of runtime nodes already resolved in one document
///
/// Purely an accelerator for inbound selection: a miss falls through to the
/// full-tree scan, so an empty index is always correct.
#[derive(Debug, Clone)]
pub struct TreeIndex {
    document: DocumentPath,
    entries: HashMap<NodeId, LineSpan>,
}

impl TreeIndex {
    pub fn new(document: DocumentPath) -> Self {
        Self {
            document,
            entries: HashMap::new(),
        }
    }

    pub fn document(&self) -> &DocumentPath {
        &self.document
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index `node` at `span`, replacing any earlier entry for it
    pub fn upsert(&mut self, node: NodeId, span: LineSpan) {
        self.entries.insert(node, span);
    }

    /// Drop every entry for `node`
    pub fn remove(&mut self, node: NodeId) -> bool {
        self.entries.remove(&node).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn span_of(&self, node: NodeId) -> Option<LineSpan> {
        self.entries.get(&node).copied()
    }

    /// Best node for a query range
    ///
    /// Among entries containing `query.start`, picks the smallest span, then
    /// the nearest start line, then the span length closest to the query's.
    /// The winner is only returned when its start line equals the query's or
    /// it spans a single line; anything else is too weak a guess.
    pub fn best_match(&self, query: LineSpan) -> Option<NodeId> {
        let query_len = query.len();
        let winner = self
            .entries
            .iter()
            .filter(|(_, span)| span.contains(query.start))
            .map(|(node, span)| IndexEntry {
                node: *node,
                span: *span,
            })
            .min_by_key(|e| {
                (
                    e.span.len(),
                    e.span.start.abs_diff(query.start),
                    e.span.len().abs_diff(query_len),
                    e.node,
                )
            })?;

        if winner.span.start == query.start || winner.span.len() == 0 {
            Some(winner.node)
        } else {
            None
        }
    }
}
