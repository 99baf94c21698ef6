//! Structural facts about a runtime node, relative to one document.

use crate::model::{DocumentPath, LineSpan, NodeId, StructuralPath};
use crate::tree::NodeStore;

/// Everything the resolver knows about a node when matching it against one
/// document's descriptors.
///
/// Facts are document-relative: the parent path comes from the closest
/// ancestor already mapped into *this* document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFacts {
    /// Runtime type, compared against the descriptor's local element name.
    pub type_name: String,
    pub declared_name: Option<String>,
    pub is_template_part: bool,
    /// Structural path of the closest ancestor mapped into the document.
    pub parent_path: Option<StructuralPath>,
    /// Number of markup-backed ancestors, i.e. the expected path length.
    pub structural_depth: Option<usize>,
    /// Position among the parent's markup-backed children.
    pub ordinal: Option<usize>,
    /// Line hint, usually from a cached source location.
    pub hint: Option<LineSpan>,
}

impl NodeFacts {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.declared_name = Some(name.into());
        self
    }

    pub fn with_hint(mut self, hint: LineSpan) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Collect facts for `node` against `document`.
    ///
    /// Returns `None` if the node is not in the store or is a template group.
    pub fn collect(store: &NodeStore, node: NodeId, document: &DocumentPath) -> Option<Self> {
        let target = store.get(node).ok()?;
        if target.is_template_group() {
            return None;
        }

        let ancestors = store.ancestors(node);

        let parent_path = ancestors.iter().find_map(|id| {
            let a = store.get(*id).ok()?;
            match (&a.descriptor, &a.descriptor_document) {
                (Some(d), Some(doc)) if doc == document => Some(d.path.clone()),
                _ => None,
            }
        });

        // depth stops at a template boundary: parts are rooted in their template
        let mut depth = 0;
        for id in &ancestors {
            let Ok(a) = store.get(*id) else { break };
            if a.is_template_group() {
                break;
            }
            if a.markup_backed {
                depth += 1;
            }
        }

        let ordinal = target.parent.and_then(|p| {
            let parent = store.get(p).ok()?;
            parent
                .children
                .iter()
                .filter(|c| {
                    store
                        .get(**c)
                        .map(|n| n.markup_backed && n.origin == target.origin)
                        .unwrap_or(false)
                })
                .position(|c| *c == node)
        });

        let hint = target
            .location
            .as_ref()
            .filter(|l| &l.document == document)
            .map(|l| l.span);

        Some(Self {
            type_name: target.type_name.clone(),
            declared_name: target.declared_name.clone(),
            is_template_part: target.is_template_part(),
            parent_path,
            structural_depth: target.markup_backed.then_some(depth),
            ordinal: if target.markup_backed { ordinal } else { None },
            hint,
        })
    }
}
