//! Runtime node to document descriptor mapping.
//!
//! A layered heuristic: declared-name lookup, line-overlap lookup,
//! structural narrowing and a scored tie-break, with the full descriptor set
//! as a last resort inside the node's own document and a retry against the
//! other documents the session knows about. Every stage is a pure function
//! in [`stages`]; a miss is `None`, never an error.

pub mod facts;
pub mod stages;

use crate::model::{DocumentDescriptor, DocumentIndex, DocumentPath, NodeId};
use crate::tree::NodeStore;

pub use facts::NodeFacts;
use stages::{best_scored, line_candidates, name_candidates, narrow, structural};

/// How a descriptor was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Name,
    Line,
    FullSet,
}

/// A resolved descriptor together with the document it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub document: DocumentPath,
    pub revision: u64,
    pub descriptor: DocumentDescriptor,
    pub source: MatchSource,
    /// True when found in a document other than the node's own
    pub cross_document: bool,
}

/// Resolve within one document index.
///
/// `full_fallback` enables narrowing over every descriptor when neither
/// name nor line candidates exist. A full-set winner must carry the node's
/// type as its local name, otherwise the result is a miss.
pub fn resolve_in<'a>(
    index: &'a DocumentIndex,
    facts: &NodeFacts,
    full_fallback: bool,
) -> Option<(&'a DocumentDescriptor, MatchSource)> {
    let names = name_candidates(index, facts);
    let lines = line_candidates(index, facts);

    let (candidates, source) = if !names.is_empty() {
        let names = match facts.hint {
            Some(hint) => narrow(names, |d| d.span.contains(hint.start)),
            None => names,
        };
        (names, MatchSource::Name)
    } else if !lines.is_empty() {
        (lines, MatchSource::Line)
    } else if full_fallback {
        (index.descriptors().iter().collect(), MatchSource::FullSet)
    } else {
        return None;
    };

    let candidates = structural(candidates, facts);
    let best = match candidates.as_slice() {
        [only] => Some(*only),
        many => best_scored(many, facts),
    }?;

    if source == MatchSource::FullSet && best.element_name != facts.type_name {
        return None;
    }
    Some((best, source))
}

/// Resolver over the nodes of one tree
#[derive(Debug, Clone, Copy)]
pub struct DescriptorResolver<'s> {
    store: &'s NodeStore,
}

impl<'s> DescriptorResolver<'s> {
    pub fn new(store: &'s NodeStore) -> Self {
        Self { store }
    }

    /// Resolve `node` against its own document first, then every document
    /// in `others` as a last resort.
    pub fn resolve(
        &self,
        node: NodeId,
        own: Option<&DocumentIndex>,
        others: &[&DocumentIndex],
    ) -> Option<Resolution> {
        if let Some(index) = own {
            if let Some(found) = self.resolve_against(node, index, true, false) {
                return Some(found);
            }
        }
        let own_path = own.map(|i| i.path());
        others
            .iter()
            .filter(|i| Some(i.path()) != own_path)
            .find_map(|index| self.resolve_against(node, index, false, true))
    }

    fn resolve_against(
        &self,
        node: NodeId,
        index: &DocumentIndex,
        full_fallback: bool,
        cross_document: bool,
    ) -> Option<Resolution> {
        let facts = NodeFacts::collect(self.store, node, index.path())?;
        let (descriptor, source) = resolve_in(index, &facts, full_fallback)?;
        tracing::trace!(
            component = module_path!(),
            node_id = node.get(),
            descriptor_id = descriptor.id.as_str(),
            document = index.path().as_str(),
            ?source,
            cross_document,
            "descriptor resolved"
        );
        Some(Resolution {
            document: index.path().clone(),
            revision: index.revision(),
            descriptor: descriptor.clone(),
            source,
            cross_document,
        })
    }
}
