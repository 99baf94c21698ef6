//! Pure candidate stages.
//!
//! Every stage takes an immutable candidate list and returns a list; no
//! stage ever panics. Narrowing filters go through [`narrow`], which keeps
//! the input when a filter would eliminate every candidate.

use std::cmp::Reverse;

use crate::model::{DocumentDescriptor, DocumentIndex};

use super::facts::NodeFacts;

pub type Candidates<'a> = Vec<&'a DocumentDescriptor>;

/// Apply `keep` unless it would eliminate every candidate.
pub fn narrow<'a>(
    candidates: Candidates<'a>,
    keep: impl Fn(&DocumentDescriptor) -> bool,
) -> Candidates<'a> {
    let kept: Candidates<'a> = candidates.iter().copied().filter(|d| keep(d)).collect();
    if kept.is_empty() {
        candidates
    } else {
        kept
    }
}

/// Exact declared-identifier matches.
pub fn name_candidates<'a>(index: &'a DocumentIndex, facts: &NodeFacts) -> Candidates<'a> {
    match &facts.declared_name {
        Some(name) => index.named(name),
        None => Vec::new(),
    }
}

/// Descriptors containing the hint's start line, tightest and shallowest first.
pub fn line_candidates<'a>(index: &'a DocumentIndex, facts: &NodeFacts) -> Candidates<'a> {
    let Some(hint) = facts.hint else {
        return Vec::new();
    };
    let mut out = index.containing_line(hint.start);
    out.sort_by_key(|d| (d.span.len(), d.path.depth()));
    out
}

pub fn by_role<'a>(candidates: Candidates<'a>, facts: &NodeFacts) -> Candidates<'a> {
    narrow(candidates, |d| d.is_template == facts.is_template_part)
}

pub fn by_parent_path<'a>(candidates: Candidates<'a>, facts: &NodeFacts) -> Candidates<'a> {
    match &facts.parent_path {
        Some(parent) => narrow(candidates, |d| d.path.is_child_of(parent)),
        None => candidates,
    }
}

pub fn by_depth<'a>(candidates: Candidates<'a>, facts: &NodeFacts) -> Candidates<'a> {
    match facts.structural_depth {
        Some(depth) => narrow(candidates, |d| d.path.depth() == depth),
        None => candidates,
    }
}

pub fn by_ordinal<'a>(candidates: Candidates<'a>, facts: &NodeFacts) -> Candidates<'a> {
    match facts.ordinal {
        Some(ordinal) => narrow(candidates, |d| d.path.ordinal() == Some(ordinal)),
        None => candidates,
    }
}

/// Structural narrowing in its fixed order: role, parent path, depth, ordinal.
///
/// The order decides the winner in ambiguous documents and must not change.
pub fn structural<'a>(candidates: Candidates<'a>, facts: &NodeFacts) -> Candidates<'a> {
    let candidates = by_role(candidates, facts);
    let candidates = by_parent_path(candidates, facts);
    let candidates = by_depth(candidates, facts);
    by_ordinal(candidates, facts)
}

/// Pick the best of several candidates.
///
/// Ranked by exact local-name match, then line distance to the hint, then
/// shallowest path, then shortest span. Document order breaks full ties.
pub fn best_scored<'a>(
    candidates: &[&'a DocumentDescriptor],
    facts: &NodeFacts,
) -> Option<&'a DocumentDescriptor> {
    candidates
        .iter()
        .enumerate()
        .min_by_key(|(i, d)| {
            let distance = facts
                .hint
                .map(|h| d.span.distance_to(h.start))
                .unwrap_or(0);
            (
                Reverse(d.element_name == facts.type_name),
                distance,
                d.path.depth(),
                d.span.len(),
                *i,
            )
        })
        .map(|(_, d)| *d)
}
