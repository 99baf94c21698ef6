use serde::{Deserialize, Serialize};

use super::document::{DescriptorId, DocumentDescriptor, DocumentPath, SourceLocation};

/// Normalised, comparable value form of "what is selected now"
///
/// Equality rules:
/// - both carry a descriptor id: ids and effective line spans match, and the
///   documents agree when both are present;
/// - neither carries an id: documents and effective line spans match;
/// - otherwise unequal.
///
/// The effective span treats a missing end line as equal to the start line.
/// Document comparison goes through `DocumentPath`, so casing follows the
/// rule the paths were normalised with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub document: Option<DocumentPath>,
    pub descriptor_id: Option<DescriptorId>,
    pub start_line: Option<u32>,
    pub end_line: Option<u32>,
}

impl SelectionSnapshot {
    /// The "nothing selected" snapshot
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn for_descriptor(document: DocumentPath, descriptor: &DocumentDescriptor) -> Self {
        Self {
            document: Some(document),
            descriptor_id: Some(descriptor.id.clone()),
            start_line: Some(descriptor.span.start),
            end_line: Some(descriptor.span.end),
        }
    }

    pub fn for_location(location: &SourceLocation) -> Self {
        Self {
            document: Some(location.document.clone()),
            descriptor_id: None,
            start_line: Some(location.span.start),
            end_line: Some(location.span.end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_none() && self.descriptor_id.is_none() && self.start_line.is_none()
    }

    fn effective_span(&self) -> Option<(u32, u32)> {
        self.start_line
            .map(|start| (start, self.end_line.unwrap_or(start)))
    }
}

impl PartialEq for SelectionSnapshot {
    fn eq(&self, other: &Self) -> bool {
        match (&self.descriptor_id, &other.descriptor_id) {
            (Some(a), Some(b)) => {
                let documents_agree = match (&self.document, &other.document) {
                    (Some(x), Some(y)) => x == y,
                    _ => true,
                };
                a == b && self.effective_span() == other.effective_span() && documents_agree
            }
            (None, None) => {
                self.document == other.document
                    && self.effective_span() == other.effective_span()
            }
            _ => false,
        }
    }
}
