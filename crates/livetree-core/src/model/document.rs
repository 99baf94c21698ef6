//! Document-side value types
//!
//! Descriptors are produced by the external markup parser; this module only
//! defines the shapes the engine consumes and the lookups it needs over them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// How document paths compare on the current platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCasing {
    Sensitive,
    Insensitive,
}

impl PathCasing {
    /// Casing rule of the platform this build targets
    pub fn platform() -> Self {
        if cfg!(any(windows, target_os = "macos")) {
            PathCasing::Insensitive
        } else {
            PathCasing::Sensitive
        }
    }
}

/// A document path normalised for comparison
///
/// Separators are unified to `/` and, under `PathCasing::Insensitive`, the
/// comparison key is lower-cased. Equality and hashing use the key only;
/// `as_str` returns the path as it was given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPath {
    raw: String,
    key: String,
}

impl DocumentPath {
    pub fn new(raw: impl Into<String>, casing: PathCasing) -> Self {
        let raw = raw.into();
        let unified = raw.trim().replace('\\', "/");
        let key = match casing {
            PathCasing::Sensitive => unified,
            PathCasing::Insensitive => unified.to_lowercase(),
        };
        Self { raw, key }
    }

    /// Path normalised with the platform casing rule
    pub fn platform(raw: impl Into<String>) -> Self {
        Self::new(raw, PathCasing::platform())
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The normalised comparison key
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for DocumentPath {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for DocumentPath {}

impl Hash for DocumentPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl std::fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Inclusive range of 1-based source lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineSpan {
    pub start: u32,
    pub end: u32,
}

impl LineSpan {
    /// Build a span; a reversed pair is swapped rather than rejected
    pub fn new(start: u32, end: u32) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    pub fn line(line: u32) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    /// Number of lines after the first; a single-line span has length 0
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_single_line(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, line: u32) -> bool {
        self.start <= line && line <= self.end
    }

    /// Lines between `line` and the nearest edge of the span (0 inside)
    pub fn distance_to(&self, line: u32) -> u32 {
        if line < self.start {
            self.start - line
        } else if line > self.end {
            line - self.end
        } else {
            0
        }
    }
}

/// Ancestor chain of sibling indices from the document root
///
/// The root element has an empty path; its second child has path `[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StructuralPath(pub Vec<usize>);

impl StructuralPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Sibling index of the element itself; `None` for the root
    pub fn ordinal(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn parent(&self) -> Option<StructuralPath> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn child(&self, ordinal: usize) -> StructuralPath {
        let mut segments = self.0.clone();
        segments.push(ordinal);
        Self(segments)
    }

    /// True if `self` sits exactly one level below `ancestor`
    pub fn is_child_of(&self, ancestor: &StructuralPath) -> bool {
        self.0.len() == ancestor.0.len() + 1 && self.0.starts_with(&ancestor.0)
    }
}

/// Stable id the parser assigns to one element
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DescriptorId(pub String);

impl DescriptorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structural handle locating one element within a parsed markup document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub id: DescriptorId,
    pub path: StructuralPath,
    /// Element local name, e.g. `Button`
    pub element_name: String,
    /// Declared identifier, e.g. the `Name` attribute
    pub name: Option<String>,
    pub span: LineSpan,
    /// True for elements declared inside a control template
    pub is_template: bool,
    /// Content hash of the element's source text, used as an edit guard
    pub content_hash: Option<String>,
}

impl DocumentDescriptor {
    pub fn new(
        id: impl Into<String>,
        path: Vec<usize>,
        element_name: impl Into<String>,
        span: LineSpan,
    ) -> Self {
        Self {
            id: DescriptorId::new(id),
            path: StructuralPath(path),
            element_name: element_name.into(),
            name: None,
            span,
            is_template: false,
            content_hash: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn in_template(mut self) -> Self {
        self.is_template = true;
        self
    }

    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }
}

/// Where a runtime node was declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub document: DocumentPath,
    /// Key of the remote document this location was fetched from, if any
    pub remote_key: Option<String>,
    /// Absolute URI of the document, if known
    pub uri: Option<String>,
    pub span: LineSpan,
}

impl SourceLocation {
    pub fn new(document: DocumentPath, span: LineSpan) -> Self {
        Self {
            document,
            remote_key: None,
            uri: None,
            span,
        }
    }

    pub fn with_remote_key(mut self, key: impl Into<String>) -> Self {
        self.remote_key = Some(key.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}

/// Immutable descriptor set of one parsed document with lookup tables
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    path: DocumentPath,
    revision: u64,
    descriptors: Vec<DocumentDescriptor>,
    by_id: HashMap<DescriptorId, usize>,
    by_name: HashMap<String, Vec<usize>>,
}

impl DocumentIndex {
    pub fn new(path: DocumentPath, revision: u64, descriptors: Vec<DocumentDescriptor>) -> Self {
        let mut by_id = HashMap::with_capacity(descriptors.len());
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, d) in descriptors.iter().enumerate() {
            by_id.insert(d.id.clone(), i);
            if let Some(name) = &d.name {
                by_name.entry(name.clone()).or_default().push(i);
            }
        }
        Self {
            path,
            revision,
            descriptors,
            by_id,
            by_name,
        }
    }

    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    /// Same descriptors, filed under `path`
    pub fn with_path(mut self, path: DocumentPath) -> Self {
        self.path = path;
        self
    }

    /// Parser revision this index was built from
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn descriptors(&self) -> &[DocumentDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn get(&self, id: &DescriptorId) -> Option<&DocumentDescriptor> {
        self.by_id.get(id).map(|&i| &self.descriptors[i])
    }

    /// Descriptors whose declared identifier is exactly `name`
    pub fn named(&self, name: &str) -> Vec<&DocumentDescriptor> {
        self.by_name
            .get(name)
            .map(|idx| idx.iter().map(|&i| &self.descriptors[i]).collect())
            .unwrap_or_default()
    }

    /// Descriptors whose span contains `line`, in document order
    pub fn containing_line(&self, line: u32) -> Vec<&DocumentDescriptor> {
        self.descriptors
            .iter()
            .filter(|d| d.span.contains(line))
            .collect()
    }
}
