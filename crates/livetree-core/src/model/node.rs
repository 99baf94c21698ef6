use super::document::{DocumentDescriptor, DocumentPath, SourceLocation};
use super::ids::{LiveId, NodeId};
use super::live::LiveInfo;

/// What a runtime node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Wraps one live object
    Live(LiveId),
    /// Synthetic container grouping a node's template parts
    TemplateGroup,
}

/// Which child source produced a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKind {
    Logical,
    Template,
    Popup,
}

/// Inspector-side wrapper around one live UI object
///
/// Runtime nodes form the tree shown by the inspector. A node is owned by
/// its parent's child collection; the `NodeStore` holds it by `NodeId`.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeNode {
    pub id: NodeId,
    pub kind: NodeKind,

    /// Declared runtime type, e.g. `Button`
    pub type_name: String,

    /// Declared identifier, if any
    pub declared_name: Option<String>,

    /// Part name when this node is a template part
    pub part_name: Option<String>,

    /// Bucket of the parent collection this node came from
    pub origin: Option<BucketKind>,

    /// True if the live object was instantiated from markup
    pub markup_backed: bool,

    pub parent: Option<NodeId>,

    /// Children in display order, as last rebuilt by the merger
    pub children: Vec<NodeId>,

    pub expanded: bool,

    /// False while an active filter or scope hides the node
    pub visible: bool,

    /// Cached descriptor, valid for `descriptor_document` at `descriptor_revision`
    pub descriptor: Option<DocumentDescriptor>,
    pub descriptor_document: Option<DocumentPath>,
    pub descriptor_revision: Option<u64>,

    /// Cached source location from the source-info resolver
    pub location: Option<SourceLocation>,
}

impl RuntimeNode {
    pub(crate) fn live(id: NodeId, live: LiveId, info: &LiveInfo, origin: BucketKind) -> Self {
        Self {
            id,
            kind: NodeKind::Live(live),
            type_name: info.type_name.clone(),
            declared_name: info.name.clone(),
            part_name: info.part_name.clone(),
            origin: Some(origin),
            markup_backed: info.markup_backed,
            parent: None,
            children: Vec::new(),
            expanded: false,
            visible: true,
            descriptor: None,
            descriptor_document: None,
            descriptor_revision: None,
            location: None,
        }
    }

    pub(crate) fn root(id: NodeId, live: LiveId, info: &LiveInfo) -> Self {
        let mut node = Self::live(id, live, info, BucketKind::Logical);
        node.origin = None;
        node.expanded = true;
        node
    }

    pub(crate) fn template_group(id: NodeId) -> Self {
        Self {
            id,
            kind: NodeKind::TemplateGroup,
            type_name: "/template/".to_string(),
            declared_name: None,
            part_name: None,
            origin: Some(BucketKind::Template),
            markup_backed: false,
            parent: None,
            children: Vec::new(),
            expanded: false,
            visible: true,
            descriptor: None,
            descriptor_document: None,
            descriptor_revision: None,
            location: None,
        }
    }

    pub fn live_id(&self) -> Option<LiveId> {
        match self.kind {
            NodeKind::Live(live) => Some(live),
            NodeKind::TemplateGroup => None,
        }
    }

    pub fn is_template_group(&self) -> bool {
        self.kind == NodeKind::TemplateGroup
    }

    /// True for template parts, i.e. nodes whose parent is a template group
    pub fn is_template_part(&self) -> bool {
        self.origin == Some(BucketKind::Template) && !self.is_template_group()
    }

    /// Document the node's source affordances point at, if any
    pub fn backing_document(&self) -> Option<&DocumentPath> {
        self.location
            .as_ref()
            .map(|l| &l.document)
            .or(self.descriptor_document.as_ref())
    }

    pub fn clear_descriptor(&mut self) {
        self.descriptor = None;
        self.descriptor_document = None;
        self.descriptor_revision = None;
    }

    /// Label used by filters: type, plus `#name` when declared
    pub fn label(&self) -> String {
        match &self.declared_name {
            Some(name) => format!("{}#{}", self.type_name, name),
            None => self.type_name.clone(),
        }
    }
}
