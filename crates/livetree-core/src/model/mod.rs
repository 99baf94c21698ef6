pub mod document;
pub mod ids;
pub mod live;
pub mod node;
pub mod snapshot;

pub use document::{
    DescriptorId, DocumentDescriptor, DocumentIndex, DocumentPath, LineSpan, PathCasing,
    SourceLocation, StructuralPath,
};
pub use ids::{LiveId, NodeId, SubscriptionId};
pub use live::{
    FeedEvent, FeedKind, LiveHost, LiveInfo, PopupSourceKind, PopupSources, Subscription,
};
pub use node::{BucketKind, NodeKind, RuntimeNode};
pub use snapshot::SelectionSnapshot;
