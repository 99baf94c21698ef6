use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use livetree_core::core_types::SyncContext;
use livetree_core::model::LiveId;
use livetree_core::{log_op_end, log_op_start, NodeId, SourceLocation};

use super::InspectorSession;
use crate::providers::{SourceInfoResolver, SourceTarget};

/// Pending source-location lookups for nodes that have none cached
pub struct LocationFetch {
    ctx: SyncContext,
    started: Instant,
    targets: Vec<(NodeId, LiveId)>,
    sources: Arc<dyn SourceInfoResolver>,
}

#[derive(Debug)]
pub struct LocationsFetched {
    ctx: SyncContext,
    started: Instant,
    found: Vec<(NodeId, SourceLocation)>,
}

impl LocationFetch {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Query the source-info resolver for every target concurrently
    ///
    /// Lookup failures are logged and treated as "no location".
    pub async fn run(self) -> LocationsFetched {
        let sources = self.sources;
        let lookups = self.targets.iter().map(|(node, live)| {
            let sources = Arc::clone(&sources);
            let target = SourceTarget::Node(*live);
            let node = *node;
            async move {
                match sources.resolve(&target).await {
                    Ok(location) => location.map(|l| (node, l)),
                    Err(e) => {
                        tracing::warn!(
                            component = module_path!(),
                            node_id = node.get(),
                            error = %e,
                            "source location lookup failed"
                        );
                        None
                    }
                }
            }
        });
        let found = join_all(lookups).await.into_iter().flatten().collect();
        LocationsFetched {
            ctx: self.ctx,
            started: self.started,
            found,
        }
    }
}

impl InspectorSession {
    /// Collect every live node without a usable cached source location
    ///
    /// A cached location whose span was dropped from the spatial index, as
    /// after a content change, is fetched again.
    pub fn begin_location_fetch(&self) -> LocationFetch {
        let ctx = self.context();
        let store = self.model.store();
        let targets: Vec<(NodeId, LiveId)> = store
            .walk()
            .into_iter()
            .filter_map(|id| {
                let node = store.get(id).ok()?;
                if let Some(location) = &node.location {
                    let indexed = !self.config.spatial_index
                        || self
                            .indexes
                            .get(&location.document)
                            .is_some_and(|i| i.span_of(id).is_some());
                    if indexed {
                        return None;
                    }
                }
                node.live_id().map(|live| (id, live))
            })
            .collect();
        log_op_start!(
            "prime_locations",
            session_id = %ctx.session_id,
            attempt_id = %ctx.attempt_id,
            targets = targets.len()
        );
        LocationFetch {
            ctx,
            started: Instant::now(),
            targets,
            sources: Arc::clone(&self.providers.sources),
        }
    }

    /// Cache fetched locations on their nodes and index their spans
    ///
    /// Nodes removed while the lookup ran are skipped. Returns how many
    /// locations were applied.
    pub fn apply_locations(&mut self, fetched: LocationsFetched) -> usize {
        let mut applied = 0;
        for (node, mut location) in fetched.found {
            let document = self.path(location.document.as_str());
            let span = location.span;
            location.document = document.clone();
            let Ok(runtime) = self.model.store_mut().get_mut(node) else {
                continue;
            };
            runtime.location = Some(location);
            self.associate(&document);
            self.index_span(node, &document, span);
            applied += 1;
        }
        log_op_end!(
            "prime_locations",
            duration_ms = fetched.started.elapsed().as_millis() as u64,
            attempt_id = %fetched.ctx.attempt_id,
            applied = applied
        );
        applied
    }

    pub async fn prime_locations(&mut self) -> usize {
        let fetch = self.begin_location_fetch();
        let fetched = fetch.run().await;
        self.apply_locations(fetched)
    }
}
