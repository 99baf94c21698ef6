#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use livetree_core::logging_facility::init_test_capture;
use livetree_core::{DescriptorId, DocumentPath, LineSpan, PathCasing, SelectionSnapshot};
use livetree_engine::{InboundOutcome, OutboundOutcome, SyncConfig};

#[tokio::test]
async fn test_child_button_publishes_its_descriptor() {
    // GIVEN the attached tree and its parsed document
    let mut f = Fixture::new().await;
    let child = f.node(CHILD_BUTTON);

    // WHEN the user selects ChildButton in the tree
    let outcome = f.session.select(child).await.unwrap();

    // THEN the descriptor named ChildButton is broadcast to the other observers
    let OutboundOutcome::Published { snapshot, notified } = outcome else {
        panic!("expected publish, got {outcome:?}");
    };
    assert_eq!(snapshot.descriptor_id, Some(DescriptorId::new("cb")));
    assert_eq!(notified, 2);
    assert_eq!(f.preview.last(), Some(snapshot.clone()));
    assert_eq!(f.panel.last(), Some(snapshot));
    let runtime = f.session.model().store().get(child).unwrap();
    assert_eq!(runtime.descriptor.as_ref().unwrap().element_name, "Button");
    assert_eq!(
        f.session.node_for_descriptor(&main_path(), &DescriptorId::new("cb")),
        Some(child)
    );
}

#[tokio::test]
async fn test_external_request_selects_same_node_and_exits_scope_and_filter() {
    // GIVEN ChildButton was mapped, then the user moved on and narrowed the view
    let mut f = Fixture::new().await;
    let child = f.node(CHILD_BUTTON);
    f.session.select(child).await.unwrap();
    f.session.select(f.node(OTHER_BUTTON)).await.unwrap();
    f.session.set_scope(Some(f.node(SIDE_PANEL)));
    f.session.set_filter(Some("no-such-control"));

    // WHEN the source preview asks for the ChildButton descriptor
    let outcome = f
        .session
        .request_selection(PREVIEW, f.request("cb"))
        .await
        .unwrap()
        .unwrap();

    // THEN the very same runtime node is selected and made reachable
    let InboundOutcome::Applied { node, reveal } = outcome else {
        panic!("expected apply, got {outcome:?}");
    };
    assert_eq!(node, child);
    assert_eq!(f.session.selection(), Some(child));
    assert!(reveal.scope_cleared);
    assert!(reveal.filter_cleared);
    assert_eq!(reveal.expanded, vec![f.node(ROOT_PANEL)]);
    assert_eq!(f.session.view().scope(), None);
    assert!(f.session.model().store().get(child).unwrap().visible);

    // AND the preview hears nothing back while the panel follows
    assert_eq!(f.panel.last(), Some(f.request("cb")));
    assert_ne!(f.preview.last(), Some(f.request("cb")));
    assert!(f.session.begin_select(child).unwrap().is_none());
}

#[tokio::test]
async fn test_later_inbound_wins_when_completed_first() {
    let mut f = Fixture::new().await;
    let child = f.node(CHILD_BUTTON);
    let other = f.node(OTHER_BUTTON);
    f.session.select(child).await.unwrap();
    f.session.select(other).await.unwrap();
    f.session.select(f.node(WINDOW)).await.unwrap();

    // GIVEN two overlapping requests from the preview
    let first = f.session.begin_inbound(PREVIEW, f.request("cb")).unwrap().unwrap();
    let second = f.session.begin_inbound(PREVIEW, f.request("ob")).unwrap().unwrap();
    assert!(second.ticket().sync_revision > first.ticket().sync_revision);
    let first = first.run().await;
    let second = second.run().await;

    // WHEN the later one completes first
    let later = f.session.complete_inbound(second);
    let earlier = f.session.complete_inbound(first);

    // THEN only the later one is applied
    assert!(matches!(later, InboundOutcome::Applied { node, .. } if node == other));
    assert_eq!(earlier, InboundOutcome::Stale);
    assert_eq!(f.session.selection(), Some(other));
    assert_eq!(f.session.coordinator().active_owner(), None);
}

#[tokio::test]
async fn test_earlier_inbound_completing_first_is_still_stale() {
    let mut f = Fixture::new().await;
    let child = f.node(CHILD_BUTTON);
    let other = f.node(OTHER_BUTTON);
    f.session.select(child).await.unwrap();
    f.session.select(other).await.unwrap();
    f.session.select(f.node(WINDOW)).await.unwrap();

    let first = f.session.begin_inbound(PREVIEW, f.request("cb")).unwrap().unwrap();
    let second = f.session.begin_inbound(PREVIEW, f.request("ob")).unwrap().unwrap();
    let first = first.run().await;
    let second = second.run().await;

    assert_eq!(f.session.complete_inbound(first), InboundOutcome::Stale);
    assert!(matches!(
        f.session.complete_inbound(second),
        InboundOutcome::Applied { node, .. } if node == other
    ));
    assert_eq!(f.session.selection(), Some(other));
}

#[tokio::test]
async fn test_local_selection_during_inbound_suppresses_it() {
    let capture = init_test_capture();
    let mut f = Fixture::new().await;
    let window = f.node(WINDOW);
    f.session.select(f.node(CHILD_BUTTON)).await.unwrap();
    f.session.select(window).await.unwrap();

    // GIVEN an inbound request in flight
    let attempt = f.session.begin_inbound(PREVIEW, f.request("cb")).unwrap().unwrap();

    // WHEN the user selects another node before it completes
    let side = f.node(SIDE_PANEL);
    let outbound = f.session.begin_select(side).unwrap().unwrap();
    let loaded = attempt.run().await;
    let outcome = f.session.complete_inbound(loaded);

    // THEN the inbound result is dropped and the user's choice stands
    assert_eq!(outcome, InboundOutcome::Stale);
    assert_eq!(f.session.selection(), Some(side));
    capture.assert_suppressed("inbound_sync", "stale");

    let published = f.session.complete_select(outbound.run().await);
    assert!(matches!(published, OutboundOutcome::Published { .. }));
}

#[tokio::test]
async fn test_tree_cannot_publish_while_preview_holds_the_slot() {
    let mut f = Fixture::new().await;
    let child = f.node(CHILD_BUTTON);
    let other = f.node(OTHER_BUTTON);
    f.session.select(child).await.unwrap();

    // GIVEN the preview's request is still resolving
    let attempt = f.session.begin_inbound(PREVIEW, f.request("ob")).unwrap().unwrap();
    assert_eq!(f.session.coordinator().active_owner().as_deref(), Some(PREVIEW));

    // WHEN the user selects the same button in the tree
    let outbound = f.session.select(other).await.unwrap();

    // THEN the tree's broadcast is refused
    assert_eq!(outbound, OutboundOutcome::Refused);

    // AND the inbound result still applies because its target is already selected
    let applied = f.session.complete_inbound(attempt.run().await);
    assert!(matches!(applied, InboundOutcome::Applied { node, .. } if node == other));
    assert_eq!(f.session.coordinator().active_owner(), None);
}

#[tokio::test]
async fn test_blank_owner_is_rejected() {
    let mut f = Fixture::new().await;
    let err = f.session.begin_inbound("", f.request("cb")).unwrap_err();
    assert!(matches!(err, livetree_core::LiveTreeError::InvalidOwner { .. }));
}

#[tokio::test]
async fn test_unchanged_request_is_dropped() {
    let mut f = Fixture::new().await;
    f.session.select(f.node(CHILD_BUTTON)).await.unwrap();

    let outcome = f
        .session
        .request_selection(PREVIEW, f.request("cb"))
        .await
        .unwrap();

    assert!(outcome.is_none());
}

#[tokio::test]
async fn test_spatial_index_locates_by_line_range() {
    let mut f = Fixture::new().await;
    let window = f.node(WINDOW);
    assert_eq!(f.session.tree_index(&main_path()).unwrap().len(), 1);

    let request = SelectionSnapshot {
        document: Some(main_path()),
        descriptor_id: None,
        start_line: Some(1),
        end_line: Some(20),
    };
    let outcome = f
        .session
        .request_selection(PREVIEW, request)
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(outcome, InboundOutcome::Applied { node, .. } if node == window));
}

#[tokio::test]
async fn test_full_scan_prefers_smallest_line_penalty() {
    // GIVEN no spatial index and two mapped nodes in the document
    let mut f = Fixture::with_config(SyncConfig {
        spatial_index: false,
        path_casing: livetree_engine::CasingSetting::Sensitive,
        ..SyncConfig::default()
    })
    .await;
    let child = f.node(CHILD_BUTTON);
    f.session.select(child).await.unwrap();
    f.session.select(f.node(WINDOW)).await.unwrap();
    assert!(f.session.tree_index(&main_path()).is_none());

    // WHEN a line-only request lands next to ChildButton
    let request = SelectionSnapshot {
        document: Some(main_path()),
        descriptor_id: None,
        start_line: Some(4),
        end_line: None,
    };
    let outcome = f
        .session
        .request_selection(PREVIEW, request)
        .await
        .unwrap()
        .unwrap();

    // THEN the closest span wins over the window spanning the whole file
    assert!(matches!(outcome, InboundOutcome::Applied { node, .. } if node == child));
}

#[tokio::test]
async fn test_unknown_document_leaves_selection_untouched() {
    let mut f = Fixture::new().await;
    let child = f.node(CHILD_BUTTON);
    f.session.select(child).await.unwrap();

    let request = SelectionSnapshot {
        document: Some(DocumentPath::new("/app/Other.xml", PathCasing::Sensitive)),
        descriptor_id: Some(DescriptorId::new("zz")),
        start_line: Some(3),
        end_line: Some(3),
    };
    let outcome = f
        .session
        .request_selection(PREVIEW, request)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome, InboundOutcome::Unresolved);
    assert_eq!(f.session.selection(), Some(child));
}

#[tokio::test]
async fn test_unavailable_document_degrades_to_unresolved() {
    let mut f = Fixture::new().await;
    f.documents.make_unavailable(&main_path());

    let outcome = f.session.select(f.node(CHILD_BUTTON)).await.unwrap();

    assert_eq!(outcome, OutboundOutcome::Unresolved);
    assert_eq!(f.preview.count(), 0);
}

#[tokio::test]
async fn test_removed_node_is_purged_from_selection_and_caches() {
    let mut f = Fixture::new().await;
    let child = f.node(CHILD_BUTTON);
    f.session.select(child).await.unwrap();
    let local_before = f.session.revisions().local_selection();

    let (sub, event) = f.host.remove_child(ROOT_PANEL, CHILD_BUTTON).unwrap();
    assert!(f.session.dispatch_feed(&mut f.host, sub, event));

    assert_eq!(f.session.selection(), None);
    assert!(f.session.revisions().local_selection() > local_before);
    assert_eq!(
        f.session.node_for_descriptor(&main_path(), &DescriptorId::new("cb")),
        None
    );
    assert!(f.session.model().find_live(CHILD_BUTTON).is_none());
    assert_eq!(f.session.model().children(f.node(ROOT_PANEL)).len(), 1);
}

#[tokio::test]
async fn test_location_priming_indexes_spans() {
    let f = Fixture::new().await;
    let window = f.node(WINDOW);

    let index = f.session.tree_index(&main_path()).unwrap();
    assert_eq!(index.span_of(window), Some(LineSpan::new(1, 20)));
    assert_eq!(f.session.associated_documents(), &[main_path()]);
}
