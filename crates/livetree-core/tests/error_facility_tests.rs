use livetree_core::errors::{ExError, ExErrorKind, LiveTreeError};

#[test]
fn test_invalid_owner_is_contract_violation_kind() {
    let err = LiveTreeError::InvalidOwner {
        owner: " ".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidOwner);
    assert_eq!(ex_err.code(), "ERR_INVALID_OWNER");
}

#[test]
fn test_node_not_found_keeps_node_context() {
    let ex_err: ExError = LiveTreeError::NodeNotFound { node_id: 12 }.into();

    assert_eq!(ex_err.kind(), ExErrorKind::NodeNotFound);
    assert_eq!(ex_err.node_id(), Some(12));
}

#[test]
fn test_document_unavailable_keeps_path() {
    let ex_err: ExError = LiveTreeError::DocumentUnavailable {
        path: "/app/Main.xml".to_string(),
        reason: "parse failed".to_string(),
    }
    .into();

    assert_eq!(ex_err.code(), "ERR_DOCUMENT_UNAVAILABLE");
    assert_eq!(ex_err.document(), Some("/app/Main.xml"));
    assert!(ex_err.message().contains("parse failed"));
}

#[test]
fn test_io_error_converts_through_domain_error() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.toml");
    let domain: LiveTreeError = io.into();
    let ex_err: ExError = domain.into();

    assert_eq!(ex_err.kind(), ExErrorKind::Io);
    assert!(ex_err.message().contains("missing.toml"));
}

#[test]
fn test_display_includes_code_op_and_context() {
    let ex_err = ExError::new(ExErrorKind::NotFound)
        .with_op("inbound_sync")
        .with_descriptor_id("d7")
        .with_message("no node for descriptor");

    let text = ex_err.to_string();
    assert!(text.starts_with("[ERR_NOT_FOUND]"));
    assert!(text.contains("inbound_sync"));
    assert!(text.contains("d7"));
}
