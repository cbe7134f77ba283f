use churnwatch_core::errors::*;

#[test]
fn transport_http_error_carries_status_and_body() {
    let err = TransportError::Http {
        status: 503,
        body: "maintenance".into(),
    };
    let msg = err.to_string();
    assert!(msg.contains("503"));
    assert!(msg.contains("maintenance"));
}

#[test]
fn channel_not_open_names_the_channel() {
    let err = TransportError::ChannelNotOpen {
        channel: "watchlist".into(),
    };
    assert!(err.to_string().contains("watchlist"));
}

#[test]
fn missing_field_names_message_and_field() {
    let err = ProtocolError::MissingField {
        message_type: "watchlist_update".into(),
        field: "risk_level",
    };
    let msg = err.to_string();
    assert!(msg.contains("watchlist_update"));
    assert!(msg.contains("risk_level"));
}

// --- From impls ---

#[test]
fn transport_error_converts_to_churnwatch_error() {
    let err: ChurnwatchError = TransportError::Network {
        reason: "connection refused".into(),
    }
    .into();
    assert!(matches!(err, ChurnwatchError::Transport(_)));
    assert!(err.to_string().contains("connection refused"));
    assert!(err.is_connectivity());
}

#[test]
fn rejection_is_not_a_connectivity_failure() {
    let err: ChurnwatchError = TransportError::Rejected {
        reason: "alert not found".into(),
    }
    .into();
    assert!(!err.is_connectivity());
}

#[test]
fn sync_error_converts_to_churnwatch_error() {
    let err: ChurnwatchError = SyncError::Disposed.into();
    assert!(matches!(err, ChurnwatchError::Sync(SyncError::Disposed)));
}

#[test]
fn protocol_error_converts_to_churnwatch_error() {
    let err: ChurnwatchError = ProtocolError::UnknownMessageType {
        type_name: "bogus".into(),
    }
    .into();
    assert!(err.to_string().contains("bogus"));
}
