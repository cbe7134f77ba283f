//! REST bodies and push frames as the backend actually sends them.

use churnwatch_core::errors::ProtocolError;
use churnwatch_core::models::{AlertId, AlertType, CustomerId, RiskLevel};
use churnwatch_sync::transport::protocol::{AlertsResponse, WatchlistResponse};
use churnwatch_sync::transport::{parse_server_message, ServerMessage, WatchlistChange};
use churnwatch_sync::{ChannelStates, SyncSnapshot, SyncState};
use test_fixtures::load_fixture;

#[test]
fn rest_fixtures_load_into_state() {
    let watchlist: WatchlistResponse = load_fixture("watchlist_response.json");
    let alerts: AlertsResponse = load_fixture("alerts_response.json");
    assert_eq!(watchlist.count, Some(4));
    assert_eq!(watchlist.watchlist[0].customer_id, CustomerId::from("1001"));
    assert!(watchlist.watchlist[0].anomaly_context.is_some());
    assert_eq!(alerts.alerts[2].alert_type, AlertType::Other);
    assert_eq!(alerts.alerts[0].id, AlertId::server("501"));

    let state = SyncState::from_initial(watchlist.watchlist, alerts.alerts);
    let snapshot = SyncSnapshot::build(&state, ChannelStates::default(), false);

    // The inactive entry is not watched.
    let stats = snapshot.stats();
    assert_eq!(stats.total_watched, 3);
    assert_eq!(stats.high_risk, 1);
    assert_eq!(stats.medium_risk, 1);
    assert_eq!(stats.active_alerts, 2);
}

#[test]
fn integer_customer_ids_in_frames() {
    let frame = r#"{
        "type": "watchlist_update",
        "action": "updated",
        "customer_id": 1002,
        "customer_name": "Birch & Co",
        "churn_probability": 0.74,
        "risk_level": "high",
        "timestamp": "2026-10-01T10:00:00Z"
    }"#;
    match parse_server_message(frame).unwrap() {
        ServerMessage::WatchlistUpdate(WatchlistChange::Upserted {
            customer_id,
            risk_level,
            timestamp,
            ..
        }) => {
            assert_eq!(customer_id.as_str(), "1002");
            assert_eq!(risk_level, RiskLevel::High);
            assert!(timestamp.is_some());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn snapshot_frames_from_the_server() {
    let frame = r#"{"type":"current_watchlist","watchlist":[
        {"customer_id":"9","customer_name":"n","churn_probability":0.2,"risk_level":"low"}
    ]}"#;
    let ServerMessage::CurrentWatchlist(entries) = parse_server_message(frame).unwrap() else {
        panic!("expected current_watchlist");
    };
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_active);

    let err = parse_server_message(r#"{"type":"recent_alerts","alerts":"nope"}"#).unwrap_err();
    assert!(matches!(err, ProtocolError::Malformed { .. }));
}
