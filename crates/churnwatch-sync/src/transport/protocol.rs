//! Wire protocol: push channel frames and REST bodies.
//!
//! Inbound frames are validated before they reach the reducer. Anything that
//! does not have the expected shape becomes a [`ProtocolError`] instead of a
//! panic or a half-applied event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use churnwatch_core::errors::{ChurnwatchResult, ProtocolError, TransportError};
use churnwatch_core::models::{
    Alert, AlertId, ChannelKind, CustomerId, RiskLevel, Severity, WatchlistEntry,
};

/// Messages the client sends over a push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    SubscribeWatchlist,
    SubscribeAlerts,
    RemoveFromWatchlist { customer_id: CustomerId },
    GetCurrentWatchlist,
    GetRecentAlerts,
}

impl ClientMessage {
    /// The message sent right after the handshake of `channel`.
    pub fn subscribe(channel: ChannelKind) -> Self {
        match channel {
            ChannelKind::Watchlist => ClientMessage::SubscribeWatchlist,
            ChannelKind::Alerts => ClientMessage::SubscribeAlerts,
        }
    }

    pub fn to_text(&self) -> ChurnwatchResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// What happened to a watchlist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchlistAction {
    Added,
    Updated,
    Removed,
}

/// A validated watchlist change.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchlistChange {
    /// `added` or `updated`: all entry fields are present.
    Upserted {
        action: WatchlistAction,
        customer_id: CustomerId,
        customer_name: String,
        churn_probability: f64,
        risk_level: RiskLevel,
        timestamp: Option<DateTime<Utc>>,
    },
    Removed {
        customer_id: CustomerId,
        timestamp: Option<DateTime<Utc>>,
    },
}

/// A pushed anomaly.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyEvent {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub severity: Severity,
    pub anomaly_score: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub details: Option<serde_json::Value>,
}

/// A validated inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    WatchlistUpdate(WatchlistChange),
    AnomalyDetected(AnomalyEvent),
    SubscriptionConfirmed { message: String },
    RemovalResult { success: bool, customer_id: CustomerId },
    Error { message: String },
    CurrentWatchlist(Vec<WatchlistEntry>),
    RecentAlerts(Vec<Alert>),
}

const KNOWN_TYPES: &[&str] = &[
    "watchlist_update",
    "anomaly_detected",
    "subscription_confirmed",
    "removal_result",
    "error",
    "current_watchlist",
    "recent_alerts",
];

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawServerMessage {
    WatchlistUpdate {
        action: WatchlistAction,
        customer_id: CustomerId,
        #[serde(default)]
        customer_name: Option<String>,
        #[serde(default)]
        churn_probability: Option<f64>,
        #[serde(default)]
        risk_level: Option<RiskLevel>,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    AnomalyDetected {
        customer_id: CustomerId,
        customer_name: String,
        severity: Severity,
        anomaly_score: f64,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
        #[serde(default)]
        anomaly_details: Option<serde_json::Value>,
    },
    SubscriptionConfirmed {
        #[serde(default)]
        message: String,
    },
    RemovalResult {
        success: bool,
        customer_id: CustomerId,
    },
    Error {
        #[serde(default)]
        message: String,
    },
    CurrentWatchlist {
        watchlist: Vec<WatchlistEntry>,
    },
    RecentAlerts {
        alerts: Vec<Alert>,
    },
}

/// Parse and validate one inbound text frame.
pub fn parse_server_message(text: &str) -> Result<ServerMessage, ProtocolError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed {
            reason: e.to_string(),
        })?;

    let type_name = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| ProtocolError::Malformed {
            reason: "missing string field \"type\"".into(),
        })?;
    if !KNOWN_TYPES.contains(&type_name) {
        return Err(ProtocolError::UnknownMessageType {
            type_name: type_name.to_string(),
        });
    }

    let raw: RawServerMessage =
        serde_json::from_value(value).map_err(|e| ProtocolError::Malformed {
            reason: e.to_string(),
        })?;

    Ok(match raw {
        RawServerMessage::WatchlistUpdate {
            action: WatchlistAction::Removed,
            customer_id,
            timestamp,
            ..
        } => ServerMessage::WatchlistUpdate(WatchlistChange::Removed {
            customer_id,
            timestamp,
        }),
        RawServerMessage::WatchlistUpdate {
            action,
            customer_id,
            customer_name,
            churn_probability,
            risk_level,
            timestamp,
        } => {
            let churn_probability = require(churn_probability, "churn_probability")?;
            if !(0.0..=1.0).contains(&churn_probability) {
                return Err(ProtocolError::Malformed {
                    reason: format!("churn_probability {churn_probability} outside [0, 1]"),
                });
            }
            ServerMessage::WatchlistUpdate(WatchlistChange::Upserted {
                action,
                customer_id,
                customer_name: require(customer_name, "customer_name")?,
                churn_probability,
                risk_level: require(risk_level, "risk_level")?,
                timestamp,
            })
        }
        RawServerMessage::AnomalyDetected {
            customer_id,
            customer_name,
            severity,
            anomaly_score,
            timestamp,
            anomaly_details,
        } => ServerMessage::AnomalyDetected(AnomalyEvent {
            customer_id,
            customer_name,
            severity,
            anomaly_score,
            timestamp,
            details: anomaly_details,
        }),
        RawServerMessage::SubscriptionConfirmed { message } => {
            ServerMessage::SubscriptionConfirmed { message }
        }
        RawServerMessage::RemovalResult {
            success,
            customer_id,
        } => ServerMessage::RemovalResult {
            success,
            customer_id,
        },
        RawServerMessage::Error { message } => ServerMessage::Error { message },
        RawServerMessage::CurrentWatchlist { watchlist } => {
            ServerMessage::CurrentWatchlist(watchlist)
        }
        RawServerMessage::RecentAlerts { alerts } => ServerMessage::RecentAlerts(alerts),
    })
}

fn require<T>(value: Option<T>, field: &'static str) -> Result<T, ProtocolError> {
    value.ok_or(ProtocolError::MissingField {
        message_type: "watchlist_update".into(),
        field,
    })
}

/// `GET /api/watchlist/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistResponse {
    #[serde(default)]
    pub watchlist: Vec<WatchlistEntry>,
    #[serde(default)]
    pub count: Option<usize>,
}

/// `GET /api/alerts/?hours=N`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsResponse {
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub count: Option<usize>,
}

/// `POST /api/resolve-alert/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveAlertRequest {
    pub alert_id: AlertId,
}

/// `POST /api/trigger-anomaly/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerAnomalyRequest {
    pub customer_id: CustomerId,
}

/// Body of action endpoints. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ActionResponse {
    /// A 2xx answer still counts as a rejection if the body says so.
    pub fn into_result(self) -> Result<(), TransportError> {
        if let Some(reason) = self.error {
            return Err(TransportError::Rejected { reason });
        }
        if self.success == Some(false) {
            return Err(TransportError::Rejected {
                reason: self
                    .message
                    .unwrap_or_else(|| "backend reported failure".to_string()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_messages_match_channel() {
        assert_eq!(
            ClientMessage::subscribe(ChannelKind::Watchlist).to_text().unwrap(),
            r#"{"type":"subscribe_watchlist"}"#
        );
        assert_eq!(
            ClientMessage::subscribe(ChannelKind::Alerts).to_text().unwrap(),
            r#"{"type":"subscribe_alerts"}"#
        );
    }

    #[test]
    fn remove_message_carries_customer_id() {
        let text = ClientMessage::RemoveFromWatchlist {
            customer_id: "C7".into(),
        }
        .to_text()
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "remove_from_watchlist");
        assert_eq!(value["customer_id"], "C7");
    }

    #[test]
    fn parses_added_update() {
        let msg = parse_server_message(
            r#"{"type":"watchlist_update","action":"added","customer_id":9,
                "customer_name":"Eve","churn_probability":0.9,"risk_level":"high",
                "timestamp":"2026-10-18T12:00:00Z"}"#,
        )
        .unwrap();
        match msg {
            ServerMessage::WatchlistUpdate(WatchlistChange::Upserted {
                action,
                customer_id,
                risk_level,
                timestamp,
                ..
            }) => {
                assert_eq!(action, WatchlistAction::Added);
                assert_eq!(customer_id.as_str(), "9");
                assert_eq!(risk_level, RiskLevel::High);
                assert!(timestamp.is_some());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn removed_update_needs_only_customer_id() {
        let msg =
            parse_server_message(r#"{"type":"watchlist_update","action":"removed","customer_id":"C1"}"#)
                .unwrap();
        assert_eq!(
            msg,
            ServerMessage::WatchlistUpdate(WatchlistChange::Removed {
                customer_id: "C1".into(),
                timestamp: None,
            })
        );
    }

    #[test]
    fn added_update_without_risk_level_is_rejected() {
        let err = parse_server_message(
            r#"{"type":"watchlist_update","action":"added","customer_id":"C1",
                "customer_name":"X","churn_probability":0.5}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ProtocolError::MissingField {
                message_type: "watchlist_update".into(),
                field: "risk_level",
            }
        );
    }

    #[test]
    fn probability_out_of_range_is_rejected() {
        let err = parse_server_message(
            r#"{"type":"watchlist_update","action":"updated","customer_id":"C1",
                "customer_name":"X","churn_probability":1.5,"risk_level":"high"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed { .. }));
    }

    #[test]
    fn parses_anomaly_with_details() {
        let msg = parse_server_message(
            r#"{"type":"anomaly_detected","customer_id":3,"customer_name":"Flo",
                "severity":"high","anomaly_score":-0.82,
                "anomaly_details":{"login_drop":0.7},
                "timestamp":"2026-10-18T12:00:00+00:00"}"#,
        )
        .unwrap();
        match msg {
            ServerMessage::AnomalyDetected(event) => {
                assert_eq!(event.severity, Severity::High);
                assert!(event.details.is_some());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_reported_by_name() {
        let err = parse_server_message(r#"{"type":"prediction_triggered"}"#).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnknownMessageType {
                type_name: "prediction_triggered".into()
            }
        );
    }

    #[test]
    fn non_json_and_untyped_frames_are_malformed() {
        assert!(matches!(
            parse_server_message("not json"),
            Err(ProtocolError::Malformed { .. })
        ));
        assert!(matches!(
            parse_server_message(r#"{"action":"added"}"#),
            Err(ProtocolError::Malformed { .. })
        ));
    }

    #[test]
    fn action_response_failure_is_rejection() {
        let body: ActionResponse =
            serde_json::from_str(r#"{"success":false,"message":"no such alert"}"#).unwrap();
        assert_eq!(
            body.into_result(),
            Err(TransportError::Rejected {
                reason: "no such alert".into()
            })
        );
        let ok: ActionResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(ok.into_result().is_ok());
        let empty: ActionResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.into_result().is_ok());
    }
}
