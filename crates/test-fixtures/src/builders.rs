//! Builders for models and push frames.

use chrono::{DateTime, Utc};
use serde_json::json;

use churnwatch_core::models::{
    Alert, AlertId, AlertType, RiskLevel, Severity, WatchlistEntry,
};

/// Fixed test clock. `ts(n)` is `n` seconds after an arbitrary epoch.
pub fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_790_000_000 + secs, 0).expect("timestamp in range")
}

pub fn entry(customer_id: &str, churn_probability: f64, risk_level: RiskLevel) -> WatchlistEntry {
    entry_at(customer_id, churn_probability, risk_level, ts(0))
}

pub fn entry_at(
    customer_id: &str,
    churn_probability: f64,
    risk_level: RiskLevel,
    at: DateTime<Utc>,
) -> WatchlistEntry {
    WatchlistEntry::new(
        customer_id.into(),
        format!("Customer {customer_id}"),
        churn_probability,
        risk_level,
        at,
    )
}

/// An unresolved alert with a server-assigned ID.
pub fn server_alert(
    id: &str,
    customer_id: &str,
    severity: Severity,
    detected_at: DateTime<Utc>,
) -> Alert {
    Alert {
        id: AlertId::server(id),
        customer_id: customer_id.into(),
        customer_name: format!("Customer {customer_id}"),
        alert_type: AlertType::AnomalyDetected,
        severity,
        description: String::new(),
        anomaly_score: Some(-0.5),
        detected_at,
        is_resolved: false,
    }
}

pub fn added_frame(customer_id: &str, churn_probability: f64, risk_level: RiskLevel) -> String {
    json!({
        "type": "watchlist_update",
        "action": "added",
        "customer_id": customer_id,
        "customer_name": format!("Customer {customer_id}"),
        "churn_probability": churn_probability,
        "risk_level": risk_level.as_str(),
    })
    .to_string()
}

pub fn upsert_frame_at(
    action: &str,
    customer_id: &str,
    churn_probability: f64,
    risk_level: RiskLevel,
    at: DateTime<Utc>,
) -> String {
    json!({
        "type": "watchlist_update",
        "action": action,
        "customer_id": customer_id,
        "customer_name": format!("Customer {customer_id}"),
        "churn_probability": churn_probability,
        "risk_level": risk_level.as_str(),
        "timestamp": at.to_rfc3339(),
    })
    .to_string()
}

pub fn removed_frame(customer_id: &str) -> String {
    json!({
        "type": "watchlist_update",
        "action": "removed",
        "customer_id": customer_id,
    })
    .to_string()
}

pub fn removed_frame_at(customer_id: &str, at: DateTime<Utc>) -> String {
    json!({
        "type": "watchlist_update",
        "action": "removed",
        "customer_id": customer_id,
        "timestamp": at.to_rfc3339(),
    })
    .to_string()
}

pub fn anomaly_frame(
    customer_id: &str,
    severity: Severity,
    anomaly_score: f64,
    at: DateTime<Utc>,
) -> String {
    let severity = serde_json::to_value(severity).expect("severity serializes");
    json!({
        "type": "anomaly_detected",
        "customer_id": customer_id,
        "customer_name": format!("Customer {customer_id}"),
        "severity": severity,
        "anomaly_score": anomaly_score,
        "timestamp": at.to_rfc3339(),
    })
    .to_string()
}

pub fn removal_result_frame(customer_id: &str, success: bool) -> String {
    json!({
        "type": "removal_result",
        "success": success,
        "customer_id": customer_id,
    })
    .to_string()
}
