use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AlertId, CustomerId};
use super::risk::Severity;

/// Kind of anomaly an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    AnomalyDetected,
    LoginDrop,
    PurchaseDrop,
    SessionAnomaly,
    PaymentIssues,
    SupportSpike,
    EngagementDrop,
    #[serde(other)]
    Other,
}

/// An anomaly alert raised for a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub alert_type: AlertType,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub anomaly_score: Option<f64>,
    pub detected_at: DateTime<Utc>,
    #[serde(default)]
    pub is_resolved: bool,
}

impl Alert {
    /// An unresolved alert built from a pushed anomaly. Gets a local ID.
    pub fn from_anomaly(
        customer_id: CustomerId,
        customer_name: impl Into<String>,
        severity: Severity,
        anomaly_score: f64,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AlertId::local(),
            customer_id,
            customer_name: customer_name.into(),
            alert_type: AlertType::AnomalyDetected,
            severity,
            description: format!("Anomaly detected (score: {anomaly_score:.3})"),
            anomaly_score: Some(anomaly_score),
            detected_at,
            is_resolved: false,
        }
    }

    /// Unresolved alerts count towards the active total.
    pub fn is_active(&self) -> bool {
        !self.is_resolved
    }

    /// Whether `other` describes the same anomaly, regardless of ID.
    pub fn same_occurrence(&self, other: &Alert) -> bool {
        self.customer_id == other.customer_id && self.detected_at == other.detected_at
    }

    /// Distance between the two detection times when both alerts are for
    /// the same customer and at most `window` apart.
    pub fn occurrence_gap(&self, other: &Alert, window: TimeDelta) -> Option<TimeDelta> {
        if self.customer_id != other.customer_id {
            return None;
        }
        let gap = (self.detected_at - other.detected_at).abs();
        (gap <= window).then_some(gap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_alert_type_maps_to_other() {
        let json = serde_json::json!({
            "id": 1,
            "customer_id": 2,
            "customer_name": "Cy",
            "alert_type": "something_new",
            "severity": "critical",
            "detected_at": "2026-10-01T10:00:00Z"
        });
        let alert: Alert = serde_json::from_value(json).unwrap();
        assert_eq!(alert.alert_type, AlertType::Other);
        assert_eq!(alert.severity, Severity::Critical);
        assert!(alert.is_active());
        assert!(alert.anomaly_score.is_none());
    }

    #[test]
    fn anomaly_description_uses_three_decimals() {
        let alert = Alert::from_anomaly("C1".into(), "Di", Severity::High, -0.81234, Utc::now());
        assert_eq!(alert.description, "Anomaly detected (score: -0.812)");
        assert!(!alert.id.is_confirmed());
    }

    #[test]
    fn occurrence_gap_is_symmetric_and_bounded() {
        let at = Utc::now();
        let pushed = Alert::from_anomaly("C1".into(), "Di", Severity::High, -0.5, at);
        let mut stored = pushed.clone();
        stored.id = AlertId::server("9");
        stored.detected_at = at - TimeDelta::seconds(2);

        let window = TimeDelta::seconds(60);
        assert_eq!(pushed.occurrence_gap(&stored, window), Some(TimeDelta::seconds(2)));
        assert_eq!(stored.occurrence_gap(&pushed, window), Some(TimeDelta::seconds(2)));
        assert_eq!(pushed.occurrence_gap(&stored, TimeDelta::seconds(1)), None);

        stored.customer_id = "C2".into();
        assert_eq!(pushed.occurrence_gap(&stored, window), None);
    }
}
