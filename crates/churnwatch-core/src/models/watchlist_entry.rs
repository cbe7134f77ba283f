use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::CustomerId;
use super::risk::RiskLevel;

/// A customer flagged for heightened churn-risk monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub customer_id: CustomerId,
    pub customer_name: String,
    /// Probability in [0, 1].
    pub churn_probability: f64,
    pub risk_level: RiskLevel,
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
    /// Version of the entry. Newer events win, older ones are rejected.
    #[serde(rename = "last_updated", alias = "last_updated_at", default = "Utc::now")]
    pub last_updated_at: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_context: Option<serde_json::Value>,
}

fn default_active() -> bool {
    true
}

impl WatchlistEntry {
    /// A freshly watched customer, stamped at `at`.
    pub fn new(
        customer_id: CustomerId,
        customer_name: impl Into<String>,
        churn_probability: f64,
        risk_level: RiskLevel,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            customer_id,
            customer_name: customer_name.into(),
            churn_probability,
            risk_level,
            added_at: at,
            last_updated_at: at,
            is_active: true,
            anomaly_context: None,
        }
    }

    /// Churn probability as a percentage with one decimal, e.g. `"90.0"`.
    pub fn churn_percent(&self) -> String {
        format!("{:.1}", self.churn_probability * 100.0)
    }
}
