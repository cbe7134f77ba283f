use async_trait::async_trait;

use crate::errors::ChurnwatchResult;
use crate::models::{Alert, AlertId, CustomerId, WatchlistEntry};

/// REST side of the churn backend.
#[async_trait]
pub trait IWatchlistBackend: Send + Sync {
    /// Current watchlist entries.
    async fn fetch_watchlist(&self) -> ChurnwatchResult<Vec<WatchlistEntry>>;

    /// Alerts detected within the last `hours`.
    async fn fetch_alerts(&self, hours: u32) -> ChurnwatchResult<Vec<Alert>>;

    /// Mark an alert resolved. `Ok` only when the backend confirmed.
    async fn resolve_alert(&self, alert_id: &AlertId) -> ChurnwatchResult<()>;

    /// Ask the backend to run anomaly detection for one customer.
    async fn trigger_anomaly(&self, customer_id: &CustomerId) -> ChurnwatchResult<()>;
}
