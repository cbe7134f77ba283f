use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Barrier;

use churnwatch_core::errors::{ChurnwatchResult, TransportError};
use churnwatch_core::models::{Alert, AlertId, CustomerId, WatchlistEntry};
use churnwatch_core::traits::IWatchlistBackend;

#[derive(Debug)]
struct Responses {
    watchlist: Result<Vec<WatchlistEntry>, TransportError>,
    alerts: Result<Vec<Alert>, TransportError>,
    resolve: Result<(), TransportError>,
    trigger: Result<(), TransportError>,
}

impl Default for Responses {
    fn default() -> Self {
        Self {
            watchlist: Ok(Vec::new()),
            alerts: Ok(Vec::new()),
            resolve: Ok(()),
            trigger: Ok(()),
        }
    }
}

/// In-memory [`IWatchlistBackend`] with canned answers and call counters.
#[derive(Debug, Default)]
pub struct FakeBackend {
    responses: Mutex<Responses>,
    fetch_gate: Mutex<Option<Arc<Barrier>>>,
    watchlist_calls: AtomicUsize,
    alerts_calls: AtomicUsize,
    resolved: Mutex<Vec<AlertId>>,
    triggered: Mutex<Vec<CustomerId>>,
    last_alert_window: Mutex<Option<u32>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_watchlist(self, entries: Vec<WatchlistEntry>) -> Self {
        self.set_watchlist(Ok(entries));
        self
    }

    pub fn with_alerts(self, alerts: Vec<Alert>) -> Self {
        self.set_alerts(Ok(alerts));
        self
    }

    /// Make both fetches wait for each other. A sequential loader deadlocks.
    pub fn with_concurrent_fetch_gate(self) -> Self {
        *self.fetch_gate.lock().expect("backend lock poisoned") = Some(Arc::new(Barrier::new(2)));
        self
    }

    pub fn set_watchlist(&self, result: Result<Vec<WatchlistEntry>, TransportError>) {
        self.lock().watchlist = result;
    }

    pub fn set_alerts(&self, result: Result<Vec<Alert>, TransportError>) {
        self.lock().alerts = result;
    }

    pub fn set_resolve(&self, result: Result<(), TransportError>) {
        self.lock().resolve = result;
    }

    pub fn set_trigger(&self, result: Result<(), TransportError>) {
        self.lock().trigger = result;
    }

    pub fn watchlist_calls(&self) -> usize {
        self.watchlist_calls.load(Ordering::SeqCst)
    }

    pub fn alerts_calls(&self) -> usize {
        self.alerts_calls.load(Ordering::SeqCst)
    }

    /// Alert IDs passed to `resolve_alert`, in call order.
    pub fn resolved(&self) -> Vec<AlertId> {
        self.resolved.lock().expect("backend lock poisoned").clone()
    }

    /// Customer IDs passed to `trigger_anomaly`, in call order.
    pub fn triggered(&self) -> Vec<CustomerId> {
        self.triggered.lock().expect("backend lock poisoned").clone()
    }

    pub fn last_alert_window(&self) -> Option<u32> {
        *self.last_alert_window.lock().expect("backend lock poisoned")
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Responses> {
        self.responses.lock().expect("backend lock poisoned")
    }

    async fn pass_gate(&self) {
        let gate = self.fetch_gate.lock().expect("backend lock poisoned").clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
    }
}

#[async_trait]
impl IWatchlistBackend for FakeBackend {
    async fn fetch_watchlist(&self) -> ChurnwatchResult<Vec<WatchlistEntry>> {
        self.watchlist_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        Ok(self.lock().watchlist.clone()?)
    }

    async fn fetch_alerts(&self, hours: u32) -> ChurnwatchResult<Vec<Alert>> {
        self.alerts_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_alert_window.lock().expect("backend lock poisoned") = Some(hours);
        self.pass_gate().await;
        Ok(self.lock().alerts.clone()?)
    }

    async fn resolve_alert(&self, alert_id: &AlertId) -> ChurnwatchResult<()> {
        self.resolved
            .lock()
            .expect("backend lock poisoned")
            .push(alert_id.clone());
        Ok(self.lock().resolve.clone()?)
    }

    async fn trigger_anomaly(&self, customer_id: &CustomerId) -> ChurnwatchResult<()> {
        self.triggered
            .lock()
            .expect("backend lock poisoned")
            .push(customer_id.clone());
        Ok(self.lock().trigger.clone()?)
    }
}
