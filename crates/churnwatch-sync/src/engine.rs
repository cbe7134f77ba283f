//! SyncEngine: initial load, push channel fan-in, actions and teardown.
//!
//! The engine is the only owner of [`SyncState`]. Channel tasks enqueue
//! [`ChannelEvent`]s and the engine applies them one at a time through the
//! reducer, publishing a fresh [`SyncSnapshot`] after every change.

use std::future::Future;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

use churnwatch_core::config::ChurnwatchConfig;
use churnwatch_core::config::defaults::DEFAULT_ALERT_WINDOW_HOURS;
use churnwatch_core::errors::{ChurnwatchResult, SyncError};
use churnwatch_core::models::{
    AlertId, ChannelKind, ConnectionState, CustomerId, Notification,
};
use churnwatch_core::traits::{INotifier, IPushConnector, IWatchlistBackend};

use crate::connection::{ChannelEvent, ChannelHandle};
use crate::dispatch::ActionDispatcher;
use crate::reconnect::ReconnectPolicy;
use crate::reducer::{self, ReduceOutcome, SyncState};
use crate::snapshot::{ChannelStates, SyncSnapshot};
use crate::transport::parse_server_message;

/// Lifecycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Constructed, `start` not called yet.
    Idle,
    /// Initial REST load in flight.
    Loading,
    /// Channels spawned, applying pushed events.
    Live,
    /// Torn down. Terminal.
    Disposed,
}

/// Tunables taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub reconnect: ReconnectPolicy,
    pub alert_window_hours: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            reconnect: ReconnectPolicy::default(),
            alert_window_hours: DEFAULT_ALERT_WINDOW_HOURS,
        }
    }
}

impl From<&ChurnwatchConfig> for EngineOptions {
    fn from(config: &ChurnwatchConfig) -> Self {
        Self {
            reconnect: ReconnectPolicy::from(&config.reconnect),
            alert_window_hours: config.backend.alert_window_hours,
        }
    }
}

pub struct SyncEngine {
    backend: Arc<dyn IWatchlistBackend>,
    connector: Arc<dyn IPushConnector>,
    dispatcher: ActionDispatcher,
    options: EngineOptions,
    state: SyncState,
    channels: ChannelStates,
    status: EngineStatus,
    watchlist: Option<ChannelHandle>,
    alerts: Option<ChannelHandle>,
    events_tx: mpsc::UnboundedSender<ChannelEvent>,
    events_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    snapshot_tx: watch::Sender<Arc<SyncSnapshot>>,
}

impl SyncEngine {
    pub fn new(
        backend: Arc<dyn IWatchlistBackend>,
        connector: Arc<dyn IPushConnector>,
        notifier: Arc<dyn INotifier>,
        options: EngineOptions,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(Arc::new(SyncSnapshot::empty()));
        Self {
            dispatcher: ActionDispatcher::new(Arc::clone(&backend), notifier),
            backend,
            connector,
            options,
            state: SyncState::default(),
            channels: ChannelStates::default(),
            status: EngineStatus::Idle,
            watchlist: None,
            alerts: None,
            events_tx,
            events_rx,
            snapshot_tx,
        }
    }

    /// Engine wired to the HTTP backend and WebSocket channels described by
    /// `config`.
    #[cfg(feature = "live")]
    pub fn from_config(
        config: &ChurnwatchConfig,
        notifier: Arc<dyn INotifier>,
    ) -> ChurnwatchResult<Self> {
        use crate::transport::{HttpBackend, HttpClientConfig, WsConnector};

        let backend = HttpBackend::new(HttpClientConfig::from(&config.backend))?;
        let connector = WsConnector::from_config(&config.backend);
        Ok(Self::new(
            Arc::new(backend),
            Arc::new(connector),
            notifier,
            EngineOptions::from(config),
        ))
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn is_disposed(&self) -> bool {
        self.status == EngineStatus::Disposed
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<SyncSnapshot> {
        self.snapshot_tx.borrow().clone()
    }

    /// Receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SyncSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Connection attempts made by a channel's current task.
    pub fn connect_attempts(&self, channel: ChannelKind) -> Option<u32> {
        self.handle(channel).map(ChannelHandle::connect_attempts)
    }

    /// Load the watchlist and recent alerts concurrently, then open both
    /// push channels. A failed fetch is reported and leaves that collection
    /// empty; the engine goes live regardless.
    pub async fn start(&mut self) -> ChurnwatchResult<()> {
        match self.status {
            EngineStatus::Disposed => return Err(SyncError::Disposed.into()),
            EngineStatus::Loading | EngineStatus::Live => {
                tracing::warn!("churnwatch: start called twice, ignoring");
                return Ok(());
            }
            EngineStatus::Idle => {}
        }

        self.status = EngineStatus::Loading;
        self.publish();
        tracing::info!("churnwatch: loading initial state");

        let hours = self.options.alert_window_hours;
        let (entries, alerts) = async {
            tokio::join!(
                self.backend.fetch_watchlist(),
                self.backend.fetch_alerts(hours),
            )
        }
        .instrument(churnwatch_observability::initial_load_span!(hours))
        .await;
        let entries = entries.unwrap_or_else(|e| {
            tracing::error!("churnwatch: initial watchlist load failed: {e}");
            self.dispatcher
                .notify(Notification::error("Failed to load watchlist"));
            Vec::new()
        });
        let alerts = alerts.unwrap_or_else(|e| {
            tracing::error!("churnwatch: initial alerts load failed: {e}");
            self.dispatcher
                .notify(Notification::error("Failed to load alerts"));
            Vec::new()
        });

        self.state = SyncState::from_initial(entries, alerts);
        tracing::info!(
            "churnwatch: loaded {} watchlist entries and {} alerts",
            self.state.entries().len(),
            self.state.alerts().len()
        );

        for kind in ChannelKind::ALL {
            self.spawn_channel(kind);
        }
        self.status = EngineStatus::Live;
        self.publish();
        Ok(())
    }

    /// Wait for the next channel event and apply it. `None` once disposed.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        if self.is_disposed() {
            return None;
        }
        let event = self.events_rx.recv().await?;
        self.handle_event(event.clone()).await;
        Some(event)
    }

    /// Apply every event already queued without waiting. Returns how many
    /// were applied.
    pub async fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while !self.is_disposed() {
            let Ok(event) = self.events_rx.try_recv() else {
                break;
            };
            self.handle_event(event).await;
            applied += 1;
        }
        applied
    }

    /// Apply events until `shutdown` resolves, then tear down.
    pub async fn run_until(&mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        while !self.is_disposed() {
            let event = tokio::select! {
                _ = &mut shutdown => None,
                event = self.events_rx.recv() => event,
            };
            match event {
                Some(event) => self.handle_event(event).await,
                None => break,
            }
        }
        self.shutdown().await;
    }

    /// Reload both collections over REST and reconcile them with what is
    /// held. Runs after a channel comes back, since pushes sent while it was
    /// down were missed.
    pub async fn refetch(&mut self) -> ChurnwatchResult<()> {
        if self.is_disposed() {
            return Err(SyncError::Disposed.into());
        }
        let hours = self.options.alert_window_hours;
        let (entries, alerts) = async {
            tokio::join!(
                self.backend.fetch_watchlist(),
                self.backend.fetch_alerts(hours),
            )
        }
        .instrument(churnwatch_observability::refetch_span!())
        .await;

        let mut first_error = None;
        match entries {
            Ok(entries) => self.state = reducer::merge_watchlist(&self.state, entries),
            Err(e) => {
                tracing::warn!("churnwatch: watchlist refetch failed: {e}");
                first_error = Some(e);
            }
        }
        match alerts {
            Ok(alerts) => {
                let cutoff = Utc::now() - TimeDelta::hours(i64::from(hours));
                let merged = reducer::reconcile_alerts(&self.state, alerts);
                self.state = reducer::expire_local_alerts(&merged, cutoff);
            }
            Err(e) => {
                tracing::warn!("churnwatch: alerts refetch failed: {e}");
                first_error.get_or_insert(e);
            }
        }
        self.publish();

        match first_error {
            Some(e) => {
                self.dispatcher
                    .notify(Notification::error("Failed to refresh watchlist data"));
                Err(e)
            }
            None => Ok(()),
        }
    }

    /// Ask the server to remove a customer. The entry stays until the
    /// server confirms over the watchlist channel.
    pub fn remove_from_watchlist(&self, customer_id: &CustomerId) -> ChurnwatchResult<()> {
        if self.is_disposed() {
            return Err(SyncError::Disposed.into());
        }
        self.dispatcher
            .remove_from_watchlist(self.watchlist.as_ref(), customer_id)
    }

    /// Resolve an alert on the backend, then mark it resolved locally.
    pub async fn resolve_alert(&mut self, alert_id: &AlertId) -> ChurnwatchResult<()> {
        if self.is_disposed() {
            return Err(SyncError::Disposed.into());
        }
        if self.state.alert(alert_id).is_none() {
            return Err(SyncError::AlertNotFound {
                alert_id: alert_id.to_string(),
            }
            .into());
        }

        self.dispatcher.resolve_alert(alert_id).await?;

        if let Some(next) = reducer::mark_resolved(&self.state, alert_id) {
            self.state = next;
            self.publish();
        }
        self.dispatcher
            .notify(Notification::info("Alert resolved successfully"));
        Ok(())
    }

    /// Ask the backend to run anomaly detection. Nothing changes locally.
    pub async fn trigger_scan(&self, customer_id: &CustomerId) -> ChurnwatchResult<()> {
        if self.is_disposed() {
            return Err(SyncError::Disposed.into());
        }
        self.dispatcher.trigger_scan(customer_id).await
    }

    /// Replace a channel's task with a fresh one. Used after the reconnect
    /// policy gave up.
    pub async fn reconnect_channel(&mut self, channel: ChannelKind) -> ChurnwatchResult<()> {
        if self.is_disposed() {
            return Err(SyncError::Disposed.into());
        }
        if let Some(mut old) = self.slot(channel).take() {
            old.close().await;
        }
        tracing::info!("churnwatch: restarting {channel} channel");
        self.spawn_channel(channel);
        Ok(())
    }

    /// Dispose both channels. No connection attempt is made afterwards and
    /// every later action fails with [`SyncError::Disposed`].
    pub async fn shutdown(&mut self) {
        if self.is_disposed() {
            return;
        }
        self.status = EngineStatus::Disposed;

        for kind in ChannelKind::ALL {
            if let Some(mut handle) = self.slot(kind).take() {
                handle.close().await;
            }
            self.channels.set(kind, ConnectionState::Disposed);
        }

        let mut discarded = 0usize;
        while self.events_rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            tracing::debug!("churnwatch: discarded {discarded} events after teardown");
        }

        self.publish();
        tracing::info!("churnwatch: engine shut down");
    }

    async fn handle_event(&mut self, event: ChannelEvent) {
        if self.is_disposed() {
            return;
        }
        match event {
            ChannelEvent::State { channel, state } => {
                self.channels.set(channel, state);
                self.publish();
            }
            ChannelEvent::Frame { channel, text } => self.apply_frame(channel, &text),
            ChannelEvent::Reconnected { channel } => {
                tracing::info!("churnwatch: {channel} channel back, refetching");
                // Failures are already logged and notified.
                let _ = self.refetch().await;
            }
            ChannelEvent::GaveUp { channel, attempts } => {
                self.channels.set(channel, ConnectionState::Closed);
                self.publish();
                self.dispatcher.notify(Notification::error(format!(
                    "Lost {channel} updates after {attempts} reconnection attempts"
                )));
            }
        }
    }

    fn apply_frame(&mut self, channel: ChannelKind, text: &str) {
        let message = match parse_server_message(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("churnwatch: dropping frame on {channel} channel: {e}");
                return;
            }
        };

        let reduction = reducer::reduce(&self.state, message, Utc::now());
        for notification in reduction.notifications {
            self.dispatcher.notify(notification);
        }
        if reduction.outcome == ReduceOutcome::Stale {
            tracing::debug!("churnwatch: stale event on {channel} channel ignored");
        }
        if let Some(next) = reduction.state {
            self.state = next;
            self.publish();
        }
    }

    fn spawn_channel(&mut self, channel: ChannelKind) {
        let handle = ChannelHandle::spawn(
            channel,
            Arc::clone(&self.connector),
            self.options.reconnect,
            self.events_tx.clone(),
        );
        *self.slot(channel) = Some(handle);
    }

    fn handle(&self, channel: ChannelKind) -> Option<&ChannelHandle> {
        match channel {
            ChannelKind::Watchlist => self.watchlist.as_ref(),
            ChannelKind::Alerts => self.alerts.as_ref(),
        }
    }

    fn slot(&mut self, channel: ChannelKind) -> &mut Option<ChannelHandle> {
        match channel {
            ChannelKind::Watchlist => &mut self.watchlist,
            ChannelKind::Alerts => &mut self.alerts,
        }
    }

    fn publish(&self) {
        let loading = matches!(self.status, EngineStatus::Idle | EngineStatus::Loading);
        let snapshot = SyncSnapshot::build(&self.state, self.channels, loading);
        self.snapshot_tx.send_replace(Arc::new(snapshot));
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("status", &self.status)
            .field("channels", &self.channels)
            .field("entries", &self.state.entries().len())
            .field("alerts", &self.state.alerts().len())
            .finish_non_exhaustive()
    }
}
