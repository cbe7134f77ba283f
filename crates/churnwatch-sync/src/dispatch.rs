//! User-initiated actions against the backend.
//!
//! The dispatcher talks to the backend and the notifier only. It never
//! mutates [`SyncState`](crate::reducer::SyncState); the engine applies the
//! local consequence of a confirmed action itself.

use std::sync::Arc;

use tracing::Instrument;

use churnwatch_core::errors::{ChurnwatchResult, SyncError, TransportError};
use churnwatch_core::models::{AlertId, ChannelKind, CustomerId, Notification};
use churnwatch_core::traits::{INotifier, IWatchlistBackend};

use crate::connection::ChannelHandle;
use crate::transport::protocol::ClientMessage;

pub struct ActionDispatcher {
    backend: Arc<dyn IWatchlistBackend>,
    notifier: Arc<dyn INotifier>,
}

impl ActionDispatcher {
    pub fn new(backend: Arc<dyn IWatchlistBackend>, notifier: Arc<dyn INotifier>) -> Self {
        Self { backend, notifier }
    }

    /// Ask the server to drop a customer. Nothing is removed locally; the
    /// entry goes away when the server confirms over the watchlist channel.
    pub fn remove_from_watchlist(
        &self,
        channel: Option<&ChannelHandle>,
        customer_id: &CustomerId,
    ) -> ChurnwatchResult<()> {
        let message = ClientMessage::RemoveFromWatchlist {
            customer_id: customer_id.clone(),
        };
        let sent = match channel {
            Some(channel) => channel.send(&message),
            None => Err(TransportError::ChannelNotOpen {
                channel: ChannelKind::Watchlist.to_string(),
            }
            .into()),
        };
        if let Err(e) = sent {
            tracing::warn!("churnwatch: remove of {customer_id} not sent: {e}");
            self.notifier.notify(Notification::error(format!(
                "Cannot remove {customer_id}: watchlist connection is down"
            )));
            return Err(e);
        }
        tracing::debug!("churnwatch: remove requested for {customer_id}");
        Ok(())
    }

    /// Resolve an alert on the backend. `Ok` means the backend confirmed and
    /// the caller may mark the alert resolved locally.
    pub async fn resolve_alert(&self, alert_id: &AlertId) -> ChurnwatchResult<()> {
        if !alert_id.is_confirmed() {
            self.notifier.notify(Notification::warning(
                "Alert is not yet confirmed by the server",
            ));
            return Err(SyncError::UnconfirmedAlert {
                alert_id: alert_id.to_string(),
            }
            .into());
        }

        let resolved = self
            .backend
            .resolve_alert(alert_id)
            .instrument(churnwatch_observability::action_span!("resolve_alert", alert_id))
            .await;
        match resolved {
            Ok(()) => {
                tracing::info!("churnwatch: alert {alert_id} resolved");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("churnwatch: resolving alert {alert_id} failed: {e}");
                self.notifier
                    .notify(Notification::error("Failed to resolve alert"));
                Err(e)
            }
        }
    }

    /// Fire-and-forget anomaly scan. Results, if any, arrive over the alerts
    /// channel.
    pub async fn trigger_scan(&self, customer_id: &CustomerId) -> ChurnwatchResult<()> {
        let triggered = self
            .backend
            .trigger_anomaly(customer_id)
            .instrument(churnwatch_observability::action_span!("trigger_scan", customer_id))
            .await;
        match triggered {
            Ok(()) => {
                tracing::info!("churnwatch: anomaly scan triggered for {customer_id}");
                self.notifier
                    .notify(Notification::info("Anomaly detection triggered"));
                Ok(())
            }
            Err(e) => {
                tracing::warn!("churnwatch: anomaly scan for {customer_id} failed: {e}");
                self.notifier
                    .notify(Notification::error("Failed to trigger anomaly detection"));
                Err(e)
            }
        }
    }

    /// Surface a notification that originated outside an action.
    pub fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher").finish_non_exhaustive()
    }
}
