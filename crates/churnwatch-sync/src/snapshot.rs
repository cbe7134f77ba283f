//! Read-only views handed to the rendering layer.

use std::sync::Arc;

use churnwatch_core::models::{
    Alert, ChannelKind, ConnectionState, CustomerId, DerivedStats, RiskFilter, WatchlistEntry,
};

use crate::reducer::SyncState;
use crate::stats::compute_stats;

/// Connection state of both push channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelStates {
    pub watchlist: ConnectionState,
    pub alerts: ConnectionState,
}

impl ChannelStates {
    pub fn get(&self, channel: ChannelKind) -> ConnectionState {
        match channel {
            ChannelKind::Watchlist => self.watchlist,
            ChannelKind::Alerts => self.alerts,
        }
    }

    pub fn set(&mut self, channel: ChannelKind, state: ConnectionState) {
        match channel {
            ChannelKind::Watchlist => self.watchlist = state,
            ChannelKind::Alerts => self.alerts = state,
        }
    }
}

/// Immutable picture of the engine state at one point in time.
///
/// `stats` is computed from the collections when the snapshot is built and
/// cannot be set independently.
#[derive(Debug, Clone)]
pub struct SyncSnapshot {
    entries: Arc<[WatchlistEntry]>,
    alerts: Arc<[Alert]>,
    stats: DerivedStats,
    pub channels: ChannelStates,
    pub loading: bool,
}

impl SyncSnapshot {
    pub fn build(state: &SyncState, channels: ChannelStates, loading: bool) -> Self {
        Self {
            entries: state.entries().into(),
            alerts: state.alerts().into(),
            stats: compute_stats(state.entries(), state.alerts()),
            channels,
            loading,
        }
    }

    pub fn empty() -> Self {
        Self::build(&SyncState::default(), ChannelStates::default(), true)
    }

    pub fn stats(&self) -> DerivedStats {
        self.stats
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    /// Watchlist entries passing `filter`, in display order.
    pub fn watchlist(&self, filter: RiskFilter) -> Vec<&WatchlistEntry> {
        self.entries
            .iter()
            .filter(|e| filter.matches(e.risk_level))
            .collect()
    }

    pub fn entry(&self, customer_id: &CustomerId) -> Option<&WatchlistEntry> {
        self.entries.iter().find(|e| &e.customer_id == customer_id)
    }

    /// Unresolved alerts, the live-alerts view.
    pub fn active_alerts(&self) -> Vec<&Alert> {
        self.alerts.iter().filter(|a| a.is_active()).collect()
    }

    /// Every held alert, resolved ones included.
    pub fn alert_history(&self) -> &[Alert] {
        &self.alerts
    }

    /// The watchlist channel drives the LIVE indicator.
    pub fn is_live(&self) -> bool {
        self.channels.watchlist.is_open()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use churnwatch_core::models::{RiskLevel, Severity};

    use super::*;

    #[test]
    fn filters_and_views() {
        let entries = vec![
            WatchlistEntry::new("a".into(), "a", 0.9, RiskLevel::High, Utc::now()),
            WatchlistEntry::new("b".into(), "b", 0.4, RiskLevel::Medium, Utc::now()),
        ];
        let mut resolved = Alert::from_anomaly("a".into(), "a", Severity::High, -0.9, Utc::now());
        resolved.is_resolved = true;
        let open = Alert::from_anomaly("b".into(), "b", Severity::Low, -0.2, Utc::now());
        let state = SyncState::from_initial(entries, vec![resolved, open]);

        let snap = SyncSnapshot::build(&state, ChannelStates::default(), false);
        assert_eq!(snap.watchlist(RiskFilter::All).len(), 2);
        assert_eq!(snap.watchlist(RiskFilter::Only(RiskLevel::High)).len(), 1);
        assert!(snap.watchlist(RiskFilter::Only(RiskLevel::Low)).is_empty());
        assert_eq!(snap.active_alerts().len(), 1);
        assert_eq!(snap.alert_history().len(), 2);
        assert_eq!(snap.stats().active_alerts, 1);
        assert!(!snap.is_live());
    }

    #[test]
    fn channel_states_round_trip() {
        let mut channels = ChannelStates::default();
        channels.set(ChannelKind::Alerts, ConnectionState::Open);
        assert_eq!(channels.get(ChannelKind::Alerts), ConnectionState::Open);
        assert_eq!(channels.get(ChannelKind::Watchlist), ConnectionState::Connecting);
    }
}
