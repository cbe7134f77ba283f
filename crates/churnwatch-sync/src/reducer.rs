//! Event reducer: turns inbound push messages into state transitions.
//!
//! Every function here is pure. It reads the current [`SyncState`] and
//! returns a new one, so a reader holding the previous snapshot never sees a
//! half-applied change.
//!
//! Entries are versioned by `last_updated_at`. Timestamped events older than
//! the held version are rejected, and timestamped removals leave a tombstone
//! so a late `added` for the same customer cannot resurrect the entry.
//! Tombstones are kept for [`TOMBSTONE_RETENTION_SECS`] behind the newest
//! timestamped event. Alerts only ever move from unresolved to resolved.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, TimeDelta, Utc};

use churnwatch_core::constants::{ALERT_MATCH_WINDOW_SECS, TOMBSTONE_RETENTION_SECS};
use churnwatch_core::models::{Alert, AlertId, CustomerId, Notification, WatchlistEntry};

use crate::transport::protocol::{AnomalyEvent, ServerMessage, WatchlistAction, WatchlistChange};

/// The collections owned by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    entries: Vec<WatchlistEntry>,
    alerts: Vec<Alert>,
    /// Timestamp of the last confirmed removal per customer.
    tombstones: HashMap<CustomerId, DateTime<Utc>>,
}

impl SyncState {
    /// Build state from a REST load. Inactive entries are dropped and
    /// duplicate customers collapse to their newest version.
    pub fn from_initial(entries: Vec<WatchlistEntry>, alerts: Vec<Alert>) -> Self {
        let empty = SyncState::default();
        let with_entries = merge_watchlist(&empty, entries);
        reconcile_alerts(&with_entries, alerts)
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn entry(&self, customer_id: &CustomerId) -> Option<&WatchlistEntry> {
        self.entries.iter().find(|e| &e.customer_id == customer_id)
    }

    pub fn alert(&self, alert_id: &AlertId) -> Option<&Alert> {
        self.alerts.iter().find(|a| &a.id == alert_id)
    }

    pub fn tombstone(&self, customer_id: &CustomerId) -> Option<DateTime<Utc>> {
        self.tombstones.get(customer_id).copied()
    }
}

/// Why a message did or did not change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOutcome {
    Applied,
    /// Valid but carries nothing to apply (confirmations, duplicates).
    Ignored,
    /// Older than the version already held.
    Stale,
}

/// Result of reducing one message.
#[derive(Debug, Clone)]
pub struct Reduction {
    /// `None` when state is unchanged.
    pub state: Option<SyncState>,
    pub notifications: Vec<Notification>,
    pub outcome: ReduceOutcome,
}

impl Reduction {
    fn applied(state: SyncState, notifications: Vec<Notification>) -> Self {
        Self {
            state: Some(state),
            notifications,
            outcome: ReduceOutcome::Applied,
        }
    }

    fn unchanged(outcome: ReduceOutcome, notifications: Vec<Notification>) -> Self {
        Self {
            state: None,
            notifications,
            outcome,
        }
    }
}

/// Apply one validated server message. `now` stamps events that carry no
/// timestamp of their own.
pub fn reduce(state: &SyncState, message: ServerMessage, now: DateTime<Utc>) -> Reduction {
    match message {
        ServerMessage::WatchlistUpdate(WatchlistChange::Upserted {
            action,
            customer_id,
            customer_name,
            churn_probability,
            risk_level,
            timestamp,
        }) => {
            if is_stale(state, &customer_id, timestamp) {
                tracing::debug!("churnwatch: dropping stale {action:?} for {customer_id}");
                return Reduction::unchanged(ReduceOutcome::Stale, Vec::new());
            }
            let version = timestamp.unwrap_or(now);
            let previous = state.entry(&customer_id);
            let mut entry = WatchlistEntry::new(
                customer_id.clone(),
                customer_name,
                churn_probability,
                risk_level,
                version,
            );
            if let Some(prev) = previous {
                entry.added_at = prev.added_at;
                entry.anomaly_context = prev.anomaly_context.clone();
            }

            let mut notifications = Vec::new();
            if action == WatchlistAction::Added {
                notifications.push(Notification::warning(format!(
                    "{} added to watchlist ({}% churn risk)",
                    entry.customer_name,
                    entry.churn_percent()
                )));
            }

            let mut next = state.clone();
            next.entries.retain(|e| e.customer_id != customer_id);
            next.tombstones.remove(&customer_id);
            if let Some(ts) = timestamp {
                prune_tombstones(&mut next.tombstones, ts);
            }
            next.entries.insert(0, entry);
            Reduction::applied(next, notifications)
        }
        ServerMessage::WatchlistUpdate(WatchlistChange::Removed {
            customer_id,
            timestamp,
        }) => remove_entry(state, &customer_id, timestamp),
        ServerMessage::RemovalResult {
            success: true,
            customer_id,
        } => remove_entry(state, &customer_id, None),
        ServerMessage::RemovalResult {
            success: false,
            customer_id,
        } => Reduction::unchanged(
            ReduceOutcome::Ignored,
            vec![Notification::error(format!(
                "Failed to remove customer {customer_id} from watchlist"
            ))],
        ),
        ServerMessage::AnomalyDetected(event) => add_anomaly(state, event, now),
        ServerMessage::CurrentWatchlist(entries) => {
            Reduction::applied(merge_watchlist(state, entries), Vec::new())
        }
        ServerMessage::RecentAlerts(alerts) => {
            Reduction::applied(reconcile_alerts(state, alerts), Vec::new())
        }
        ServerMessage::SubscriptionConfirmed { message } => {
            tracing::debug!("churnwatch: subscription confirmed: {message}");
            Reduction::unchanged(ReduceOutcome::Ignored, Vec::new())
        }
        ServerMessage::Error { message } => {
            tracing::warn!("churnwatch: backend reported error: {message}");
            Reduction::unchanged(
                ReduceOutcome::Ignored,
                vec![Notification::error(format!("Server error: {message}"))],
            )
        }
    }
}

/// A timestamped event is stale when it predates the held entry or the
/// customer's removal tombstone.
fn is_stale(state: &SyncState, customer_id: &CustomerId, timestamp: Option<DateTime<Utc>>) -> bool {
    let Some(ts) = timestamp else {
        return false;
    };
    if state.tombstone(customer_id).is_some_and(|removed_at| ts < removed_at) {
        return true;
    }
    state
        .entry(customer_id)
        .is_some_and(|held| ts < held.last_updated_at)
}

fn remove_entry(
    state: &SyncState,
    customer_id: &CustomerId,
    timestamp: Option<DateTime<Utc>>,
) -> Reduction {
    if let Some(ts) = timestamp {
        if state
            .entry(customer_id)
            .is_some_and(|held| ts < held.last_updated_at)
        {
            return Reduction::unchanged(ReduceOutcome::Stale, Vec::new());
        }
    }

    let present = state.entry(customer_id).is_some();
    let newer_tombstone = match (timestamp, state.tombstone(customer_id)) {
        (Some(ts), Some(held)) => ts > held,
        (Some(_), None) => true,
        (None, _) => false,
    };
    if !present && !newer_tombstone {
        return Reduction::unchanged(ReduceOutcome::Ignored, Vec::new());
    }

    let mut next = state.clone();
    next.entries.retain(|e| &e.customer_id != customer_id);
    if let (Some(ts), true) = (timestamp, newer_tombstone) {
        next.tombstones.insert(customer_id.clone(), ts);
        prune_tombstones(&mut next.tombstones, ts);
    }
    Reduction::applied(next, Vec::new())
}

/// Forget tombstones too old to matter next to an event stamped `newest`.
fn prune_tombstones(tombstones: &mut HashMap<CustomerId, DateTime<Utc>>, newest: DateTime<Utc>) {
    let horizon = newest - TimeDelta::seconds(TOMBSTONE_RETENTION_SECS);
    tombstones.retain(|_, removed_at| *removed_at >= horizon);
}

fn add_anomaly(state: &SyncState, event: AnomalyEvent, now: DateTime<Utc>) -> Reduction {
    let detected_at = event.timestamp.unwrap_or(now);
    let alert = Alert::from_anomaly(
        event.customer_id,
        event.customer_name,
        event.severity,
        event.anomaly_score,
        detected_at,
    );
    if state.alerts.iter().any(|a| a.same_occurrence(&alert)) {
        return Reduction::unchanged(ReduceOutcome::Ignored, Vec::new());
    }

    let notification = Notification::error(format!("Anomaly detected for {}", alert.customer_name));
    let mut next = state.clone();
    next.alerts.insert(0, alert);
    Reduction::applied(next, vec![notification])
}

/// Merge an authoritative watchlist from the server.
///
/// The server list defines membership. For customers present on both sides
/// the newer version wins, so a push event that overtook the fetch is kept.
/// Entries removed after the server's version (tombstoned) stay removed.
pub fn merge_watchlist(state: &SyncState, fetched: Vec<WatchlistEntry>) -> SyncState {
    let mut seen: HashSet<CustomerId> = HashSet::new();
    let mut entries: Vec<WatchlistEntry> = Vec::with_capacity(fetched.len());

    for incoming in fetched.into_iter().filter(|e| e.is_active) {
        if state
            .tombstone(&incoming.customer_id)
            .is_some_and(|removed_at| incoming.last_updated_at < removed_at)
        {
            continue;
        }
        let chosen = match state.entry(&incoming.customer_id) {
            Some(held) if held.last_updated_at > incoming.last_updated_at => held.clone(),
            _ => incoming,
        };
        if seen.insert(chosen.customer_id.clone()) {
            entries.push(chosen);
        } else if let Some(slot) = entries
            .iter_mut()
            .find(|e| e.customer_id == chosen.customer_id)
        {
            if chosen.last_updated_at > slot.last_updated_at {
                *slot = chosen;
            }
        }
    }

    let mut tombstones = state.tombstones.clone();
    if let Some(newest) = entries.iter().map(|e| e.last_updated_at).max() {
        prune_tombstones(&mut tombstones, newest);
    }

    SyncState {
        entries,
        alerts: state.alerts.clone(),
        tombstones,
    }
}

/// Merge server alerts into local alerts.
///
/// A held alert with the same ID takes the server copy. An unconfirmed
/// local alert is paired with the server alert for the same customer whose
/// detection time is nearest, within [`ALERT_MATCH_WINDOW_SECS`], and is
/// replaced by it. Resolution is sticky: the merged alert is resolved if
/// either side is. Unmatched local alerts are kept. Result is newest first.
pub fn reconcile_alerts(state: &SyncState, fetched: Vec<Alert>) -> SyncState {
    let mut fetched_ids: HashSet<AlertId> = HashSet::new();
    let mut fetched: Vec<Alert> = fetched
        .into_iter()
        .filter(|a| fetched_ids.insert(a.id.clone()))
        .collect();
    let mut consumed: HashSet<usize> = HashSet::new();

    for incoming in fetched.iter_mut() {
        if let Some((i, held)) = state
            .alerts
            .iter()
            .enumerate()
            .find(|(_, held)| held.id == incoming.id)
        {
            consumed.insert(i);
            incoming.is_resolved |= held.is_resolved;
        }
    }

    // Closest pairs first, each side used once.
    let window = TimeDelta::seconds(ALERT_MATCH_WINDOW_SECS);
    let mut pairs: Vec<(TimeDelta, usize, usize)> = Vec::new();
    for (i, local) in state.alerts.iter().enumerate() {
        if local.id.is_confirmed() || consumed.contains(&i) {
            continue;
        }
        for (j, incoming) in fetched.iter().enumerate() {
            if let Some(gap) = local.occurrence_gap(incoming, window) {
                pairs.push((gap, i, j));
            }
        }
    }
    pairs.sort_by_key(|(gap, ..)| *gap);

    let mut absorbed: HashSet<usize> = HashSet::new();
    for (_, i, j) in pairs {
        if consumed.contains(&i) || absorbed.contains(&j) {
            continue;
        }
        consumed.insert(i);
        absorbed.insert(j);
        fetched[j].is_resolved |= state.alerts[i].is_resolved;
    }

    let mut alerts = fetched;
    alerts.extend(
        state
            .alerts
            .iter()
            .enumerate()
            .filter(|(i, _)| !consumed.contains(i))
            .map(|(_, a)| a.clone()),
    );
    alerts.sort_by(|a, b| b.detected_at.cmp(&a.detected_at));

    SyncState {
        entries: state.entries.clone(),
        alerts,
        tombstones: state.tombstones.clone(),
    }
}

/// Drop unconfirmed alerts detected before `cutoff`.
///
/// Run after a successful alert fetch covering everything since `cutoff`:
/// an older local alert has no server copy left to pair with and could
/// otherwise never be resolved.
pub fn expire_local_alerts(state: &SyncState, cutoff: DateTime<Utc>) -> SyncState {
    let mut next = state.clone();
    next.alerts.retain(|a| a.id.is_confirmed() || a.detected_at >= cutoff);
    next
}

/// Mark an alert resolved after the backend confirmed it. `None` if the
/// alert is not held.
pub fn mark_resolved(state: &SyncState, alert_id: &AlertId) -> Option<SyncState> {
    state.alert(alert_id)?;
    let mut next = state.clone();
    for alert in next.alerts.iter_mut().filter(|a| &a.id == alert_id) {
        alert.is_resolved = true;
    }
    Some(next)
}
