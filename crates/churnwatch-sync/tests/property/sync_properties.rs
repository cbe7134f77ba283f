use std::collections::HashSet;

use chrono::{DateTime, Utc};
use proptest::prelude::*;

use churnwatch_core::models::{AlertId, CustomerId, RiskLevel, Severity};
use churnwatch_sync::reducer::{mark_resolved, reconcile_alerts, reduce};
use churnwatch_sync::transport::{AnomalyEvent, ServerMessage, WatchlistAction, WatchlistChange};
use churnwatch_sync::{ChannelStates, SyncSnapshot, SyncState};
use test_fixtures::builders::{server_alert, ts};

fn risk_for(p: f64) -> RiskLevel {
    if p >= 0.7 {
        RiskLevel::High
    } else if p >= 0.4 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn upsert(action: WatchlistAction, id: u8, p: f64, at: Option<DateTime<Utc>>) -> ServerMessage {
    ServerMessage::WatchlistUpdate(WatchlistChange::Upserted {
        action,
        customer_id: CustomerId::new(format!("C{id}")),
        customer_name: format!("Customer {id}"),
        churn_probability: p,
        risk_level: risk_for(p),
        timestamp: at,
    })
}

fn removed(id: u8, at: Option<DateTime<Utc>>) -> ServerMessage {
    ServerMessage::WatchlistUpdate(WatchlistChange::Removed {
        customer_id: CustomerId::new(format!("C{id}")),
        timestamp: at,
    })
}

/// Any inbound event over a small customer pool, with or without timestamp.
fn arb_message() -> impl Strategy<Value = ServerMessage> {
    let at = proptest::option::of((0i64..500).prop_map(ts));
    prop_oneof![
        (0u8..6, 0.0f64..=1.0, at.clone())
            .prop_map(|(id, p, at)| upsert(WatchlistAction::Added, id, p, at)),
        (0u8..6, 0.0f64..=1.0, at.clone())
            .prop_map(|(id, p, at)| upsert(WatchlistAction::Updated, id, p, at)),
        (0u8..6, at).prop_map(|(id, at)| removed(id, at)),
        (0u8..6, any::<bool>()).prop_map(|(id, success)| ServerMessage::RemovalResult {
            success,
            customer_id: CustomerId::new(format!("C{id}")),
        }),
        (0u8..6, 0i64..500, -1.0f64..0.0).prop_map(|(id, secs, score)| {
            ServerMessage::AnomalyDetected(AnomalyEvent {
                customer_id: CustomerId::new(format!("C{id}")),
                customer_name: format!("Customer {id}"),
                severity: Severity::High,
                anomaly_score: score,
                timestamp: Some(ts(secs)),
                details: None,
            })
        }),
    ]
}

fn apply_all(mut state: SyncState, messages: Vec<ServerMessage>) -> SyncState {
    for message in messages {
        if let Some(next) = reduce(&state, message, ts(1_000)).state {
            state = next;
        }
    }
    state
}

proptest! {
    #[test]
    fn customers_stay_unique(messages in prop::collection::vec(arb_message(), 0..60)) {
        let state = apply_all(SyncState::default(), messages);
        let mut seen = HashSet::new();
        for entry in state.entries() {
            prop_assert!(seen.insert(entry.customer_id.clone()), "duplicate {}", entry.customer_id);
        }
    }

    #[test]
    fn stats_match_a_fresh_count(messages in prop::collection::vec(arb_message(), 0..60)) {
        let mut state = SyncState::default();
        for message in messages {
            if let Some(next) = reduce(&state, message, ts(1_000)).state {
                state = next;
            }
            let snapshot = SyncSnapshot::build(&state, ChannelStates::default(), false);
            let stats = snapshot.stats();
            let entries = snapshot.entries();
            prop_assert_eq!(stats.total_watched, entries.len());
            prop_assert_eq!(
                stats.high_risk,
                entries.iter().filter(|e| e.risk_level == RiskLevel::High).count()
            );
            prop_assert_eq!(
                stats.medium_risk,
                entries.iter().filter(|e| e.risk_level == RiskLevel::Medium).count()
            );
            prop_assert_eq!(
                stats.active_alerts,
                snapshot.alert_history().iter().filter(|a| !a.is_resolved).count()
            );
        }
    }

    /// With distinct timestamps, the newest event for a customer decides the
    /// outcome no matter the arrival order.
    #[test]
    fn timestamped_events_are_order_independent(
        kinds in prop::collection::vec((any::<bool>(), 0.0f64..=1.0), 1..10),
        seed in any::<u64>(),
    ) {
        let events: Vec<(i64, bool, f64)> = kinds
            .iter()
            .enumerate()
            .map(|(i, (is_upsert, p))| (i as i64 * 10, *is_upsert, *p))
            .collect();
        let to_message = |(secs, is_upsert, p): (i64, bool, f64)| {
            if is_upsert {
                upsert(WatchlistAction::Updated, 1, p, Some(ts(secs)))
            } else {
                removed(1, Some(ts(secs)))
            }
        };

        let mut shuffled = events.clone();
        // Deterministic Fisher-Yates driven by the generated seed.
        let mut x = seed | 1;
        for i in (1..shuffled.len()).rev() {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            shuffled.swap(i, (x % (i as u64 + 1)) as usize);
        }

        let state = apply_all(
            SyncState::default(),
            shuffled.into_iter().map(to_message).collect(),
        );
        let newest = events.last().copied().unwrap();
        let held = state.entry(&CustomerId::new("C1"));
        if newest.1 {
            let held = held.expect("newest event is an upsert");
            prop_assert_eq!(held.last_updated_at, ts(newest.0));
            prop_assert!((held.churn_probability - newest.2).abs() < f64::EPSILON);
        } else {
            prop_assert!(held.is_none());
        }
    }

    #[test]
    fn resolution_is_never_undone(
        messages in prop::collection::vec(arb_message(), 0..30),
        refetch_unresolved in any::<bool>(),
    ) {
        let alert = server_alert("A1", "C0", Severity::Medium, ts(0));
        let state = SyncState::from_initial(Vec::new(), vec![alert.clone()]);
        let state = mark_resolved(&state, &AlertId::server("A1")).unwrap();

        let mut state = apply_all(state, messages);
        if refetch_unresolved {
            state = reconcile_alerts(&state, vec![alert]);
        }
        prop_assert!(state.alert(&AlertId::server("A1")).unwrap().is_resolved);
    }
}
