//! Derived aggregate computation.

use churnwatch_core::models::{Alert, DerivedStats, RiskLevel, WatchlistEntry};

/// Recompute the aggregate counts from the collections. O(n), no side effects.
pub fn compute_stats(entries: &[WatchlistEntry], alerts: &[Alert]) -> DerivedStats {
    let mut stats = DerivedStats {
        total_watched: entries.len(),
        ..DerivedStats::default()
    };
    for entry in entries {
        match entry.risk_level {
            RiskLevel::High => stats.high_risk += 1,
            RiskLevel::Medium => stats.medium_risk += 1,
            RiskLevel::Low => {}
        }
    }
    stats.active_alerts = alerts.iter().filter(|a| a.is_active()).count();
    stats
}
