use serde::{Deserialize, Serialize};

/// Aggregate counts derived from the watchlist and alert collections.
///
/// Always recomputed from the collections, never updated incrementally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DerivedStats {
    pub total_watched: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub active_alerts: usize,
}
