//! # churnwatch-core
//!
//! Foundation crate for the churnwatch sync engine.
//! Defines the watchlist/alert models, errors, configuration, constants,
//! and the traits the engine uses to reach the backend and the user.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::ChurnwatchConfig;
pub use errors::{ChurnwatchError, ChurnwatchResult};
pub use models::{
    Alert, AlertId, AlertType, ChannelKind, ConnectionState, CustomerId, DerivedStats,
    Notification, NotificationLevel, RiskFilter, RiskLevel, Severity, WatchlistEntry,
};
