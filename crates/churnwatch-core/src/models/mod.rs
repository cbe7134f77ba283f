mod alert;
mod connection;
mod ids;
mod notification;
mod risk;
mod stats;
mod watchlist_entry;

pub use alert::{Alert, AlertType};
pub use connection::{ChannelKind, ConnectionState};
pub use ids::{AlertId, CustomerId};
pub use notification::{Notification, NotificationLevel};
pub use risk::{RiskFilter, RiskLevel, Severity};
pub use stats::DerivedStats;
pub use watchlist_entry::WatchlistEntry;
