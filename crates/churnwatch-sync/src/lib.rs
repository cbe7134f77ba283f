//! # churnwatch-sync
//!
//! Keeps a local mirror of the server's churn watchlist and anomaly alerts.
//!
//! The [`SyncEngine`] loads both collections over REST, then listens on two
//! independent push channels and folds every inbound event into its state
//! through the pure [`reducer`]. Readers get immutable [`SyncSnapshot`]s with
//! derived counts computed alongside the collections.
//!
//! The `live` feature (on by default) provides the HTTP and WebSocket
//! transports. Without it the engine runs against any
//! [`IWatchlistBackend`](churnwatch_core::traits::IWatchlistBackend) and
//! [`IPushConnector`](churnwatch_core::traits::IPushConnector).

pub mod connection;
pub mod dispatch;
pub mod engine;
pub mod notify;
pub mod reconnect;
pub mod reducer;
pub mod snapshot;
pub mod stats;
pub mod transport;

pub use connection::{ChannelEvent, ChannelHandle};
pub use dispatch::ActionDispatcher;
pub use engine::{EngineOptions, EngineStatus, SyncEngine};
pub use notify::{ChannelNotifier, TracingNotifier};
pub use reconnect::ReconnectPolicy;
pub use reducer::{ReduceOutcome, Reduction, SyncState};
pub use snapshot::{ChannelStates, SyncSnapshot};
pub use stats::compute_stats;
