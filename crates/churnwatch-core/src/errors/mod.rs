//! Error taxonomy. Every subsystem error converts into [`ChurnwatchError`].

mod config_error;
mod protocol_error;
mod sync_error;
mod transport_error;

pub use config_error::ConfigError;
pub use protocol_error::ProtocolError;
pub use sync_error::SyncError;
pub use transport_error::TransportError;

/// Top-level error of the churnwatch crates.
#[derive(Debug, thiserror::Error)]
pub enum ChurnwatchError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChurnwatchError {
    /// Connectivity failures are recovered by retrying or reconnecting.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            ChurnwatchError::Transport(
                TransportError::Network { .. }
                    | TransportError::Handshake { .. }
                    | TransportError::ChannelNotOpen { .. }
            )
        )
    }
}

pub type ChurnwatchResult<T> = Result<T, ChurnwatchError>;
