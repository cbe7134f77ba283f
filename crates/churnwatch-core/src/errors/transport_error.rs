/// Failures reaching the backend over REST or a push channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {reason}")]
    Network { reason: String },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The backend answered but refused the operation.
    #[error("rejected by backend: {reason}")]
    Rejected { reason: String },

    #[error("{channel} channel is not open")]
    ChannelNotOpen { channel: String },

    #[error("handshake failed: {reason}")]
    Handshake { reason: String },
}
