use async_trait::async_trait;

use crate::errors::ChurnwatchResult;
use crate::models::ChannelKind;

/// Outbound half of an open push channel.
#[async_trait]
pub trait IPushSink: Send {
    async fn send_text(&mut self, text: String) -> ChurnwatchResult<()>;

    /// Close the channel from our side.
    async fn close(&mut self) -> ChurnwatchResult<()>;
}

/// Inbound half of an open push channel.
#[async_trait]
pub trait IPushStream: Send {
    /// Next text frame. `Some(Err(_))` reports a channel error, `None` means
    /// the channel is closed.
    async fn next_text(&mut self) -> Option<ChurnwatchResult<String>>;
}

/// An established push channel, split so both halves can be driven at once.
pub struct PushConnection {
    pub sink: Box<dyn IPushSink>,
    pub stream: Box<dyn IPushStream>,
}

impl std::fmt::Debug for PushConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushConnection").finish_non_exhaustive()
    }
}

/// Opens push channels (WebSocket in production).
#[async_trait]
pub trait IPushConnector: Send + Sync {
    /// Perform the handshake for `channel`.
    async fn open(&self, channel: ChannelKind) -> ChurnwatchResult<PushConnection>;
}
