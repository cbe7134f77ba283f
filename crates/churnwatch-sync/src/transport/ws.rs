//! WebSocket push transport.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use churnwatch_core::config::BackendConfig;
use churnwatch_core::errors::{ChurnwatchResult, TransportError};
use churnwatch_core::models::ChannelKind;
use churnwatch_core::traits::{IPushConnector, IPushSink, IPushStream, PushConnection};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens push channels over WebSocket.
#[derive(Debug, Clone)]
pub struct WsConnector {
    ws_url: String,
}

impl WsConnector {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.ws_url.clone())
    }

    pub fn channel_url(&self, channel: ChannelKind) -> String {
        format!("{}{}", self.ws_url, channel.path())
    }
}

#[async_trait]
impl IPushConnector for WsConnector {
    async fn open(&self, channel: ChannelKind) -> ChurnwatchResult<PushConnection> {
        let url = self.channel_url(channel);
        let (ws, _response) =
            connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::Handshake {
                    reason: format!("{url}: {e}"),
                })?;
        let (sink, stream) = ws.split();
        Ok(PushConnection {
            sink: Box::new(WsSink { inner: sink }),
            stream: Box::new(WsReader {
                inner: stream,
                failed: false,
            }),
        })
    }
}

struct WsSink {
    inner: SplitSink<WsStream, Message>,
}

#[async_trait]
impl IPushSink for WsSink {
    async fn send_text(&mut self, text: String) -> ChurnwatchResult<()> {
        self.inner
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Network {
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn close(&mut self) -> ChurnwatchResult<()> {
        self.inner.close().await.map_err(|e| TransportError::Network {
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

struct WsReader {
    inner: SplitStream<WsStream>,
    /// After an error the socket is unusable; report it once, then close.
    failed: bool,
}

#[async_trait]
impl IPushStream for WsReader {
    async fn next_text(&mut self) -> Option<ChurnwatchResult<String>> {
        if self.failed {
            return None;
        }
        loop {
            match self.inner.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => tracing::debug!("churnwatch: dropping non-UTF-8 binary frame"),
                },
                Ok(Message::Close(_)) => return None,
                // Ping/pong are answered by tungstenite.
                Ok(_) => {}
                Err(e) => {
                    self.failed = true;
                    return Some(Err(TransportError::Network {
                        reason: e.to_string(),
                    }
                    .into()));
                }
            }
        }
    }
}
