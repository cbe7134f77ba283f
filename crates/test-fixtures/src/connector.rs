use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;

use churnwatch_core::errors::{ChurnwatchResult, TransportError};
use churnwatch_core::models::ChannelKind;
use churnwatch_core::traits::{IPushConnector, IPushSink, IPushStream, PushConnection};

/// What the fake server side pushes into an open session.
#[derive(Debug)]
enum ServerFrame {
    Text(String),
    Error(String),
}

#[derive(Debug, Default)]
struct ChannelScript {
    /// Handshakes to refuse before accepting again.
    refuse_next: usize,
    refuse_all: bool,
    opens: usize,
    sent: Vec<String>,
    /// Server side of the live session, if any.
    server: Option<mpsc::UnboundedSender<ServerFrame>>,
}

/// Scriptable [`IPushConnector`]. Tests push frames into open sessions,
/// drop them from the server side, and refuse handshakes.
#[derive(Debug, Default)]
pub struct FakeConnector {
    channels: Arc<Scripts>,
}

impl FakeConnector {
    /// Accepts every handshake.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next `n` handshakes on `channel`.
    pub fn refuse_next(&self, channel: ChannelKind, n: usize) {
        self.script(channel).refuse_next = n;
    }

    /// Refuse every handshake on `channel` until [`accept_all`](Self::accept_all).
    pub fn refuse_all(&self, channel: ChannelKind) {
        self.script(channel).refuse_all = true;
    }

    pub fn accept_all(&self, channel: ChannelKind) {
        let mut script = self.script(channel);
        script.refuse_all = false;
        script.refuse_next = 0;
    }

    /// Handshakes attempted on `channel`, refused ones included.
    pub fn opens(&self, channel: ChannelKind) -> usize {
        self.script(channel).opens
    }

    /// Text frames the client sent on `channel`, across all sessions.
    pub fn sent(&self, channel: ChannelKind) -> Vec<String> {
        self.script(channel).sent.clone()
    }

    /// Sent frames decoded as JSON.
    pub fn sent_json(&self, channel: ChannelKind) -> Vec<serde_json::Value> {
        self.sent(channel)
            .iter()
            .filter_map(|text| serde_json::from_str(text).ok())
            .collect()
    }

    pub fn is_connected(&self, channel: ChannelKind) -> bool {
        self.script(channel)
            .server
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Push a text frame. Returns `false` when no session is open.
    pub fn push(&self, channel: ChannelKind, text: impl Into<String>) -> bool {
        self.send_frame(channel, ServerFrame::Text(text.into()))
    }

    pub fn push_json(&self, channel: ChannelKind, value: serde_json::Value) -> bool {
        self.push(channel, value.to_string())
    }

    /// Report a channel error. The session stays up until dropped.
    pub fn fail(&self, channel: ChannelKind, reason: impl Into<String>) -> bool {
        self.send_frame(channel, ServerFrame::Error(reason.into()))
    }

    /// Close the session from the server side.
    pub fn drop_connection(&self, channel: ChannelKind) -> bool {
        self.script(channel).server.take().is_some()
    }

    fn send_frame(&self, channel: ChannelKind, frame: ServerFrame) -> bool {
        self.script(channel)
            .server
            .as_ref()
            .is_some_and(|tx| tx.send(frame).is_ok())
    }

    fn script(&self, channel: ChannelKind) -> ScriptGuard<'_> {
        lock_script(&self.channels, channel)
    }
}

type Scripts = Mutex<HashMap<ChannelKind, ChannelScript>>;

fn lock_script(scripts: &Scripts, channel: ChannelKind) -> ScriptGuard<'_> {
    let mut guard = scripts.lock().expect("connector lock poisoned");
    guard.entry(channel).or_default();
    ScriptGuard { guard, channel }
}

/// Lock guard scoped to one channel's script.
struct ScriptGuard<'a> {
    guard: MutexGuard<'a, HashMap<ChannelKind, ChannelScript>>,
    channel: ChannelKind,
}

impl std::ops::Deref for ScriptGuard<'_> {
    type Target = ChannelScript;

    fn deref(&self) -> &ChannelScript {
        self.guard.get(&self.channel).expect("script inserted on lock")
    }
}

impl std::ops::DerefMut for ScriptGuard<'_> {
    fn deref_mut(&mut self) -> &mut ChannelScript {
        self.guard
            .get_mut(&self.channel)
            .expect("script inserted on lock")
    }
}

#[async_trait]
impl IPushConnector for FakeConnector {
    async fn open(&self, channel: ChannelKind) -> ChurnwatchResult<PushConnection> {
        let mut script = self.script(channel);
        script.opens += 1;
        if script.refuse_all || script.refuse_next > 0 {
            script.refuse_next = script.refuse_next.saturating_sub(1);
            return Err(TransportError::Handshake {
                reason: "connection refused".to_string(),
            }
            .into());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        script.server = Some(tx);
        drop(script);

        Ok(PushConnection {
            sink: Box::new(FakeSink {
                channel,
                channels: Arc::clone(&self.channels),
                closed: false,
            }),
            stream: Box::new(FakeStream { rx }),
        })
    }
}

struct FakeSink {
    channel: ChannelKind,
    channels: Arc<Scripts>,
    closed: bool,
}

#[async_trait]
impl IPushSink for FakeSink {
    async fn send_text(&mut self, text: String) -> ChurnwatchResult<()> {
        if self.closed {
            return Err(TransportError::ChannelNotOpen {
                channel: self.channel.to_string(),
            }
            .into());
        }
        lock_script(&self.channels, self.channel).sent.push(text);
        Ok(())
    }

    async fn close(&mut self) -> ChurnwatchResult<()> {
        self.closed = true;
        lock_script(&self.channels, self.channel).server = None;
        Ok(())
    }
}

struct FakeStream {
    rx: mpsc::UnboundedReceiver<ServerFrame>,
}

#[async_trait]
impl IPushStream for FakeStream {
    async fn next_text(&mut self) -> Option<ChurnwatchResult<String>> {
        match self.rx.recv().await? {
            ServerFrame::Text(text) => Some(Ok(text)),
            ServerFrame::Error(reason) => {
                Some(Err(TransportError::Network { reason }.into()))
            }
        }
    }
}
