//! Connection manager: one background task per push channel.
//!
//! The task owns the channel lifecycle (connect, subscribe, pump frames,
//! reconnect) and never touches engine state. Everything it observes is
//! forwarded to the engine as a [`ChannelEvent`].
//!
//! Teardown goes through a `watch` flag that the task checks before every
//! connection attempt and races against every wait, so once a handle is
//! closed (or dropped) no further attempt is made.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

use churnwatch_core::errors::{ChurnwatchResult, TransportError};
use churnwatch_core::models::{ChannelKind, ConnectionState};
use churnwatch_core::traits::{IPushConnector, PushConnection};

use crate::reconnect::ReconnectPolicy;
use crate::transport::protocol::ClientMessage;

/// What a channel task reports to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    State {
        channel: ChannelKind,
        state: ConnectionState,
    },
    Frame {
        channel: ChannelKind,
        text: String,
    },
    /// The channel is open again after an earlier attempt. Anything pushed
    /// in between was missed.
    Reconnected { channel: ChannelKind },
    /// The reconnect policy ran out of attempts. The channel stays closed.
    GaveUp { channel: ChannelKind, attempts: u32 },
}

/// Handle to a running channel task.
#[derive(Debug)]
pub struct ChannelHandle {
    kind: ChannelKind,
    state_rx: watch::Receiver<ConnectionState>,
    outbound_tx: mpsc::UnboundedSender<String>,
    shutdown_tx: watch::Sender<bool>,
    attempts: Arc<AtomicU32>,
    task: Option<JoinHandle<()>>,
}

impl ChannelHandle {
    /// Start the channel task. The first connection attempt is immediate.
    pub fn spawn(
        kind: ChannelKind,
        connector: Arc<dyn IPushConnector>,
        policy: ReconnectPolicy,
        events: mpsc::UnboundedSender<ChannelEvent>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let attempts = Arc::new(AtomicU32::new(0));

        let task = ChannelTask {
            kind,
            connector,
            policy,
            events,
            state_tx,
            outbound_rx,
            shutdown_rx,
            attempts: Arc::clone(&attempts),
        };
        let span = churnwatch_observability::channel_span!(kind);
        let task = tokio::spawn(task.run().instrument(span));

        Self {
            kind,
            state_rx,
            outbound_tx,
            shutdown_tx,
            attempts,
            task: Some(task),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Connection attempts made so far, the first one included.
    pub fn connect_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Queue a message for the open channel.
    pub fn send(&self, message: &ClientMessage) -> ChurnwatchResult<()> {
        let not_open = || TransportError::ChannelNotOpen {
            channel: self.kind.to_string(),
        };
        if !self.state().is_open() {
            return Err(not_open().into());
        }
        let text = message.to_text()?;
        self.outbound_tx.send(text).map_err(|_| not_open())?;
        Ok(())
    }

    /// Tear the channel down and wait for its task to finish.
    pub async fn close(&mut self) {
        self.shutdown_tx.send_replace(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("churnwatch: {} channel task ended abnormally: {e}", self.kind);
            }
        }
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}

enum SessionEnd {
    Closed,
    Disposed,
}

enum Step {
    Shutdown,
    Frame(Option<ChurnwatchResult<String>>),
    Outbound(String),
}

struct ChannelTask {
    kind: ChannelKind,
    connector: Arc<dyn IPushConnector>,
    policy: ReconnectPolicy,
    events: mpsc::UnboundedSender<ChannelEvent>,
    state_tx: watch::Sender<ConnectionState>,
    outbound_rx: mpsc::UnboundedReceiver<String>,
    shutdown_rx: watch::Receiver<bool>,
    attempts: Arc<AtomicU32>,
}

impl ChannelTask {
    async fn run(mut self) {
        // Consecutive failed attempts since the last successful open.
        let mut failures: u32 = 0;

        loop {
            if self.disposed() {
                break;
            }

            self.publish(ConnectionState::Connecting);
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::debug!("churnwatch: {} channel connect attempt {attempt}", self.kind);

            let opened = tokio::select! {
                biased;
                _ = self.shutdown_rx.changed() => None,
                result = self.connector.open(self.kind) => Some(result),
            };

            match opened {
                None => break,
                Some(Ok(connection)) => {
                    failures = 0;
                    match self.run_session(connection, attempt > 1).await {
                        SessionEnd::Disposed => break,
                        SessionEnd::Closed => {
                            tracing::info!("churnwatch: {} channel disconnected", self.kind);
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!("churnwatch: {} channel connect failed: {e}", self.kind);
                }
            }

            if self.disposed() {
                break;
            }
            self.publish(ConnectionState::Closed);

            failures += 1;
            let Some(delay) = self.policy.next_delay(failures) else {
                tracing::error!(
                    "churnwatch: {} channel giving up after {} failed attempts",
                    self.kind,
                    failures - 1
                );
                self.emit(ChannelEvent::GaveUp {
                    channel: self.kind,
                    attempts: failures - 1,
                });
                return;
            };
            tracing::info!("churnwatch: {} channel reconnecting in {delay:?}", self.kind);

            let cancelled = tokio::select! {
                biased;
                _ = self.shutdown_rx.changed() => true,
                _ = tokio::time::sleep(delay) => false,
            };
            if cancelled {
                break;
            }
        }

        self.publish(ConnectionState::Disposed);
        tracing::debug!("churnwatch: {} channel disposed", self.kind);
    }

    async fn run_session(&mut self, connection: PushConnection, reopened: bool) -> SessionEnd {
        let PushConnection {
            mut sink,
            mut stream,
        } = connection;

        let subscribed = match ClientMessage::subscribe(self.kind).to_text() {
            Ok(text) => sink.send_text(text).await,
            Err(e) => Err(e),
        };
        if let Err(e) = subscribed {
            tracing::warn!("churnwatch: {} channel subscribe failed: {e}", self.kind);
            return SessionEnd::Closed;
        }

        self.publish(ConnectionState::Open);
        tracing::info!("churnwatch: {} channel connected", self.kind);
        if reopened {
            self.emit(ChannelEvent::Reconnected { channel: self.kind });
        }

        let end = loop {
            let step = tokio::select! {
                biased;
                _ = self.shutdown_rx.changed() => Step::Shutdown,
                frame = stream.next_text() => Step::Frame(frame),
                Some(text) = self.outbound_rx.recv() => Step::Outbound(text),
            };

            match step {
                Step::Shutdown => {
                    if let Err(e) = sink.close().await {
                        tracing::debug!("churnwatch: {} channel close: {e}", self.kind);
                    }
                    break SessionEnd::Disposed;
                }
                Step::Frame(Some(Ok(text))) => self.emit(ChannelEvent::Frame {
                    channel: self.kind,
                    text,
                }),
                // Errors are followed by a close, which is what reconnects.
                Step::Frame(Some(Err(e))) => {
                    tracing::warn!("churnwatch: {} channel error: {e}", self.kind);
                }
                Step::Frame(None) => break SessionEnd::Closed,
                Step::Outbound(text) => {
                    if let Err(e) = sink.send_text(text).await {
                        tracing::warn!("churnwatch: {} channel send failed: {e}", self.kind);
                    }
                }
            }
        };

        let mut dropped = 0usize;
        while self.outbound_rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::warn!(
                "churnwatch: {} channel dropped {dropped} unsent messages",
                self.kind
            );
        }
        end
    }

    fn disposed(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    fn publish(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
        self.emit(ChannelEvent::State {
            channel: self.kind,
            state,
        });
    }

    fn emit(&self, event: ChannelEvent) {
        // The engine may already be gone; nothing left to inform.
        let _ = self.events.send(event);
    }
}
