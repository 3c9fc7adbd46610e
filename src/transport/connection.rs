//! WebSocket connection to the page host.
//!
//! The connection spawns a tokio task that owns the socket and handles:
//!
//! - Outgoing [`PageRequest`]s from [`RemotePage`](crate::page::RemotePage)
//! - Incoming [`PageReply`]s, matched to their request by UUID
//! - Failing every pending request once the socket goes away

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{from_str, to_string};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{PageReply, PageRequest};

// ============================================================================
// Constants
// ============================================================================

/// Maximum pending requests before rejecting new ones.
const MAX_PENDING_REQUESTS: usize = 100;

// ============================================================================
// Types
// ============================================================================

/// Map of request IDs to reply channels.
type CorrelationMap = FxHashMap<RequestId, oneshot::Sender<Result<PageReply>>>;

// ============================================================================
// ReadyData
// ============================================================================

/// Data received in the READY handshake message.
///
/// The page host sends this right after connecting, with the nil UUID as
/// its `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyData {
    /// Session number assigned by the page host.
    pub session_id: u64,
}

// ============================================================================
// ReadySignal
// ============================================================================

/// Pending READY handshake of a connection made with
/// [`Connection::new_awaiting_ready`].
#[derive(Debug)]
pub struct ReadySignal {
    rx: oneshot::Receiver<Result<PageReply>>,
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Send a request and wait for its reply.
    Send {
        request: PageRequest,
        reply_tx: oneshot::Sender<Result<PageReply>>,
    },
    /// Remove a timed-out correlation entry.
    RemoveCorrelation(RequestId),
    /// Close the socket.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to the page host.
///
/// Cheap to clone; all clones feed the same event loop.
#[derive(Clone)]
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
}

impl Connection {
    /// Creates a connection from an upgraded WebSocket stream.
    ///
    /// Spawns the event loop task internally.
    pub fn new<S>(ws_stream: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        Self::spawn(ws_stream, CorrelationMap::default())
    }

    /// Creates a connection that expects a READY message first.
    ///
    /// The READY entry is registered before the event loop starts, so a
    /// READY sent right after the upgrade is never lost.
    pub fn new_awaiting_ready<S>(ws_stream: WebSocketStream<S>) -> (Self, ReadySignal)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let mut correlation = CorrelationMap::default();
        correlation.insert(RequestId::ready(), tx);

        (Self::spawn(ws_stream, correlation), ReadySignal { rx })
    }

    fn spawn<S>(ws_stream: WebSocketStream<S>, correlation: CorrelationMap) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let correlation = Arc::new(Mutex::new(correlation));

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlation),
        ));

        Self {
            command_tx,
            correlation,
        }
    }

    /// Waits for the READY handshake message.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if READY is not received in time
    /// - [`Error::ConnectionClosed`] if the socket closes before READY
    /// - [`Error::ChannelClosed`] if the event loop is gone
    /// - [`Error::Protocol`] if READY reports an error
    pub async fn wait_ready(&self, ready: ReadySignal, ready_timeout: Duration) -> Result<ReadyData> {
        let reply = match timeout(ready_timeout, ready.rx).await {
            Ok(received) => received??,
            Err(_) => {
                self.correlation.lock().remove(&RequestId::ready());
                return Err(Error::connection_timeout(ready_timeout.as_millis() as u64));
            }
        };

        if !reply.is_success() {
            return Err(Error::protocol(format!(
                "READY reported an error: {}",
                reply.message.as_deref().unwrap_or("unknown")
            )));
        }

        let session_id = reply.get_u64("sessionId");
        debug!(session_id, "READY handshake completed");

        Ok(ReadyData { session_id })
    }

    /// Sends a request and waits for its reply.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the connection is closed
    /// - [`Error::RequestTimeout`] if no reply arrives in time
    /// - [`Error::WebSocket`] if the request could not be written
    /// - [`Error::ChannelClosed`] if the event loop is gone
    /// - [`Error::Protocol`] if too many requests are pending
    pub async fn send(&self, request: PageRequest, request_timeout: Duration) -> Result<PageReply> {
        let request_id = request.id;

        {
            let correlation = self.correlation.lock();
            if correlation.len() >= MAX_PENDING_REQUESTS {
                warn!(
                    pending = correlation.len(),
                    max = MAX_PENDING_REQUESTS,
                    "Too many pending requests"
                );
                return Err(Error::protocol(format!(
                    "Too many pending requests: {}/{}",
                    correlation.len(),
                    MAX_PENDING_REQUESTS
                )));
            }
        }

        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Send { request, reply_tx })
            .map_err(|_| Error::ConnectionClosed)?;

        match timeout(request_timeout, reply_rx).await {
            Ok(received) => received?,
            Err(_) => {
                let _ = self
                    .command_tx
                    .send(ConnectionCommand::RemoveCorrelation(request_id));

                Err(Error::request_timeout(
                    request_id,
                    request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Returns `true` once the event loop has stopped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    /// Closes the socket. Pending requests fail with
    /// [`Error::ConnectionClosed`].
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Event loop that owns the socket.
    async fn run_event_loop<S>(
        ws_stream: WebSocketStream<S>,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        correlation: Arc<Mutex<CorrelationMap>>,
    ) where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_message(&text, &correlation);
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by page host");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { request, reply_tx }) => {
                            let request_id = request.id;

                            let json = match to_string(&request) {
                                Ok(json) => json,
                                Err(e) => {
                                    let _ = reply_tx.send(Err(Error::Json(e)));
                                    continue;
                                }
                            };

                            correlation.lock().insert(request_id, reply_tx);

                            if let Err(e) = ws_write.send(Message::Text(json.into())).await
                                && let Some(tx) = correlation.lock().remove(&request_id)
                            {
                                let _ = tx.send(Err(Error::WebSocket(e)));
                            }

                            trace!(%request_id, method = request.command.method(), "Request sent");
                        }

                        Some(ConnectionCommand::RemoveCorrelation(request_id)) => {
                            correlation.lock().remove(&request_id);
                            debug!(%request_id, "Removed timed-out correlation");
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        // Dropping the receiver makes `is_closed` observable to clones.
        drop(command_rx);
        Self::fail_pending_requests(&correlation);

        debug!("Event loop terminated");
    }

    /// Routes an incoming reply to its waiting request.
    fn handle_incoming_message(text: &str, correlation: &Arc<Mutex<CorrelationMap>>) {
        match from_str::<PageReply>(text) {
            Ok(reply) => {
                let tx = correlation.lock().remove(&reply.id);

                if let Some(tx) = tx {
                    let _ = tx.send(Ok(reply));
                } else {
                    warn!(id = %reply.id, "Reply for unknown request");
                }
            }
            Err(e) => {
                warn!(error = %e, text = %text, "Failed to parse incoming message");
            }
        }
    }

    /// Fails all pending requests with [`Error::ConnectionClosed`].
    fn fail_pending_requests(correlation: &Arc<Mutex<CorrelationMap>>) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "Failed pending requests on shutdown");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
