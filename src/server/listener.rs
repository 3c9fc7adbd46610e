//! TCP listener serving command clients.
//!
//! Each client gets its own task. Requests from one client are handled
//! strictly in order: read, build, start, finish, write, then the next
//! read. Clients share the page through the [`PageManager`].

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::command::Command;
use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::page::PageManager;
use crate::protocol::wire::{read_request, write_response};
use crate::protocol::{CommandRequest, ErrorMessage, Response, kind};

// ============================================================================
// Constants
// ============================================================================

/// How often the accept loop checks the shutdown flag.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// CommandServer
// ============================================================================

/// Accepts command clients and runs their commands against the page.
pub struct CommandServer {
    /// Address actually bound.
    local_addr: SocketAddr,

    /// Source of the page commands run against.
    manager: Arc<PageManager>,

    /// Next client sequence number.
    next_connection: AtomicU64,

    /// Clients currently connected.
    active_connections: AtomicUsize,

    /// Shutdown flag.
    shutdown: AtomicBool,
}

// ============================================================================
// CommandServer - Constructor
// ============================================================================

impl CommandServer {
    /// Binds `addr` and starts the accept loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn start(addr: SocketAddr, manager: Arc<PageManager>) -> Result<Arc<Self>> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let server = Arc::new(Self {
            local_addr,
            manager,
            next_connection: AtomicU64::new(1),
            active_connections: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
        });

        let server_clone = Arc::clone(&server);
        tokio::spawn(async move {
            server_clone.accept_loop(listener).await;
        });

        info!(port = local_addr.port(), "Command server listening");

        Ok(server)
    }
}

// ============================================================================
// CommandServer - Public API
// ============================================================================

impl CommandServer {
    /// Returns the bound address.
    #[inline]
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the bound port.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Returns the number of connected clients.
    #[inline]
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.active_connections.load(Ordering::Acquire)
    }

    /// Stops accepting new clients and closes the page. Clients still
    /// connected get `PageUnavailableError` from then on.
    pub fn shutdown(&self) {
        info!(port = self.port(), "Command server shutting down");
        self.shutdown.store(true, Ordering::SeqCst);
        self.manager.shutdown();
    }

    /// Returns `true` once `shutdown` has been called.
    #[inline]
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

// ============================================================================
// CommandServer - Accept Loop
// ============================================================================

impl CommandServer {
    /// Background task that accepts new clients.
    async fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        debug!("Accept loop started");

        loop {
            if self.is_shutdown() {
                debug!("Accept loop shutting down");
                break;
            }

            // Accept with timeout to allow checking shutdown flag
            match timeout(SHUTDOWN_POLL_INTERVAL, listener.accept()).await {
                Ok(Ok((stream, addr))) => {
                    let id = ConnectionId::new(self.next_connection.fetch_add(1, Ordering::Relaxed));
                    let server = Arc::clone(&self);
                    tokio::spawn(async move {
                        server.active_connections.fetch_add(1, Ordering::AcqRel);
                        if let Err(e) = server.handle_connection(stream, id).await {
                            warn!(error = %e, connection = %id, %addr, "Client connection failed");
                        }
                        server.active_connections.fetch_sub(1, Ordering::AcqRel);
                    });
                }
                Ok(Err(e)) => {
                    error!(error = %e, "Accept failed");
                }
                Err(_) => continue,
            }
        }

        debug!("Accept loop terminated");
    }

    /// Serves one client until it disconnects.
    async fn handle_connection(&self, stream: TcpStream, id: ConnectionId) -> Result<()> {
        debug!(connection = %id, "Client connected");

        stream.set_nodelay(true)?;
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        serve(&mut reader, &mut write_half, &self.manager, id).await
    }
}

// ============================================================================
// Request Loop
// ============================================================================

/// Runs the request loop over any byte stream.
///
/// Returns when the client closes the stream. Framing errors are answered
/// with a `ProtocolError` failure before the stream is given up.
///
/// # Errors
///
/// Returns [`Error::Protocol`] after a framing error and [`Error::Io`] on
/// socket failure.
pub async fn serve<R, W>(
    reader: &mut R,
    writer: &mut W,
    manager: &Arc<PageManager>,
    id: ConnectionId,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let request = match read_request(reader).await {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!(connection = %id, "Client disconnected");
                return Ok(());
            }
            Err(e @ Error::Protocol { .. }) => {
                warn!(connection = %id, error = %e, "Malformed request");
                let failure = Response::failure(ErrorMessage::new(kind::PROTOCOL, e.to_string()));
                write_response(writer, &failure).await?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let response = dispatch(request, manager, id).await;
        write_response(writer, &response).await?;
    }
}

/// Builds and runs one command, always producing an envelope.
async fn dispatch(request: CommandRequest, manager: &Arc<PageManager>, id: ConnectionId) -> Response {
    let CommandRequest { name, arguments } = request;

    let command = match Command::parse(&name, arguments, Arc::clone(manager)) {
        Ok(command) => command,
        Err(e) => {
            warn!(connection = %id, command = %name, error = %e, "Rejected request");
            let kind = match e {
                Error::UnknownCommand { .. } => kind::UNKNOWN_COMMAND,
                _ => kind::ARGUMENT,
            };
            return Response::failure(ErrorMessage::new(kind, e.to_string()));
        }
    };

    match command.execute().await {
        Ok(response) => response,
        Err(e) => {
            error!(connection = %id, error = %e, "Command lifecycle violated");
            Response::failure(ErrorMessage::new(kind::INVALID_RESPONSE, e.to_string()))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
