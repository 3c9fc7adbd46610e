//! WebSocket listener the page host connects to.
//!
//! # Connection Flow
//!
//! 1. The driver binds to `ip:port` (port 0 picks a free one)
//! 2. The page host is pointed at [`PageHostListener::ws_url`]
//! 3. The page host connects and sends READY
//! 4. The [`Connection`] is ready for capybara invocations

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::Connection;
use super::connection::ReadyData;

// ============================================================================
// PageHostListener
// ============================================================================

/// A bound WebSocket listener waiting for the page host.
pub struct PageHostListener {
    /// TCP listener for the incoming connection.
    listener: TcpListener,
    /// Address actually bound.
    local_addr: SocketAddr,
}

impl PageHostListener {
    /// Binds the listener.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        debug!(%local_addr, "Page host listener bound");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the bound address.
    #[inline]
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the URL the page host should connect to.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.local_addr)
    }

    /// Accepts the page host and completes the READY handshake.
    ///
    /// `connect_timeout` is one deadline covering the TCP accept, the
    /// WebSocket upgrade and READY together.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the page host does not finish in time
    /// - [`Error::Connection`] if the WebSocket upgrade fails
    /// - [`Error::Protocol`] if the READY handshake fails
    pub async fn accept(self, connect_timeout: Duration) -> Result<(Connection, ReadyData)> {
        let local_addr = self.local_addr;
        let timeout_ms = connect_timeout.as_millis() as u64;

        let (connection, ready) = timeout(connect_timeout, self.handshake(connect_timeout))
            .await
            .map_err(|_| {
                warn!(addr = %local_addr, timeout_ms, "Page host handshake timed out");
                Error::connection_timeout(timeout_ms)
            })??;

        info!(
            addr = %local_addr,
            session_id = ready.session_id,
            "Page host connected"
        );

        Ok((connection, ready))
    }

    /// Accept, upgrade and READY, without a deadline of its own.
    async fn handshake(&self, ready_timeout: Duration) -> Result<(Connection, ReadyData)> {
        let (stream, addr) = self.listener.accept().await?;

        debug!(%addr, "Page host TCP connection accepted");

        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

        let (connection, ready) = Connection::new_awaiting_ready(ws_stream);
        let ready = connection.wait_ready(ready, ready_timeout).await?;

        Ok((connection, ready))
    }
}

// ============================================================================
// Tests
// ============================================================================
