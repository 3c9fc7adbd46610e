//! Driver coordinator tying the page host to the command listener.
//!
//! Startup runs in three steps:
//!
//! 1. [`Server::bind_page_host`] opens the WebSocket listener
//! 2. [`Server::connect_page`] waits for the page host and wraps it in a
//!    [`PageManager`]
//! 3. [`Server::listen`] starts serving command clients
//!
//! # Example
//!
//! ```no_run
//! use page_driver::Server;
//!
//! # async fn example() -> page_driver::Result<()> {
//! let server = Server::builder().command_port(9200).build()?;
//!
//! let listener = server.bind_page_host().await?;
//! println!("page host url: {}", listener.ws_url());
//!
//! let manager = server.connect_page(listener).await?;
//! let commands = server.listen(manager).await?;
//! println!("listening on port: {}", commands.port());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::page::{PageManager, RemotePage};
use crate::transport::PageHostListener;

use super::builder::ServerBuilder;
use super::listener::CommandServer;
use super::options::ServerOptions;

// ============================================================================
// Server
// ============================================================================

/// Validated configuration plus the startup steps that use it.
#[derive(Debug, Clone)]
pub struct Server {
    options: ServerOptions,
}

impl Server {
    /// Creates a server from already validated options.
    pub(crate) fn new(options: ServerOptions) -> Self {
        Self { options }
    }

    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ServerOptions {
        &self.options
    }
}

// ============================================================================
// Server - Startup
// ============================================================================

impl Server {
    /// Opens the listener the page host connects to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if binding fails.
    pub async fn bind_page_host(&self) -> Result<PageHostListener> {
        PageHostListener::bind(self.options.page_host_addr()).await
    }

    /// Waits for the page host and makes it the current page.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`](crate::Error::ConnectionTimeout) if it
    ///   does not connect within the connect timeout
    /// - [`Error::Connection`](crate::Error::Connection) if the upgrade fails
    /// - [`Error::Protocol`](crate::Error::Protocol) if the handshake fails
    pub async fn connect_page(&self, listener: PageHostListener) -> Result<Arc<PageManager>> {
        let (connection, ready) = listener.accept(self.options.connect_timeout).await?;

        info!(session_id = ready.session_id, "Page attached");

        let page = RemotePage::new(connection, self.options.invocation_timeout);
        Ok(PageManager::new(Arc::new(page)))
    }

    /// Starts accepting command clients.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if binding fails.
    pub async fn listen(&self, manager: Arc<PageManager>) -> Result<Arc<CommandServer>> {
        CommandServer::start(self.options.command_addr(), manager).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use serde_json::{Value, json};
    use tokio::io::{BufReader, split};
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite::Message;

    use crate::error::Error;
    use crate::protocol::wire::{read_response, write_request};
    use crate::protocol::{CommandRequest, Response};

    #[tokio::test]
    async fn test_connect_page_timeout() {
        let server = Server::builder()
            .connect_timeout(Duration::from_millis(20))
            .build()
            .expect("build");

        let listener = server.bind_page_host().await.expect("bind");
        let err = server.connect_page(listener).await.err().expect("timeout");
        assert!(matches!(err, Error::ConnectionTimeout { .. }));
    }

    #[tokio::test]
    async fn test_end_to_end_node_command() {
        let server = Server::builder()
            .connect_timeout(Duration::from_secs(5))
            .invocation_timeout(Duration::from_secs(5))
            .build()
            .expect("build");

        let listener = server.bind_page_host().await.expect("bind");
        let url = listener.ws_url();

        // Page host answering isAttached with true and text with "Hello"
        let host = tokio::spawn(async move {
            let (mut ws, _) = tokio_tungstenite::connect_async(url)
                .await
                .expect("connect");
            let ready = json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "type": "success",
                "result": { "sessionId": 1 }
            });
            ws.send(Message::Text(ready.to_string().into()))
                .await
                .expect("send ready");

            let mut methods = Vec::new();
            while let Some(Ok(Message::Text(text))) = ws.next().await {
                let request: Value = serde_json::from_str(&text).expect("request json");
                let name = request["params"]["name"].as_str().unwrap_or_default().to_string();
                let result = if name == "isAttached" { json!(true) } else { json!("Hello") };
                methods.push(name);

                let reply = json!({ "id": request["id"], "type": "success", "result": result });
                ws.send(Message::Text(reply.to_string().into()))
                    .await
                    .expect("send reply");

                if methods.len() == 2 {
                    break;
                }
            }
            methods
        });

        let manager = server.connect_page(listener).await.expect("connect page");
        let commands = server.listen(manager).await.expect("listen");

        let stream = TcpStream::connect(commands.local_addr()).await.expect("connect");
        let (read_half, mut write_half) = split(stream);
        let mut reader = BufReader::new(read_half);

        write_request(&mut write_half, &CommandRequest::new("Node", ["text", "3"]))
            .await
            .expect("write");
        let response = read_response(&mut reader).await.expect("response");
        assert_eq!(response, Response::Success(Some(json!("Hello"))));

        assert_eq!(host.await.expect("host task"), vec!["isAttached", "text"]);
        commands.shutdown();
    }
}
