//! [`Page`] implementation backed by a page host connection.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Error;
use crate::protocol::{ErrorMessage, InvocationResult, PageCommand, PageRequest, kind};
use crate::transport::Connection;

use super::{Credentials, Page};

// ============================================================================
// RemotePage
// ============================================================================

/// A page living in the page host at the other end of a [`Connection`].
///
/// Every invocation is one request/reply round trip.
#[derive(Clone)]
pub struct RemotePage {
    connection: Connection,
    invocation_timeout: Duration,
}

impl RemotePage {
    /// Creates a page over `connection`, waiting at most
    /// `invocation_timeout` for each reply.
    #[inline]
    #[must_use]
    pub fn new(connection: Connection, invocation_timeout: Duration) -> Self {
        Self {
            connection,
            invocation_timeout,
        }
    }

    /// Returns the underlying connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl fmt::Debug for RemotePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemotePage")
            .field("invocation_timeout", &self.invocation_timeout)
            .field("pending", &self.connection.pending_count())
            .finish()
    }
}

/// Reports a transport failure the way a script failure is reported.
fn unavailable(err: &Error) -> ErrorMessage {
    ErrorMessage::new(kind::PAGE_UNAVAILABLE, err.to_string())
}

#[async_trait]
impl Page for RemotePage {
    async fn invoke_capybara_function(
        &self,
        name: &str,
        arguments: &[String],
    ) -> InvocationResult {
        let request = PageRequest::new(PageCommand::Invoke {
            name: name.to_string(),
            args: arguments.to_vec(),
        });
        let request_id = request.id;

        match self.connection.send(request, self.invocation_timeout).await {
            Ok(reply) => {
                debug!(%request_id, function = name, success = reply.is_success(), "Invocation replied");
                reply.into_invocation()
            }
            Err(e) => {
                warn!(%request_id, function = name, error = %e, "Invocation failed");
                InvocationResult::Failed(unavailable(&e))
            }
        }
    }

    async fn set_credentials(&self, credentials: Credentials) -> Result<(), ErrorMessage> {
        let request = PageRequest::new(PageCommand::SetCredentials {
            username: credentials.username,
            password: credentials.password,
        });

        let reply = self
            .connection
            .send(request, self.invocation_timeout)
            .await
            .map_err(|e| {
                warn!(error = %e, "Setting credentials failed");
                unavailable(&e)
            })?;

        match reply.into_invocation() {
            InvocationResult::Ok(_) => Ok(()),
            InvocationResult::Failed(error) => Err(error),
        }
    }

    fn shutdown(&self) {
        debug!("Closing page host connection");
        self.connection.shutdown();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::{SinkExt, StreamExt};
    use serde_json::{Value, json};
    use tokio::io::{DuplexStream, duplex};
    use tokio_tungstenite::WebSocketStream;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::tungstenite::protocol::Role;

    async fn remote_page() -> (RemotePage, WebSocketStream<DuplexStream>) {
        let (driver_io, host_io) = duplex(64 * 1024);
        let driver_ws = WebSocketStream::from_raw_socket(driver_io, Role::Server, None).await;
        let host_ws = WebSocketStream::from_raw_socket(host_io, Role::Client, None).await;
        let page = RemotePage::new(Connection::new(driver_ws), Duration::from_secs(5));
        (page, host_ws)
    }

    /// Answers one request with `reply` (its `id` filled in) and returns
    /// the request as received.
    async fn answer_one(host: &mut WebSocketStream<DuplexStream>, mut reply: Value) -> Value {
        let Some(Ok(Message::Text(text))) = host.next().await else {
            panic!("expected a text frame");
        };
        let request: Value = serde_json::from_str(&text).expect("json");
        reply["id"] = request["id"].clone();
        host.send(Message::Text(reply.to_string().into()))
            .await
            .expect("send reply");
        request
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let (page, mut host) = remote_page().await;

        let host_task = tokio::spawn(async move {
            answer_one(&mut host, json!({ "type": "success", "result": "Hello" })).await
        });

        let result = page
            .invoke_capybara_function("text", &["4".to_string()])
            .await;
        assert_eq!(result, InvocationResult::value("Hello"));

        let request = host_task.await.expect("host task");
        assert_eq!(request["method"], "capybara.invoke");
        assert_eq!(request["params"]["name"], "text");
        assert_eq!(request["params"]["args"], json!(["4"]));
    }

    #[tokio::test]
    async fn test_invoke_script_error_forwarded() {
        let (page, mut host) = remote_page().await;

        let host_task = tokio::spawn(async move {
            answer_one(
                &mut host,
                json!({ "type": "error", "error": "TypeError", "message": "node.click is not a function" }),
            )
            .await
        });

        let result = page.invoke_capybara_function("click", &[]).await;
        assert_eq!(
            result,
            InvocationResult::failed("TypeError", "node.click is not a function")
        );

        host_task.await.expect("host task");
    }

    #[tokio::test]
    async fn test_invoke_closed_connection() {
        let (page, host) = remote_page().await;
        drop(host);

        let result = page.invoke_capybara_function("isAttached", &[]).await;
        let error = result.error().expect("should fail");
        assert_eq!(error.kind, "PageUnavailableError");
    }

    #[tokio::test]
    async fn test_set_credentials() {
        let (page, mut host) = remote_page().await;

        let host_task = tokio::spawn(async move {
            answer_one(&mut host, json!({ "type": "success" })).await
        });

        page.set_credentials(Credentials::new("user", "password"))
            .await
            .expect("credentials");

        let request = host_task.await.expect("host task");
        assert_eq!(request["method"], "page.setCredentials");
        assert_eq!(request["params"]["username"], "user");
        assert_eq!(request["params"]["password"], "password");
    }

    #[tokio::test]
    async fn test_shutdown_closes_page_host_socket() {
        let (page, mut host) = remote_page().await;

        page.shutdown();

        let frame = host.next().await;
        assert!(matches!(frame, Some(Ok(Message::Close(_))) | None));

        for _ in 0..100 {
            if page.connection().is_closed() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(page.connection().is_closed());

        let result = page.invoke_capybara_function("click", &[]).await;
        assert_eq!(result.error().map(|e| e.kind.as_str()), Some("PageUnavailableError"));
    }
}
