//! Page driver - remote command server for an embedded web page.
//!
//! Command clients send named commands over a local socket. The driver turns
//! each one into calls on injected JavaScript ("capybara") functions in the
//! page and answers with exactly one result envelope.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   TCP line protocol   ┌──────────────┐   WebSocket JSON   ┌────────────┐
//! │ Command      │──────────────────────►│ CommandServer│───────────────────►│ Page host  │
//! │ client       │◄──────────────────────│ → Command    │◄───────────────────│ capybara.js│
//! └──────────────┘   ok/failure envelope └──────────────┘   InvocationResult └────────────┘
//! ```
//!
//! Key rules:
//!
//! - Every command calls `finish` exactly once
//! - `Node` checks `isAttached` before running its function
//! - Error kinds are strings clients branch on, see [`protocol::kind`]
//!
//! # Quick Start
//!
//! ```no_run
//! use page_driver::{Result, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let server = Server::builder().command_port(9200).build()?;
//!
//!     // Launch the page host against this URL
//!     let listener = server.bind_page_host().await?;
//!     println!("page host url: {}", listener.ws_url());
//!
//!     let manager = server.connect_page(listener).await?;
//!     let commands = server.listen(manager).await?;
//!     println!("listening on port: {}", commands.port());
//!
//!     tokio::signal::ctrl_c().await?;
//!     commands.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`command`] | [`Node`], [`Authenticate`] and the [`Command`] factory |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`page`] | The [`Page`] capability and [`PageManager`] |
//! | [`protocol`] | Envelopes and wire formats |
//! | [`server`] | Configuration and the command listener |
//! | [`transport`] | WebSocket transport to the page host (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Remote commands.
///
/// Build one with [`Command::parse`], run it with [`Command::execute`].
pub mod command;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// The page capability commands call into.
pub mod page;

/// Envelopes, error values and wire formats.
pub mod protocol;

/// Server configuration and the command listener.
pub mod server;

/// WebSocket transport layer.
///
/// Internal module handling the page host listener and connection.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Command types
pub use command::{Authenticate, Command, CommandKind, Node};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionId, RequestId};

// Page types
pub use page::{Credentials, Page, PageManager, RemotePage};

// Protocol types
pub use protocol::{ErrorMessage, InvocationResult, Response};

// Server types
pub use server::{CommandServer, Server, ServerBuilder, ServerOptions};
