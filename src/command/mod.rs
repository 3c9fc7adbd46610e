//! Remote commands and the factory that builds them.
//!
//! Every command follows the same lifecycle:
//!
//! 1. [`Command::parse`] maps a name and arguments to a variant (no I/O)
//! 2. [`Command::start`] does the work, calling into the page
//! 3. The command calls `finish` exactly once
//! 4. [`Command::execute`] hands the envelope back to the transport
//!
//! # Commands
//!
//! | Name | Type | Arguments |
//! |------|------|-----------|
//! | `Node` | [`Node`] | function name, function arguments... |
//! | `Authenticate` | [`Authenticate`] | username, password |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::page::PageManager;
use crate::protocol::Response;

// ============================================================================
// Submodules
// ============================================================================

mod authenticate;
mod base;
mod javascript;
mod node;

// ============================================================================
// Re-exports
// ============================================================================

pub use authenticate::Authenticate;
pub use base::CommandBase;
pub use javascript::JavaScriptCommand;
pub use node::{IS_ATTACHED, Node};

// ============================================================================
// CommandKind
// ============================================================================

/// Command names the factory knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `Node`
    Node,
    /// `Authenticate`
    Authenticate,
}

impl CommandKind {
    /// Returns the wire name.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Node => Node::NAME,
            Self::Authenticate => Authenticate::NAME,
        }
    }
}

impl FromStr for CommandKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            Node::NAME => Ok(Self::Node),
            Authenticate::NAME => Ok(Self::Authenticate),
            other => Err(Error::unknown_command(other)),
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Command
// ============================================================================

/// One remote operation, alive for a single start/finish cycle.
#[derive(Debug)]
pub enum Command {
    /// Capybara function call on a node.
    Node(Node),
    /// HTTP credentials for the page.
    Authenticate(Authenticate),
}

impl Command {
    /// Builds the command matching `name`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownCommand`] if no command has that name
    /// - [`Error::InvalidArgument`] if the argument count does not fit
    pub fn parse(name: &str, arguments: Vec<String>, manager: Arc<PageManager>) -> Result<Self> {
        match name.parse::<CommandKind>()? {
            CommandKind::Node => {
                if arguments.is_empty() {
                    return Err(Error::invalid_argument("Node requires a function name"));
                }
                Ok(Self::Node(Node::new(arguments, manager)))
            }
            CommandKind::Authenticate => {
                if arguments.len() != 2 {
                    return Err(Error::invalid_argument(format!(
                        "Authenticate requires 2 arguments, got {}",
                        arguments.len()
                    )));
                }
                Ok(Self::Authenticate(Authenticate::new(arguments, manager)))
            }
        }
    }

    /// Returns the command kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Node(_) => CommandKind::Node,
            Self::Authenticate(_) => CommandKind::Authenticate,
        }
    }

    /// Returns the shared command state.
    #[inline]
    #[must_use]
    pub fn base(&self) -> &CommandBase {
        match self {
            Self::Node(command) => command.base(),
            Self::Authenticate(command) => command.base(),
        }
    }

    /// Runs the command to its single `finish`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyFinished`] if started a second time.
    pub async fn start(&self) -> Result<()> {
        match self {
            Self::Node(command) => command.start().await,
            Self::Authenticate(command) => command.start().await,
        }
    }

    /// Starts the command and returns the envelope it finished with.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyFinished`] if `finish` was called twice
    /// - [`Error::Unfinished`] if `start` returned without finishing
    pub async fn execute(self) -> Result<Response> {
        debug!(command = %self, "Command started");

        self.start().await?;

        let response = self
            .base()
            .take_response()
            .ok_or_else(|| Error::unfinished(self.to_string()))?;

        debug!(command = %self, success = response.is_success(), "Command finished");
        Ok(response)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(command) => fmt::Display::fmt(command, f),
            Self::Authenticate(command) => fmt::Display::fmt(command, f),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::page::testing::ScriptedPage;
    use crate::protocol::{ErrorMessage, InvocationResult};

    fn manager(page: &Arc<ScriptedPage>) -> Arc<PageManager> {
        PageManager::new(page.clone())
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Node".parse::<CommandKind>().ok(), Some(CommandKind::Node));
        assert_eq!(
            "Authenticate".parse::<CommandKind>().ok(),
            Some(CommandKind::Authenticate)
        );
        assert!("node".parse::<CommandKind>().is_err());
        assert_eq!(CommandKind::Node.to_string(), "Node");
    }

    #[test]
    fn test_parse_node() {
        let page = Arc::new(ScriptedPage::default());
        let command = Command::parse("Node", args(&["click", "1"]), manager(&page)).expect("parse");

        assert_eq!(command.kind(), CommandKind::Node);
        assert_eq!(command.to_string(), "Node.click");
        assert!(!command.base().is_finished());
        assert!(page.calls().is_empty());
    }

    #[test]
    fn test_parse_unknown() {
        let page = Arc::new(ScriptedPage::default());
        let err = Command::parse("Visit", args(&["/"]), manager(&page)).unwrap_err();

        assert!(matches!(err, Error::UnknownCommand { ref command } if command == "Visit"));
    }

    #[test]
    fn test_parse_arity() {
        let page = Arc::new(ScriptedPage::default());

        let node = Command::parse("Node", vec![], manager(&page)).unwrap_err();
        assert!(matches!(node, Error::InvalidArgument { .. }));

        let auth = Command::parse("Authenticate", args(&["user"]), manager(&page)).unwrap_err();
        assert!(auth.to_string().contains("got 1"));
    }

    #[tokio::test]
    async fn test_execute_node() {
        let page = Arc::new(ScriptedPage::new([
            InvocationResult::value(true),
            InvocationResult::value("Hello"),
        ]));
        let command = Command::parse("Node", args(&["text", "2"]), manager(&page)).expect("parse");

        let response = command.execute().await.expect("execute");
        assert_eq!(response, Response::from(InvocationResult::value("Hello")));
    }

    #[tokio::test]
    async fn test_execute_authenticate() {
        let page = Arc::new(ScriptedPage::default());
        let command = Command::parse("Authenticate", args(&["user", "password"]), manager(&page))
            .expect("parse");

        assert_eq!(command.to_string(), "Authenticate");
        let response = command.execute().await.expect("execute");
        assert_eq!(response, Response::ok());
    }

    #[tokio::test]
    async fn test_execute_detached_node() {
        let page = Arc::new(ScriptedPage::new([InvocationResult::value(false)]));
        let command = Command::parse("Node", args(&["text", "2"]), manager(&page)).expect("parse");

        let response = command.execute().await.expect("execute");
        assert_eq!(response, Response::failure(ErrorMessage::node_not_attached()));
    }

    #[tokio::test]
    async fn test_execute_after_start_rejected() {
        let page = Arc::new(ScriptedPage::new([InvocationResult::value(false)]));
        let command = Command::parse("Node", args(&["text"]), manager(&page)).expect("parse");

        command.start().await.expect("start");

        let err = command.execute().await.unwrap_err();
        assert!(matches!(err, Error::AlreadyFinished { .. }));
    }
}
