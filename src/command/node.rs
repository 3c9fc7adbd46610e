//! `Node` command: call a capybara function on a node that is still in
//! the document.
//!
//! # Arguments
//!
//! | Index | Meaning |
//! |-------|---------|
//! | 0 | Capybara function name, e.g. `click`, `text`, `set` |
//! | 1.. | Function arguments; by convention the node reference comes first |
//!
//! The attachment check and the real call are two separate round trips.
//! A node removed between them is not detected here; the second call then
//! fails inside the page and that failure is forwarded as is.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::Result;
use crate::page::{Page, PageManager};
use crate::protocol::{ErrorMessage, kind};

use super::base::CommandBase;
use super::javascript::JavaScriptCommand;

// ============================================================================
// Constants
// ============================================================================

/// Capybara function answering whether a node is still attached.
pub const IS_ATTACHED: &str = "isAttached";

// ============================================================================
// Node
// ============================================================================

/// Invokes a capybara function by name, guarded by an attachment check.
#[derive(Debug)]
pub struct Node {
    command: JavaScriptCommand,
}

impl Node {
    /// Command name on the wire.
    pub const NAME: &'static str = "Node";

    /// Creates the command. Performs no I/O.
    #[must_use]
    pub fn new(arguments: Vec<String>, manager: Arc<PageManager>) -> Self {
        Self {
            command: JavaScriptCommand::new(Self::NAME, arguments, manager),
        }
    }

    /// Returns the shared command state.
    #[inline]
    #[must_use]
    pub fn base(&self) -> &CommandBase {
        self.command.base()
    }

    /// Returns the target function name, if present.
    #[inline]
    #[must_use]
    pub fn function_name(&self) -> Option<&str> {
        self.command.arguments().first().map(String::as_str)
    }

    /// Runs the attachment check and, if it passes, the function.
    ///
    /// Finishes exactly once on every path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyFinished`](crate::Error::AlreadyFinished) if
    /// the command was already started once.
    pub async fn start(&self) -> Result<()> {
        self.base().begin()?;

        // The stored list is only borrowed; it stays intact for Display.
        let Some((function_name, function_arguments)) = self.command.arguments().split_first()
        else {
            return self.base().finish(
                false,
                Some(ErrorMessage::new(kind::ARGUMENT, "Node requires a function name")),
            );
        };

        let page = self.command.page();

        if is_attached(page.as_ref(), function_arguments).await {
            trace!(function = %function_name, "Node attached");
            let result = page
                .invoke_capybara_function(function_name, function_arguments)
                .await;
            self.base().finish_invocation(result)
        } else {
            debug!(function = %function_name, "Node not attached");
            self.base()
                .finish(false, Some(ErrorMessage::node_not_attached()))
        }
    }
}

/// Asks the page whether the node referenced by `arguments` is attached.
///
/// A failed check counts as not attached.
async fn is_attached(page: &dyn Page, arguments: &[String]) -> bool {
    page.invoke_capybara_function(IS_ATTACHED, arguments)
        .await
        .to_bool()
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.function_name() {
            Some(name) => write!(f, "{}.{}", Self::NAME, name),
            None => f.write_str(Self::NAME),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
