//! `Authenticate` command: HTTP basic auth credentials for later requests.
//!
//! Arguments are `[username, password]`. The page answers subsequent
//! authentication challenges with them.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::page::{Credentials, PageManager};
use crate::protocol::{ErrorMessage, kind};

use super::base::CommandBase;

/// Stores credentials on the current page.
#[derive(Debug)]
pub struct Authenticate {
    base: CommandBase,
}

impl Authenticate {
    /// Command name on the wire.
    pub const NAME: &'static str = "Authenticate";

    /// Creates the command. Performs no I/O.
    #[must_use]
    pub fn new(arguments: Vec<String>, manager: Arc<PageManager>) -> Self {
        Self {
            base: CommandBase::new(Self::NAME, arguments, manager),
        }
    }

    /// Returns the shared command state.
    #[inline]
    #[must_use]
    pub fn base(&self) -> &CommandBase {
        &self.base
    }

    /// Hands the credentials to the page and finishes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyFinished`](crate::Error::AlreadyFinished) if
    /// the command was already started once.
    pub async fn start(&self) -> Result<()> {
        self.base.begin()?;

        let [username, password] = self.base.arguments() else {
            return self.base.finish(
                false,
                Some(ErrorMessage::new(
                    kind::ARGUMENT,
                    "Authenticate requires a username and a password",
                )),
            );
        };

        let credentials = Credentials::new(username.as_str(), password.as_str());
        let page = self.base.manager().current_page();

        match page.set_credentials(credentials).await {
            Ok(()) => {
                debug!(username = %username, "Credentials stored");
                self.base.finish(true, None)
            }
            Err(error) => {
                warn!(username = %username, kind = %error.kind, "Storing credentials failed");
                self.base.finish(false, Some(error))
            }
        }
    }
}

impl fmt::Display for Authenticate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::NAME)
    }
}

// ============================================================================
// Tests
// ============================================================================
