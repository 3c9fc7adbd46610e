//! The page capability commands call into.
//!
//! A [`Page`] is anything that can run capybara functions against a live
//! document. The driver never owns the page's lifetime; commands hold a
//! shared handle obtained from the [`PageManager`].
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `manager` | Current-page bookkeeping |
//! | `remote` | [`Page`] over a page host WebSocket |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;

use crate::protocol::{ErrorMessage, InvocationResult};

// ============================================================================
// Submodules
// ============================================================================

mod manager;
mod remote;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use manager::PageManager;
pub use remote::RemotePage;

// ============================================================================
// Page
// ============================================================================

/// Capability to run injected capybara functions in a page.
///
/// Implementations must tolerate two calls in immediate succession for
/// the same command. They are not expected to be reentrant: the command
/// server drives one command at a time per client.
#[async_trait]
pub trait Page: Send + Sync {
    /// Invokes the capybara function `name` with string `arguments`.
    ///
    /// Never fails at the Rust level; script exceptions and transport
    /// problems come back as [`InvocationResult::Failed`].
    async fn invoke_capybara_function(&self, name: &str, arguments: &[String])
    -> InvocationResult;

    /// Stores credentials for HTTP authentication challenges.
    async fn set_credentials(&self, credentials: Credentials) -> Result<(), ErrorMessage>;

    /// Releases the page. Later invocations fail as unavailable.
    fn shutdown(&self) {}
}

// ============================================================================
// Credentials
// ============================================================================

/// HTTP basic authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    #[inline]
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("user", "hunter2");
        let debug = format!("{credentials:?}");

        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_page_is_object_safe() {
        fn assert_object_safe(_: Option<&dyn Page>) {}
        assert_object_safe(None);
    }
}
