//! Methods understood by the page host.
//!
//! Methods follow `module.methodName` format:
//!
//! | Method | Purpose |
//! |--------|---------|
//! | `capybara.invoke` | Call an injected capybara function |
//! | `page.setCredentials` | Store HTTP basic auth credentials |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// PageCommand
// ============================================================================

/// A method call sent to the page host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum PageCommand {
    /// Invoke a capybara function by name.
    #[serde(rename = "capybara.invoke")]
    Invoke {
        /// Function name, e.g. `isAttached`.
        name: String,
        /// String arguments passed to the function.
        args: Vec<String>,
    },

    /// Store credentials used to answer HTTP authentication challenges.
    #[serde(rename = "page.setCredentials")]
    SetCredentials {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
}

impl PageCommand {
    /// Returns the wire method name.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Invoke { .. } => "capybara.invoke",
            Self::SetCredentials { .. } => "page.setCredentials",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
