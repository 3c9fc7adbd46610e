//! Current-page bookkeeping.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::Page;

// ============================================================================
// PageManager
// ============================================================================

/// Owns the page handle commands run against.
///
/// Commands borrow the current page for the duration of one `start`; the
/// manager may swap it between commands (e.g. after the page host
/// reconnects).
pub struct PageManager {
    current: RwLock<Arc<dyn Page>>,
}

impl PageManager {
    /// Creates a manager around an initial page.
    #[must_use]
    pub fn new(page: Arc<dyn Page>) -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(page),
        })
    }

    /// Returns the page commands should target.
    #[inline]
    #[must_use]
    pub fn current_page(&self) -> Arc<dyn Page> {
        Arc::clone(&self.current.read())
    }

    /// Replaces the current page. Commands already running keep the old one.
    pub fn set_current_page(&self, page: Arc<dyn Page>) {
        *self.current.write() = page;
        debug!("Current page replaced");
    }

    /// Shuts down the current page.
    pub fn shutdown(&self) {
        debug!("Shutting down current page");
        self.current_page().shutdown();
    }
}

impl fmt::Debug for PageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageManager").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
