//! Base for commands that act through the page's script environment.

use std::sync::Arc;

use crate::page::{Page, PageManager};

use super::base::CommandBase;

/// A command whose effect is a call into the page.
///
/// Adds page access on top of [`CommandBase`] and nothing else.
#[derive(Debug)]
pub struct JavaScriptCommand {
    base: CommandBase,
}

impl JavaScriptCommand {
    /// Creates the command state. Performs no I/O.
    #[must_use]
    pub fn new(name: &'static str, arguments: Vec<String>, manager: Arc<PageManager>) -> Self {
        Self {
            base: CommandBase::new(name, arguments, manager),
        }
    }

    /// Returns the page this command runs against.
    #[inline]
    #[must_use]
    pub fn page(&self) -> Arc<dyn Page> {
        self.base.manager().current_page()
    }

    /// Returns the raw, unmodified arguments.
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        self.base.arguments()
    }

    /// Returns the shared command state.
    #[inline]
    #[must_use]
    pub fn base(&self) -> &CommandBase {
        &self.base
    }
}
