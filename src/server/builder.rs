//! Builder pattern for server configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use page_driver::Server;
//!
//! # fn example() -> page_driver::Result<()> {
//! let server = Server::builder()
//!     .command_port(0)
//!     .invocation_timeout(Duration::from_secs(10))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::IpAddr;
use std::time::Duration;

use crate::error::{Error, Result};

use super::core::Server;
use super::options::ServerOptions;

// ============================================================================
// ServerBuilder
// ============================================================================

/// Builder for configuring a [`Server`].
///
/// Use [`Server::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct ServerBuilder {
    options: ServerOptions,
}

impl ServerBuilder {
    /// Creates a builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address both listeners bind to.
    #[inline]
    #[must_use]
    pub fn bind_ip(mut self, ip: IpAddr) -> Self {
        self.options.bind_ip = ip;
        self
    }

    /// Sets the port command clients connect to (0 for random).
    #[inline]
    #[must_use]
    pub fn command_port(mut self, port: u16) -> Self {
        self.options.command_port = port;
        self
    }

    /// Sets the port the page host connects to (0 for random).
    #[inline]
    #[must_use]
    pub fn page_host_port(mut self, port: u16) -> Self {
        self.options.page_host_port = port;
        self
    }

    /// Sets the maximum wait for a single page host reply.
    #[inline]
    #[must_use]
    pub fn invocation_timeout(mut self, timeout: Duration) -> Self {
        self.options.invocation_timeout = timeout;
        self
    }

    /// Sets the maximum wait for the page host to connect.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ServerOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the server with validation. Binds nothing yet.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if a timeout is zero
    /// - [`Error::Config`] if both listeners ask for the same fixed port
    pub fn build(self) -> Result<Server> {
        self.validate()?;
        Ok(Server::new(self.options))
    }

    fn validate(&self) -> Result<()> {
        let options = &self.options;

        if options.invocation_timeout.is_zero() {
            return Err(Error::config("invocation timeout must be greater than zero"));
        }

        if options.connect_timeout.is_zero() {
            return Err(Error::config("connect timeout must be greater than zero"));
        }

        if options.command_port != 0 && options.command_port == options.page_host_port {
            return Err(Error::config(format!(
                "command and page host listeners both use port {}",
                options.command_port
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
