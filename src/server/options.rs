//! Server configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use page_driver::ServerOptions;
//!
//! let options = ServerOptions::new()
//!     .with_command_port(9200)
//!     .with_invocation_timeout(Duration::from_secs(10));
//!
//! assert_eq!(options.command_addr().port(), 9200);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default bind address (localhost).
const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Default time to wait for one page host reply.
const DEFAULT_INVOCATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time to wait for the page host to connect and send READY.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// ServerOptions
// ============================================================================

/// Network addresses and timeouts of the driver.
///
/// Ports default to 0, letting the OS pick a free one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// Address both listeners bind to.
    pub bind_ip: IpAddr,

    /// Port command clients connect to.
    pub command_port: u16,

    /// Port the page host connects to.
    pub page_host_port: u16,

    /// Maximum wait for a single page host reply.
    pub invocation_timeout: Duration,

    /// Maximum wait for the page host to connect and send READY.
    pub connect_timeout: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ServerOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bind_ip: DEFAULT_BIND_IP,
            command_port: 0,
            page_host_port: 0,
            invocation_timeout: DEFAULT_INVOCATION_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ServerOptions {
    /// Sets the bind address.
    #[inline]
    #[must_use]
    pub fn with_bind_ip(mut self, ip: IpAddr) -> Self {
        self.bind_ip = ip;
        self
    }

    /// Sets the command port.
    #[inline]
    #[must_use]
    pub fn with_command_port(mut self, port: u16) -> Self {
        self.command_port = port;
        self
    }

    /// Sets the page host port.
    #[inline]
    #[must_use]
    pub fn with_page_host_port(mut self, port: u16) -> Self {
        self.page_host_port = port;
        self
    }

    /// Sets the per-invocation timeout.
    #[inline]
    #[must_use]
    pub fn with_invocation_timeout(mut self, timeout: Duration) -> Self {
        self.invocation_timeout = timeout;
        self
    }

    /// Sets the page host connect timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl ServerOptions {
    /// Returns the command listener address.
    #[inline]
    #[must_use]
    pub fn command_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.command_port)
    }

    /// Returns the page host listener address.
    #[inline]
    #[must_use]
    pub fn page_host_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.page_host_port)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ServerOptions::default();

        assert_eq!(options, ServerOptions::new());
        assert_eq!(options.bind_ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(options.command_port, 0);
        assert_eq!(options.page_host_port, 0);
        assert_eq!(options.invocation_timeout.as_secs(), 30);
        assert_eq!(options.connect_timeout.as_secs(), 30);
    }

    #[test]
    fn test_builder_chain() {
        let options = ServerOptions::new()
            .with_bind_ip(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
            .with_command_port(9200)
            .with_page_host_port(9201)
            .with_invocation_timeout(Duration::from_secs(5))
            .with_connect_timeout(Duration::from_secs(60));

        assert_eq!(options.command_addr().to_string(), "0.0.0.0:9200");
        assert_eq!(options.page_host_addr().to_string(), "0.0.0.0:9201");
        assert_eq!(options.invocation_timeout, Duration::from_secs(5));
        assert_eq!(options.connect_timeout, Duration::from_secs(60));
    }
}
