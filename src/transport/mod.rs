//! WebSocket transport to the page host.
//!
//! The page host is whatever embeds the web page and its script engine
//! (a browser extension, an embedded WebView). It connects to the driver
//! and answers capybara function invocations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                           ┌─────────────────┐
//! │  Driver (Rust)   │         WebSocket         │  Page host      │
//! │                  │◄─────────────────────────►│                 │
//! │  RemotePage      │      ip:PORT              │  capybara.js    │
//! │  → Connection    │                           │  functions      │
//! └──────────────────┘                           └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `PageHostListener::bind` - Bind the WebSocket listener
//! 2. Launch the page host with the WebSocket URL
//! 3. `PageHostListener::accept` - Wait for it to connect, upgrade and send READY, all under one deadline
//! 4. `Connection::send` - Request/reply per invocation
//! 5. `Connection::shutdown` - Close the socket

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// WebSocket listener for the page host.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, ReadyData, ReadySignal};
pub use server::PageHostListener;
