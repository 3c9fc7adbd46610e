//! Driver configuration and the listener serving command clients.
//!
//! | Type | Role |
//! |------|------|
//! | [`ServerOptions`] | Addresses and timeouts |
//! | [`ServerBuilder`] | Validating builder |
//! | [`Server`] | Startup steps |
//! | [`CommandServer`] | Running command listener |

// ============================================================================
// Submodules
// ============================================================================

mod builder;
mod core;
mod listener;
mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ServerBuilder;
pub use core::Server;
pub use listener::{CommandServer, serve};
pub use options::ServerOptions;
