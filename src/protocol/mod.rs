//! Protocol message types.
//!
//! Two protocols meet in this crate:
//!
//! | Side | Transport | Messages |
//! |------|-----------|----------|
//! | Command client → driver | TCP line protocol | [`CommandRequest`], [`Response`] |
//! | Driver → page host | WebSocket JSON | [`PageRequest`], [`PageReply`] |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Page host method definitions |
//! | `message` | Result envelope, error value, invocation result |
//! | `request` | Page host request and reply types |
//! | `wire` | Command socket framing |

// ============================================================================
// Submodules
// ============================================================================

/// Page host method definitions.
pub mod command;

/// Result envelope, error value and invocation result.
pub mod message;

/// Page host request and reply types.
pub mod request;

/// Command socket framing.
pub mod wire;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::PageCommand;
pub use message::{ErrorMessage, InvocationResult, Response, kind};
pub use request::{PageReply, PageRequest, ReplyType};
pub use wire::CommandRequest;
