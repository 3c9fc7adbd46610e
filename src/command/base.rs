//! State shared by every command.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::error;

use crate::error::{Error, Result};
use crate::page::PageManager;
use crate::protocol::{ErrorMessage, InvocationResult, Response, kind};

// ============================================================================
// CommandBase
// ============================================================================

/// Arguments, page manager and the one-shot completion of a command.
///
/// The argument list is stored once and only ever read; anything that
/// needs to strip elements works on a borrowed slice or an owned copy.
pub struct CommandBase {
    /// Command name used in logs and lifecycle errors.
    name: &'static str,
    /// Arguments as received.
    arguments: Vec<String>,
    /// Source of the page to run against.
    manager: Arc<PageManager>,
    /// Set by the first `start`.
    started: AtomicBool,
    /// Set by the first `finish`.
    finished: AtomicBool,
    /// Envelope handed over by `finish`, taken by the transport.
    response: Mutex<Option<Response>>,
}

impl CommandBase {
    /// Creates the base state. Performs no I/O.
    #[must_use]
    pub fn new(name: &'static str, arguments: Vec<String>, manager: Arc<PageManager>) -> Self {
        Self {
            name,
            arguments,
            manager,
            started: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            response: Mutex::new(None),
        }
    }

    /// Returns the command name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the arguments exactly as received.
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Returns the page manager.
    #[inline]
    #[must_use]
    pub fn manager(&self) -> &Arc<PageManager> {
        &self.manager
    }

    /// Marks the command as started. Called first thing in `start`, before
    /// any page call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyFinished`] if the command was started before.
    pub fn begin(&self) -> Result<()> {
        if self.started.swap(true, Ordering::AcqRel) {
            error!(command = self.name, "start called more than once");
            return Err(Error::already_finished(self.name));
        }
        Ok(())
    }

    /// Returns `true` once `start` has been called.
    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Returns `true` once `finish` has been called.
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Finishes with a success or a failure.
    ///
    /// A failure without an error value is reported as
    /// `InvalidResponseError`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyFinished`] if the command already finished.
    pub fn finish(&self, success: bool, error: Option<ErrorMessage>) -> Result<()> {
        let response = if success {
            Response::ok()
        } else {
            Response::failure(error.unwrap_or_else(|| {
                ErrorMessage::new(kind::INVALID_RESPONSE, format!("{} failed", self.name))
            }))
        };
        self.finish_with(response)
    }

    /// Finishes with the outcome of a page invocation, value or failure
    /// forwarded unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyFinished`] if the command already finished.
    pub fn finish_invocation(&self, result: InvocationResult) -> Result<()> {
        self.finish_with(result.into())
    }

    /// Finishes with a ready-made envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyFinished`] if the command already finished.
    /// The envelope of the first call is kept.
    pub fn finish_with(&self, response: Response) -> Result<()> {
        if self.finished.swap(true, Ordering::AcqRel) {
            error!(command = self.name, "finish called more than once");
            return Err(Error::already_finished(self.name));
        }

        *self.response.lock() = Some(response);
        Ok(())
    }

    /// Takes the envelope left by `finish`.
    ///
    /// Returns `None` if the command has not finished or the envelope was
    /// already taken.
    #[must_use]
    pub fn take_response(&self) -> Option<Response> {
        self.response.lock().take()
    }
}

impl fmt::Debug for CommandBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBase")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .field("started", &self.is_started())
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::page::testing::ScriptedPage;

    fn base(arguments: &[&str]) -> CommandBase {
        let manager = PageManager::new(Arc::new(ScriptedPage::default()));
        CommandBase::new(
            "Node",
            arguments.iter().map(ToString::to_string).collect(),
            manager,
        )
    }

    #[test]
    fn test_new_is_unfinished() {
        let base = base(&["click"]);
        assert!(!base.is_finished());
        assert_eq!(base.arguments(), ["click"]);
        assert!(base.take_response().is_none());
    }

    #[test]
    fn test_finish_success() {
        let base = base(&[]);
        base.finish(true, None).expect("finish");

        assert!(base.is_finished());
        assert_eq!(base.take_response(), Some(Response::ok()));
        assert!(base.take_response().is_none());
    }

    #[test]
    fn test_finish_failure_without_error() {
        let base = base(&[]);
        base.finish(false, None).expect("finish");

        let response = base.take_response().expect("response");
        let error = response.error().expect("failure");
        assert_eq!(error.kind, "InvalidResponseError");
        assert_eq!(error.message, "Node failed");
    }

    #[test]
    fn test_finish_invocation_forwards_value() {
        let base = base(&[]);
        base.finish_invocation(InvocationResult::value(json!({"x": 1})))
            .expect("finish");

        assert_eq!(
            base.take_response(),
            Some(Response::Success(Some(json!({"x": 1}))))
        );
    }

    #[test]
    fn test_second_finish_rejected() {
        let base = base(&[]);
        base.finish(false, Some(ErrorMessage::node_not_attached()))
            .expect("first finish");

        let err = base.finish(true, None).unwrap_err();
        assert!(matches!(err, Error::AlreadyFinished { .. }));

        // The first envelope wins.
        let response = base.take_response().expect("response");
        assert_eq!(response.error(), Some(&ErrorMessage::node_not_attached()));
    }

    #[test]
    fn test_second_begin_rejected() {
        let base = base(&["click"]);
        assert!(!base.is_started());

        base.begin().expect("first begin");
        assert!(base.is_started());
        assert!(!base.is_finished());

        let err = base.begin().unwrap_err();
        assert!(matches!(err, Error::AlreadyFinished { .. }));
    }
}
