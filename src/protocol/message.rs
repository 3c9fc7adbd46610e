//! Result envelope, error value and invocation result.
//!
//! These are the values that flow back to the command client:
//!
//! | Type | Produced by | Meaning |
//! |------|-------------|---------|
//! | [`InvocationResult`] | [`Page`](crate::page::Page) | Outcome of one capybara function call |
//! | [`ErrorMessage`] | commands, page host | Named failure kind plus message |
//! | [`Response`] | `finish` | Terminal envelope of one command |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

// ============================================================================
// Error Kinds
// ============================================================================

/// Error kind vocabulary surfaced to command clients.
///
/// Clients branch on these names. Kinds reported by the page host are
/// forwarded verbatim and need not appear here.
pub mod kind {
    /// The target DOM node is no longer part of the document.
    pub const NODE_NOT_ATTACHED: &str = "NodeNotAttachedError";

    /// The page host or a command produced no usable response.
    pub const INVALID_RESPONSE: &str = "InvalidResponseError";

    /// The command name has no matching command kind.
    pub const UNKNOWN_COMMAND: &str = "UnknownCommandError";

    /// The command arguments do not fit the command kind.
    pub const ARGUMENT: &str = "ArgumentError";

    /// The page host could not be reached.
    pub const PAGE_UNAVAILABLE: &str = "PageUnavailableError";

    /// The request could not be framed; the connection is closed after it.
    pub const PROTOCOL: &str = "ProtocolError";
}

// ============================================================================
// ErrorMessage
// ============================================================================

/// A named failure reported to the command client.
///
/// # Format
///
/// ```json
/// { "class": "NodeNotAttachedError", "message": "Node not attached" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Error kind, see [`kind`].
    #[serde(rename = "class")]
    pub kind: String,

    /// Human-readable description.
    pub message: String,
}

impl ErrorMessage {
    /// Creates an error message.
    #[inline]
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Creates the error for a node that left the document.
    #[inline]
    #[must_use]
    pub fn node_not_attached() -> Self {
        Self::new(kind::NODE_NOT_ATTACHED, "Node not attached")
    }

    /// Returns the JSON text sent as a failure payload.
    #[must_use]
    pub fn to_json(&self) -> String {
        json!({ "class": self.kind, "message": self.message }).to_string()
    }
}

// ============================================================================
// InvocationResult
// ============================================================================

static UNDEFINED: Value = Value::Null;

/// Outcome of one call into the page's script environment.
///
/// A result is either ok or failed, never both. An ok result without a
/// value corresponds to a function returning `undefined`.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    /// The function returned, possibly without a value.
    Ok(Option<Value>),
    /// The function threw or the call could not be made.
    Failed(ErrorMessage),
}

impl InvocationResult {
    /// Creates an ok result carrying a value.
    #[inline]
    #[must_use]
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Ok(Some(value.into()))
    }

    /// Creates an ok result without a value.
    #[inline]
    #[must_use]
    pub const fn undefined() -> Self {
        Self::Ok(None)
    }

    /// Creates a failed result.
    #[inline]
    #[must_use]
    pub fn failed(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed(ErrorMessage::new(kind, message))
    }

    /// Returns `true` if the invocation failed.
    #[inline]
    #[must_use]
    pub fn has_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns the returned value, `null` when absent or failed.
    #[inline]
    #[must_use]
    pub fn result(&self) -> &Value {
        match self {
            Self::Ok(Some(value)) => value,
            Self::Ok(None) | Self::Failed(_) => &UNDEFINED,
        }
    }

    /// Returns the failure, if any.
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&ErrorMessage> {
        match self {
            Self::Failed(error) => Some(error),
            Self::Ok(_) => None,
        }
    }

    /// Interprets the returned value as a boolean.
    ///
    /// Follows script-engine variant conversion: booleans as is, numbers
    /// when non-zero, strings unless empty, `"0"` or `"false"`. Everything
    /// else, including a failure, is `false`.
    #[must_use]
    pub fn to_bool(&self) -> bool {
        match self.result() {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
            Value::Null | Value::Array(_) | Value::Object(_) => false,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// Terminal envelope of one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The command succeeded, optionally with a value.
    Success(Option<Value>),
    /// The command failed.
    Failure(ErrorMessage),
}

impl Response {
    /// Creates an empty success.
    #[inline]
    #[must_use]
    pub const fn ok() -> Self {
        Self::Success(None)
    }

    /// Creates a failure.
    #[inline]
    #[must_use]
    pub fn failure(error: ErrorMessage) -> Self {
        Self::Failure(error)
    }

    /// Returns `true` if this is a success envelope.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the failure, if any.
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&ErrorMessage> {
        match self {
            Self::Failure(error) => Some(error),
            Self::Success(_) => None,
        }
    }

    /// Returns the payload text written after the status line.
    ///
    /// Empty for a success without value, the value's JSON text for a
    /// success with one, the error object's JSON text for a failure.
    #[must_use]
    pub fn payload(&self) -> String {
        match self {
            Self::Success(None) => String::new(),
            Self::Success(Some(value)) => value.to_string(),
            Self::Failure(error) => error.to_json(),
        }
    }
}

impl From<InvocationResult> for Response {
    fn from(result: InvocationResult) -> Self {
        match result {
            InvocationResult::Ok(value) => Self::Success(value),
            InvocationResult::Failed(error) => Self::Failure(error),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_not_attached() {
        let error = ErrorMessage::node_not_attached();
        assert_eq!(error.kind, "NodeNotAttachedError");
        assert_eq!(error.message, "Node not attached");
    }

    #[test]
    fn test_error_message_json() {
        let error = ErrorMessage::new("ClickFailed", "Failed to click \"a\"");
        let parsed: ErrorMessage = serde_json::from_str(&error.to_json()).expect("parse");
        assert_eq!(parsed, error);
        assert!(error.to_json().contains("\"class\":\"ClickFailed\""));
    }

    #[test]
    fn test_invocation_result_states() {
        let ok = InvocationResult::value("hello");
        assert!(!ok.has_error());
        assert_eq!(ok.result(), &json!("hello"));
        assert!(ok.error().is_none());

        let failed = InvocationResult::failed("TypeError", "x is undefined");
        assert!(failed.has_error());
        assert_eq!(failed.result(), &Value::Null);
        assert_eq!(failed.error().map(|e| e.kind.as_str()), Some("TypeError"));
    }

    #[test]
    fn test_to_bool() {
        assert!(InvocationResult::value(true).to_bool());
        assert!(!InvocationResult::value(false).to_bool());
        assert!(InvocationResult::value(1).to_bool());
        assert!(!InvocationResult::value(0).to_bool());
        assert!(!InvocationResult::value(0.0).to_bool());
        assert!(InvocationResult::value("true").to_bool());
        assert!(!InvocationResult::value("false").to_bool());
        assert!(!InvocationResult::value("FALSE").to_bool());
        assert!(!InvocationResult::value("0").to_bool());
        assert!(!InvocationResult::value("").to_bool());
        assert!(!InvocationResult::value(json!({"a": 1})).to_bool());
        assert!(!InvocationResult::undefined().to_bool());
        assert!(!InvocationResult::failed("Error", "boom").to_bool());
    }

    #[test]
    fn test_response_payload() {
        assert_eq!(Response::ok().payload(), "");
        assert_eq!(Response::Success(Some(json!("text"))).payload(), "\"text\"");
        assert_eq!(Response::Success(Some(json!([1, 2]))).payload(), "[1,2]");

        let failure = Response::failure(ErrorMessage::node_not_attached());
        assert_eq!(
            failure.payload(),
            r#"{"class":"NodeNotAttachedError","message":"Node not attached"}"#
        );
    }

    #[test]
    fn test_response_from_invocation() {
        assert_eq!(
            Response::from(InvocationResult::undefined()),
            Response::Success(None)
        );
        assert_eq!(
            Response::from(InvocationResult::value(3)),
            Response::Success(Some(json!(3)))
        );

        let failed = InvocationResult::failed("Error", "boom");
        let response = Response::from(failed);
        assert!(!response.is_success());
        assert_eq!(response.error(), Some(&ErrorMessage::new("Error", "boom")));
    }
}
