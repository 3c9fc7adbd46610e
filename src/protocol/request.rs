//! Request and reply messages exchanged with the page host.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::identifiers::RequestId;

use super::PageCommand;
use super::message::{ErrorMessage, InvocationResult, kind};

// ============================================================================
// PageRequest
// ============================================================================

/// A method call from the driver to the page host.
///
/// # Format
///
/// ```json
/// {
///   "id": "uuid",
///   "method": "capybara.invoke",
///   "params": { "name": "isAttached", "args": ["7"] }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct PageRequest {
    /// Unique identifier for request/reply correlation.
    pub id: RequestId,

    /// Method and params.
    #[serde(flatten)]
    pub command: PageCommand,
}

impl PageRequest {
    /// Creates a new request with auto-generated ID.
    #[inline]
    #[must_use]
    pub fn new(command: PageCommand) -> Self {
        Self {
            id: RequestId::generate(),
            command,
        }
    }
}

// ============================================================================
// PageReply
// ============================================================================

/// A reply from the page host.
///
/// # Format
///
/// Success (`result` omitted when the function returned `undefined`):
/// ```json
/// { "id": "uuid", "type": "success", "result": true }
/// ```
///
/// Error:
/// ```json
/// { "id": "uuid", "type": "error", "error": "TypeError", "message": "..." }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PageReply {
    /// Matches the request `id`.
    pub id: RequestId,

    /// Reply type.
    #[serde(rename = "type")]
    pub reply_type: ReplyType,

    /// Returned value. `Some(Null)` for an explicit `null`.
    #[serde(default, deserialize_with = "present")]
    pub result: Option<Value>,

    /// Error kind (if error).
    #[serde(default)]
    pub error: Option<String>,

    /// Error message (if error).
    #[serde(default)]
    pub message: Option<String>,
}

impl PageReply {
    /// Returns `true` if this is a success reply.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.reply_type == ReplyType::Success
    }

    /// Converts the reply into an invocation result.
    ///
    /// Error kind and message are kept verbatim. A missing kind becomes
    /// `InvalidResponseError`, a missing message repeats the kind.
    #[must_use]
    pub fn into_invocation(self) -> InvocationResult {
        match self.reply_type {
            ReplyType::Success => InvocationResult::Ok(self.result),
            ReplyType::Error => {
                let kind = self
                    .error
                    .unwrap_or_else(|| kind::INVALID_RESPONSE.to_string());
                let message = self.message.unwrap_or_else(|| kind.clone());
                InvocationResult::Failed(ErrorMessage::new(kind, message))
            }
        }
    }

    /// Gets a u64 value from an object result.
    ///
    /// Returns 0 if key not found or not a number.
    #[inline]
    #[must_use]
    pub fn get_u64(&self, key: &str) -> u64 {
        self.result
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(|v| v.as_u64())
            .unwrap_or_default()
    }
}

/// Keeps an explicit `null` distinguishable from an absent field.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// ============================================================================
// ReplyType
// ============================================================================

/// Reply type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyType {
    /// Successful reply.
    Success,
    /// Error reply.
    Error,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = PageRequest::new(PageCommand::Invoke {
            name: "text".to_string(),
            args: vec!["3".to_string()],
        });
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["method"], "capybara.invoke");
        assert_eq!(json["params"]["name"], "text");
        assert_eq!(json["id"], request.id.to_string());
    }

    #[test]
    fn test_success_reply_with_value() {
        let json_str = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "type": "success",
            "result": "Hello"
        }"#;

        let reply: PageReply = serde_json::from_str(json_str).expect("parse");
        assert!(reply.is_success());
        assert_eq!(reply.into_invocation(), InvocationResult::value("Hello"));
    }

    #[test]
    fn test_success_reply_null_and_absent() {
        let with_null: PageReply = serde_json::from_str(
            r#"{"id": "550e8400-e29b-41d4-a716-446655440000", "type": "success", "result": null}"#,
        )
        .expect("parse");
        assert_eq!(with_null.result, Some(Value::Null));

        let absent: PageReply = serde_json::from_str(
            r#"{"id": "550e8400-e29b-41d4-a716-446655440000", "type": "success"}"#,
        )
        .expect("parse");
        assert_eq!(absent.into_invocation(), InvocationResult::undefined());
    }

    #[test]
    fn test_error_reply() {
        let json_str = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "type": "error",
            "error": "ClickFailed",
            "message": "Failed to click element"
        }"#;

        let reply: PageReply = serde_json::from_str(json_str).expect("parse");
        assert!(!reply.is_success());
        assert_eq!(
            reply.into_invocation(),
            InvocationResult::failed("ClickFailed", "Failed to click element")
        );
    }

    #[test]
    fn test_error_reply_without_kind() {
        let reply: PageReply = serde_json::from_str(
            r#"{"id": "550e8400-e29b-41d4-a716-446655440000", "type": "error"}"#,
        )
        .expect("parse");

        let error = reply.into_invocation().error().cloned().expect("failed");
        assert_eq!(error.kind, "InvalidResponseError");
        assert_eq!(error.message, "InvalidResponseError");
    }

    #[test]
    fn test_get_u64() {
        let reply: PageReply = serde_json::from_value(json!({
            "id": "00000000-0000-0000-0000-000000000000",
            "type": "success",
            "result": { "sessionId": 4 }
        }))
        .expect("parse");

        assert_eq!(reply.get_u64("sessionId"), 4);
        assert_eq!(reply.get_u64("missing"), 0);
    }
}
