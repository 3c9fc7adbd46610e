//! Line protocol spoken on the command socket.
//!
//! # Request
//!
//! ```text
//! Node\n            command name
//! 2\n               argument count
//! 5\n               byte length of argument 1
//! click             argument 1 (no terminator)
//! 1\n
//! 7                 argument 2
//! ```
//!
//! # Response
//!
//! ```text
//! ok\n | failure\n  status
//! 23\n              payload byte length
//! <payload>         see Response::payload
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io::ErrorKind;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::{Error, Result};

use super::message::{ErrorMessage, Response};

// ============================================================================
// Constants
// ============================================================================

/// Status line of a success envelope.
const STATUS_OK: &str = "ok";

/// Status line of a failure envelope.
const STATUS_FAILURE: &str = "failure";

/// Maximum number of arguments accepted in one request.
const MAX_ARGUMENTS: usize = 1024;

/// Maximum byte length of a single argument or payload (16 MiB).
const MAX_FIELD_LEN: usize = 16 * 1024 * 1024;

/// Maximum byte length of a name, count or length line, terminator included.
const MAX_LINE_LEN: usize = 4096;

// ============================================================================
// CommandRequest
// ============================================================================

/// A command name and its arguments as read off the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Command name, e.g. `Node`.
    pub name: String,
    /// Ordered arguments.
    pub arguments: Vec<String>,
}

impl CommandRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        arguments: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} args)", self.name, self.arguments.len())
    }
}

// ============================================================================
// Reading
// ============================================================================

/// Reads one request.
///
/// Returns `Ok(None)` when the stream ends cleanly before a command name.
///
/// # Errors
///
/// - [`Error::Protocol`] on malformed counts, lengths, UTF-8, or a stream
///   ending mid-request
/// - [`Error::Io`] on read failure
pub async fn read_request<R>(reader: &mut R) -> Result<Option<CommandRequest>>
where
    R: AsyncBufRead + Unpin,
{
    let Some(name) = read_line(reader).await? else {
        return Ok(None);
    };

    if name.is_empty() {
        return Err(Error::protocol("empty command name"));
    }

    let count = read_number(reader, "argument count").await?;
    if count > MAX_ARGUMENTS {
        return Err(Error::protocol(format!(
            "too many arguments: {count}/{MAX_ARGUMENTS}"
        )));
    }

    let mut arguments = Vec::with_capacity(count);
    for _ in 0..count {
        let len = read_number(reader, "argument length").await?;
        arguments.push(read_field(reader, len).await?);
    }

    trace!(name = %name, count, "Request read");

    Ok(Some(CommandRequest { name, arguments }))
}

/// Reads one response envelope.
///
/// Used by command clients and tests.
///
/// # Errors
///
/// - [`Error::Protocol`] on an unknown status or malformed payload
/// - [`Error::Json`] if the payload is not valid JSON
/// - [`Error::Io`] on read failure
pub async fn read_response<R>(reader: &mut R) -> Result<Response>
where
    R: AsyncBufRead + Unpin,
{
    let status = read_line(reader)
        .await?
        .ok_or_else(|| Error::protocol("stream ended before response"))?;
    let len = read_number(reader, "payload length").await?;
    let payload = read_field(reader, len).await?;

    match status.as_str() {
        STATUS_OK if payload.is_empty() => Ok(Response::Success(None)),
        STATUS_OK => Ok(Response::Success(Some(serde_json::from_str(&payload)?))),
        STATUS_FAILURE => Ok(Response::Failure(serde_json::from_str::<ErrorMessage>(
            &payload,
        )?)),
        other => Err(Error::protocol(format!("unknown response status: {other}"))),
    }
}

/// Reads a line without its terminator. `None` at end of stream.
///
/// At most [`MAX_LINE_LEN`] bytes are buffered.
async fn read_line<R>(reader: &mut R) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = (&mut *reader)
        .take(MAX_LINE_LEN as u64)
        .read_line(&mut line)
        .await
        .map_err(map_read_error)?;
    if read == 0 {
        return Ok(None);
    }

    if read >= MAX_LINE_LEN && !line.ends_with('\n') {
        return Err(Error::protocol(format!("line exceeds {MAX_LINE_LEN} bytes")));
    }

    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

/// Reads a decimal line.
async fn read_number<R>(reader: &mut R, what: &str) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let line = read_line(reader)
        .await?
        .ok_or_else(|| Error::protocol(format!("stream ended before {what}")))?;

    line.trim()
        .parse()
        .map_err(|_| Error::protocol(format!("invalid {what}: {line:?}")))
}

/// Reads exactly `len` bytes as UTF-8.
async fn read_field<R>(reader: &mut R, len: usize) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    if len > MAX_FIELD_LEN {
        return Err(Error::protocol(format!(
            "field too large: {len}/{MAX_FIELD_LEN} bytes"
        )));
    }

    let mut buf = vec![0; len];
    reader.read_exact(&mut buf).await.map_err(map_read_error)?;

    String::from_utf8(buf).map_err(|e| Error::protocol(format!("invalid UTF-8: {e}")))
}

fn map_read_error(err: std::io::Error) -> Error {
    match err.kind() {
        ErrorKind::UnexpectedEof => Error::protocol("stream ended mid-request"),
        ErrorKind::InvalidData => Error::protocol("invalid UTF-8 in line"),
        _ => Error::Io(err),
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Writes one response envelope and flushes.
///
/// # Errors
///
/// Returns [`Error::Io`] on write failure.
pub async fn write_response<W>(writer: &mut W, response: &Response) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let status = if response.is_success() {
        STATUS_OK
    } else {
        STATUS_FAILURE
    };
    let payload = response.payload();

    let mut buf = Vec::with_capacity(status.len() + payload.len() + 16);
    buf.extend_from_slice(status.as_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(payload.len().to_string().as_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(payload.as_bytes());

    writer.write_all(&buf).await?;
    writer.flush().await?;

    trace!(status, len = payload.len(), "Response written");
    Ok(())
}

/// Writes one request and flushes.
///
/// Used by command clients and tests.
///
/// # Errors
///
/// Returns [`Error::Io`] on write failure.
pub async fn write_request<W>(writer: &mut W, request: &CommandRequest) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    buf.extend_from_slice(request.name.as_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(request.arguments.len().to_string().as_bytes());
    buf.push(b'\n');

    for argument in &request.arguments {
        buf.extend_from_slice(argument.len().to_string().as_bytes());
        buf.push(b'\n');
        buf.extend_from_slice(argument.as_bytes());
    }

    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
