use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;

use crate::proto::error::{Error, Result};

/// A single decoded Redis reply.
///
/// Every command round trip produces exactly one `Reply`. Server errors are
/// a reply variant rather than a Rust error, so a failed command never tears
/// down the client; callers inspect the reply they got back. Transport
/// failures during command execution are reported the same way, as an
/// [`Reply::Error`] with [`ReplyErrorKind::Transport`].
///
/// # Example
///
/// ```
/// use redlink::Reply;
///
/// let reply = Reply::Integer(42);
/// assert_eq!(reply.int().unwrap(), 42);
/// assert!(reply.str().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A status line such as `OK` or `PONG`.
    Status(String),
    /// A numeric reply.
    Integer(i64),
    /// A binary-safe bulk string.
    Bulk(Bytes),
    /// The nil reply: missing key, null bulk string, or aborted transaction.
    Nil,
    /// An ordered sequence of child replies.
    Array(Vec<Reply>),
    /// An error reply, from the server or from a failed transport operation.
    Error(ReplyError),
}

/// Classifies where an error reply originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyErrorKind {
    /// The server rejected the command (`-ERR …`).
    Server,
    /// Connecting, reading or writing the transport failed.
    Transport,
    /// The peer sent bytes that do not form a valid RESP frame.
    Protocol,
    /// The operation was issued on a closed resource.
    Closed,
}

impl fmt::Display for ReplyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReplyErrorKind::Server => "server error",
            ReplyErrorKind::Transport => "transport error",
            ReplyErrorKind::Protocol => "protocol error",
            ReplyErrorKind::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// The error carried inside a [`Reply::Error`].
///
/// Unlike [`Error`], this type is cloneable so replies stay freely copyable
/// values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ReplyError {
    /// Where the error originated.
    pub kind: ReplyErrorKind,
    /// The error message.
    pub message: String,
}

impl ReplyError {
    /// Creates a server error as decoded from an `-ERR …` line.
    pub fn server(message: impl Into<String>) -> Self {
        Self {
            kind: ReplyErrorKind::Server,
            message: message.into(),
        }
    }

    pub(crate) fn from_error(err: &Error) -> Self {
        let kind = match err {
            Error::Transport { .. } => ReplyErrorKind::Transport,
            Error::Protocol { .. } => ReplyErrorKind::Protocol,
            Error::Closed { .. } => ReplyErrorKind::Closed,
            _ => ReplyErrorKind::Transport,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl Reply {
    /// Wraps an out-of-band error into an in-band error reply.
    pub(crate) fn from_error(err: &Error) -> Reply {
        Reply::Error(ReplyError::from_error(err))
    }

    pub(crate) fn closed(resource: &'static str) -> Reply {
        Reply::from_error(&Error::Closed { resource })
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Reply::Status(_) => "status",
            Reply::Integer(_) => "integer",
            Reply::Bulk(_) => "bulk string",
            Reply::Nil => "nil",
            Reply::Array(_) => "array",
            Reply::Error(_) => "error",
        }
    }

    /// Returns true if this is the nil reply.
    ///
    /// Besides missing keys, this is the outcome [`MultiCommand::exec`]
    /// yields when the transaction was aborted because a watched key changed.
    ///
    /// [`MultiCommand::exec`]: crate::MultiCommand::exec
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    /// Returns true if this is an error reply of any kind.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Returns the carried error, if this is an error reply.
    pub fn error(&self) -> Option<&ReplyError> {
        match self {
            Reply::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the error message, or `None` for every non-error variant.
    ///
    /// Convenient in log lines where a nil reply and a successful reply
    /// should both print as "no error".
    pub fn error_message(&self) -> Option<&str> {
        self.error().map(|e| e.message.as_str())
    }

    /// Extracts the reply as a string slice.
    ///
    /// Works for status replies and UTF-8 bulk strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] for any other variant, or for binary
    /// bulk data that is not valid UTF-8.
    pub fn str(&self) -> Result<&str> {
        match self {
            Reply::Status(s) => Ok(s),
            Reply::Bulk(b) => std::str::from_utf8(b)
                .map_err(|_| Error::conversion("utf-8 string", "binary bulk string")),
            other => Err(Error::conversion("string", other.variant_name())),
        }
    }

    /// Extracts the raw bytes of a bulk reply.
    pub fn bytes(&self) -> Result<&Bytes> {
        match self {
            Reply::Bulk(b) => Ok(b),
            other => Err(Error::conversion("bulk string", other.variant_name())),
        }
    }

    /// Extracts an integer reply.
    pub fn int(&self) -> Result<i64> {
        match self {
            Reply::Integer(n) => Ok(*n),
            other => Err(Error::conversion("integer", other.variant_name())),
        }
    }

    /// Extracts the elements of an array reply.
    pub fn elems(&self) -> Result<&[Reply]> {
        match self {
            Reply::Array(a) => Ok(a),
            other => Err(Error::conversion("array", other.variant_name())),
        }
    }

    /// Returns the element at `index` of an array reply.
    ///
    /// Returns `None` for out-of-range indexes and for non-array replies.
    pub fn at(&self, index: usize) -> Option<&Reply> {
        match self {
            Reply::Array(a) => a.get(index),
            _ => None,
        }
    }

    /// Decodes an array reply into a vector of strings.
    ///
    /// Every element must itself convert via [`Reply::str`]. Used for
    /// commands like `LRANGE` and `KEYS`.
    pub fn strings(&self) -> Result<Vec<String>> {
        let elems = self.elems()?;
        elems
            .iter()
            .map(|e| e.str().map(str::to_owned))
            .collect()
    }

    /// Decodes an interleaved key/value array reply into a map.
    ///
    /// Used for commands like `HGETALL` and `CONFIG GET`, which reply with
    /// `[k1, v1, k2, v2, …]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] for non-array replies, odd-length
    /// arrays, and non-string elements.
    pub fn string_map(&self) -> Result<HashMap<String, String>> {
        let elems = self.elems()?;
        if elems.len() % 2 != 0 {
            return Err(Error::conversion("even-length array", "odd-length array"));
        }
        let mut map = HashMap::with_capacity(elems.len() / 2);
        for pair in elems.chunks_exact(2) {
            map.insert(pair[0].str()?.to_owned(), pair[1].str()?.to_owned());
        }
        Ok(map)
    }
}
