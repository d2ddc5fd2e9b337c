use std::io;

use thiserror::Error;

/// Result type alias for redlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported out-of-band, i.e. not embedded in a reply.
///
/// Server-side command failures never show up here: they are carried in-band
/// as [`Reply::Error`](crate::Reply::Error) so callers can handle them per
/// reply. This enum covers setup failures, typed-accessor mismatches, and
/// operations on closed resources.
#[derive(Debug, Error)]
pub enum Error {
    /// Connecting, reading or writing the transport failed.
    #[error("transport error: {source}")]
    Transport {
        /// The underlying IO error.
        #[from]
        source: io::Error,
    },

    /// The peer sent bytes that do not form a valid RESP frame.
    #[error("protocol error: {message}")]
    Protocol {
        /// Description of the malformed input.
        message: String,
    },

    /// The configuration is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid option combination.
        message: String,
    },

    /// A typed accessor was called on a reply of an incompatible variant.
    #[error("conversion error: expected {expected} reply, found {actual}")]
    Conversion {
        /// The variant the accessor requires.
        expected: &'static str,
        /// The variant the reply actually holds.
        actual: &'static str,
    },

    /// An operation was attempted on a closed resource.
    #[error("{resource} is closed")]
    Closed {
        /// The resource the operation was attempted on.
        resource: &'static str,
    },
}

impl Error {
    pub(crate) fn conversion(expected: &'static str, actual: &'static str) -> Self {
        Error::Conversion { expected, actual }
    }

    pub(crate) fn timed_out(what: &str) -> Self {
        Error::Transport {
            source: io::Error::new(io::ErrorKind::TimedOut, format!("{what} timed out")),
        }
    }
}
