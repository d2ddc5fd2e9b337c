//! Reply model and RESP wire codec.
//!
//! # Modules
//!
//! - [`reply`] - The decoded reply model and its typed accessors
//! - [`codec`] - Streaming RESP encoder and decoder
//! - [`error`] - Out-of-band error taxonomy

pub(crate) mod codec;
pub mod error;
pub mod reply;

pub use error::{Error, Result};
pub use reply::{Reply, ReplyError, ReplyErrorKind};
