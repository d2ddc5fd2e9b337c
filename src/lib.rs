//! # Redlink
//!
//! Asynchronous Redis client with pipelining, optimistic-lock transactions,
//! detached command futures, and pub/sub.
//!
//! Server errors are never raised as Rust errors: every command returns a
//! [`Reply`], and a failed command carries its error in-band, so one bad
//! command never tears down the client.
//!
//! ## Example
//!
//! ```no_run
//! use redlink::{Client, Config, Reply};
//!
//! #[tokio::main]
//! async fn main() -> redlink::Result<()> {
//!     let client = Client::new(Config::new().address("127.0.0.1:6379")).await?;
//!
//!     client.set("mykey", "myval").await;
//!     match client.get("mykey").await {
//!         Reply::Bulk(value) => println!("mykey: {:?}", value),
//!         Reply::Nil => println!("mykey does not exist"),
//!         other => eprintln!("get failed: {:?}", other.error_message()),
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub(crate) mod core;
pub(crate) mod proto;

#[cfg(test)]
pub(crate) mod testing;

/// Command construction helpers: [`Cmd`](cmd::Cmd) plus one constructor per
/// supported Redis verb.
pub mod cmd {
    pub use crate::core::command::*;
}

pub use crate::core::config::Config;
pub use crate::core::future::CommandFuture;
pub use crate::core::multi::{MultiCommand, Transaction};
pub use crate::core::pubsub::{Message, Subscription};
pub use crate::core::Client;
pub use crate::proto::error::{Error, Result};
pub use crate::proto::reply::{Reply, ReplyError, ReplyErrorKind};
