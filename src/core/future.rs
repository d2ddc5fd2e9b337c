use std::io;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::core::command::Cmd;
use crate::core::pool::Pool;
use crate::proto::error::Error;
use crate::proto::reply::Reply;

/// An in-flight command whose reply can be collected later.
///
/// Created by [`Client::async_command`] and friends: the command is sent on
/// a background task immediately, so the caller keeps running while the
/// round trip is in progress. [`reply`](CommandFuture::reply) blocks until
/// the reply exists; the future resolves exactly once and later calls return
/// the same cached value, never re-executing the command.
///
/// There is no cancellation: once created, the command has been handed to
/// the transport and will run to completion (or fail with a transport error
/// reply).
///
/// [`Client::async_command`]: crate::Client::async_command
#[derive(Debug)]
pub struct CommandFuture {
    rx: Option<oneshot::Receiver<Reply>>,
    resolved: Option<Reply>,
}

impl CommandFuture {
    pub(crate) fn spawn(pool: Arc<Pool>, cmd: Cmd) -> Self {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let reply = pool.execute(&cmd).await;
            // The receiver may already be gone; the command still ran.
            let _ = tx.send(reply);
        });
        Self {
            rx: Some(rx),
            resolved: None,
        }
    }

    /// Waits for and returns the command's reply.
    ///
    /// Idempotent: every call returns the identical resolved value.
    pub async fn reply(&mut self) -> Reply {
        if let Some(reply) = &self.resolved {
            return reply.clone();
        }
        let reply = match self.rx.take() {
            Some(rx) => rx.await.unwrap_or_else(|_| {
                Reply::from_error(&Error::Transport {
                    source: io::Error::new(io::ErrorKind::BrokenPipe, "command task vanished"),
                })
            }),
            None => Reply::closed("future"),
        };
        self.resolved = Some(reply.clone());
        reply
    }
}
