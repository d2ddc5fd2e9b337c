use std::sync::Arc;

use bytes::Bytes;

use crate::core::command::{self as cmd, Cmd};
use crate::core::connection::Connection;
use crate::core::pool::Pool;
use crate::proto::reply::Reply;

/// A pipelined command batch over one exclusively held connection.
///
/// Commands are buffered locally until [`flush`](MultiCommand::flush) sends
/// them as a single batch, or until [`exec`](MultiCommand::exec) commits a
/// transaction. The connection is checked out when the builder is created
/// and held until [`close`](MultiCommand::close), so the server processes
/// the whole sequence without interleaving from other callers.
///
/// The read-before-write pattern combines both:
///
/// ```no_run
/// # use redlink::Client;
/// # async fn example(client: &Client) -> redlink::Result<()> {
/// let mut mc = client.multi_command().await?;
/// mc.watch(&["counter"]);
/// mc.get("counter");
/// let pre = mc.flush().await;
/// let current: i64 = pre.at(1).map_or(0, |r| r.str().map_or(0, |s| s.parse().unwrap_or(0)));
///
/// mc.multi();
/// mc.set("counter", (current + 1).to_string());
/// let outcome = mc.exec().await;
/// if outcome.is_nil() {
///     // a watched key changed; retry
/// }
/// mc.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MultiCommand {
    pool: Arc<Pool>,
    conn: Option<Connection>,
    queued: Vec<Cmd>,
    tx_open: bool,
}

impl MultiCommand {
    pub(crate) fn new(pool: Arc<Pool>, conn: Connection) -> Self {
        Self {
            pool,
            conn: Some(conn),
            queued: Vec::new(),
            tx_open: false,
        }
    }

    /// Buffers an arbitrary command; nothing is sent until flush or exec.
    pub fn queue(&mut self, cmd: Cmd) {
        self.queued.push(cmd);
    }

    /// Buffers a GET.
    pub fn get(&mut self, key: &str) {
        self.queue(cmd::get(key));
    }

    /// Buffers a SET.
    pub fn set(&mut self, key: &str, value: impl Into<Bytes>) {
        self.queue(cmd::set(key, value));
    }

    /// Buffers a DEL.
    pub fn del(&mut self, key: &str) {
        self.queue(cmd::del(key));
    }

    /// Buffers a WATCH for the given keys.
    ///
    /// Must be issued (and usually flushed) before [`multi`](Self::multi)
    /// for the optimistic-lock pattern to observe concurrent modifications.
    pub fn watch(&mut self, keys: &[&str]) {
        self.queue(cmd::watch(keys));
    }

    /// Opens the transaction boundary.
    ///
    /// Commands buffered after this point are queued server-side and only
    /// applied atomically at [`exec`](Self::exec). Calling `multi` twice is
    /// a no-op.
    pub fn multi(&mut self) {
        if !self.tx_open {
            self.tx_open = true;
            self.queue(cmd::multi());
        }
    }

    /// Sends everything buffered as one pipelined batch.
    ///
    /// Returns an array reply with exactly one element per buffered command,
    /// in issue order, and resets the buffer. A transport failure is
    /// reported once as the outer error reply and closes the builder.
    pub async fn flush(&mut self) -> Reply {
        match self.flush_inner().await {
            Ok(replies) => Reply::Array(replies),
            Err(reply) => reply,
        }
    }

    /// Commits the transaction and returns the EXEC outcome.
    ///
    /// The result is an array with one element per command queued after
    /// [`multi`](Self::multi), regardless of the individual outcomes — or
    /// [`Reply::Nil`] when the server aborted the transaction because a
    /// watched key was modified concurrently. Callers must check for the
    /// nil outcome explicitly; it is not an error reply.
    ///
    /// Without a preceding `multi` call an empty transaction is opened and
    /// committed, yielding an empty array.
    pub async fn exec(&mut self) -> Reply {
        self.multi();
        self.queue(cmd::exec());
        let result = self.flush_inner().await;
        self.tx_open = false;
        match result {
            Ok(mut replies) => replies.pop().unwrap_or(Reply::Nil),
            Err(reply) => reply,
        }
    }

    /// Returns the held connection to the pool.
    ///
    /// Buffered commands that were never flushed are discarded.
    pub async fn close(mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.checkin(conn).await;
        }
    }

    async fn flush_inner(&mut self) -> Result<Vec<Reply>, Reply> {
        let conn = match self.conn.as_mut() {
            Some(conn) => conn,
            None => return Err(Reply::closed("multi-command")),
        };
        let cmds = std::mem::take(&mut self.queued);
        match conn.send_batch(&cmds).await {
            Ok(replies) => Ok(replies),
            Err(e) => {
                // The connection may hold unread replies; never reuse it.
                self.conn = None;
                Err(Reply::from_error(&e))
            }
        }
    }
}

/// A transaction: a [`MultiCommand`] with the boundary pre-opened.
///
/// Everything queued lands inside MULTI/EXEC; [`exec`](Transaction::exec)
/// commits, returns the outcome, and releases the connection.
#[derive(Debug)]
pub struct Transaction {
    inner: MultiCommand,
}

impl Transaction {
    pub(crate) fn new(mut inner: MultiCommand) -> Self {
        inner.multi();
        Self { inner }
    }

    /// Buffers an arbitrary command inside the transaction.
    pub fn queue(&mut self, cmd: Cmd) {
        self.inner.queue(cmd);
    }

    /// Buffers a GET inside the transaction.
    pub fn get(&mut self, key: &str) {
        self.inner.get(key);
    }

    /// Buffers a SET inside the transaction.
    pub fn set(&mut self, key: &str, value: impl Into<Bytes>) {
        self.inner.set(key, value);
    }

    /// Buffers a DEL inside the transaction.
    pub fn del(&mut self, key: &str) {
        self.inner.del(key);
    }

    /// Commits the transaction; see [`MultiCommand::exec`] for the outcome
    /// contract.
    pub async fn exec(mut self) -> Reply {
        let reply = self.inner.exec().await;
        self.inner.close().await;
        reply
    }
}
