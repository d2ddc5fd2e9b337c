//! Client, command dispatch, and execution engines.
//!
//! # Modules
//!
//! - [`command`] - Command construction helpers
//! - [`config`] - Client configuration
//! - [`connection`] - Single-connection transport handling
//! - [`pool`] - Connection checkout/checkin
//! - [`multi`] - Pipelined batches and transactions
//! - [`future`] - Detached command execution
//! - [`pubsub`] - Subscriptions and message dispatch

use std::sync::Arc;

use bytes::Bytes;

pub mod command;
pub mod config;
pub(crate) mod connection;
pub mod future;
pub mod multi;
pub(crate) mod pool;
pub mod pubsub;

use self::command::{self as cmd, Cmd};
use self::config::Config;
use self::future::CommandFuture;
use self::multi::{MultiCommand, Transaction};
use self::pool::Pool;
use self::pubsub::{Message, Subscription};

use crate::proto::error::Result;
use crate::proto::reply::Reply;

/// An asynchronous Redis client.
///
/// One `Client` per logical application: it is cheap to clone and every
/// command method is safe to call from concurrent tasks. Internally a
/// connection pool serializes access to each transport, so frames from
/// different callers never interleave on one connection.
///
/// Command methods return a [`Reply`] directly. Server errors are carried
/// inside the reply, not raised — a failed command poisons only its own
/// reply and the client keeps working:
///
/// ```no_run
/// use redlink::{Client, Config, Reply};
///
/// #[tokio::main]
/// async fn main() -> redlink::Result<()> {
///     let client = Client::new(Config::new().address("127.0.0.1:6379")).await?;
///
///     client.set("mykey", "myval").await;
///     match client.get("mykey").await {
///         Reply::Bulk(value) => println!("mykey: {:?}", value),
///         Reply::Nil => println!("mykey does not exist"),
///         Reply::Error(e) => eprintln!("get failed: {e}"),
///         other => eprintln!("unexpected reply: {other:?}"),
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    pool: Arc<Pool>,
}

impl Client {
    /// Builds a client from the configuration.
    ///
    /// Validates the configuration and dials one connection eagerly, so an
    /// unreachable server, a bad option combination, or a failing database
    /// selection is reported here as a hard error rather than on the first
    /// command.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let pool = Pool::new(config);
        let conn = pool.checkout().await?;
        pool.checkin(conn).await;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Sends an arbitrary command and returns its reply.
    ///
    /// The escape hatch for commands without a dedicated method.
    pub async fn command(&self, cmd: Cmd) -> Reply {
        self.pool.execute(&cmd).await
    }

    /// Sends a PING.
    pub async fn ping(&self) -> Reply {
        self.command(cmd::ping()).await
    }

    /// Echoes a message back from the server.
    pub async fn echo(&self, msg: impl Into<Bytes>) -> Reply {
        self.command(cmd::echo(msg)).await
    }

    /// Gets the value of a key. Missing keys reply [`Reply::Nil`].
    pub async fn get(&self, key: &str) -> Reply {
        self.command(cmd::get(key)).await
    }

    /// Sets the value of a key.
    pub async fn set(&self, key: &str, value: impl Into<Bytes>) -> Reply {
        self.command(cmd::set(key, value)).await
    }

    /// Sets the value of a key with an expiry in seconds.
    pub async fn setex(&self, key: &str, seconds: u64, value: impl Into<Bytes>) -> Reply {
        self.command(cmd::setex(key, seconds, value)).await
    }

    /// Sets multiple keys at once.
    pub async fn mset(&self, pairs: &[(&str, &str)]) -> Reply {
        self.command(cmd::mset(pairs)).await
    }

    /// Removes a key.
    pub async fn del(&self, key: &str) -> Reply {
        self.command(cmd::del(key)).await
    }

    /// Checks whether a key exists.
    pub async fn exists(&self, key: &str) -> Reply {
        self.command(cmd::exists(key)).await
    }

    /// Increments the integer value of a key by one.
    pub async fn incr(&self, key: &str) -> Reply {
        self.command(cmd::incr(key)).await
    }

    /// Appends values to the tail of a list.
    pub async fn rpush<I, T>(&self, key: &str, values: I) -> Reply
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        self.command(cmd::rpush(key, values)).await
    }

    /// Prepends values to the head of a list.
    pub async fn lpush<I, T>(&self, key: &str, values: I) -> Reply
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        self.command(cmd::lpush(key, values)).await
    }

    /// Returns a range of a list; use `0, -1` for the whole list.
    pub async fn lrange(&self, key: &str, start: i64, stop: i64) -> Reply {
        self.command(cmd::lrange(key, start, stop)).await
    }

    /// Sets one hash field.
    pub async fn hset(&self, key: &str, field: &str, value: impl Into<Bytes>) -> Reply {
        self.command(cmd::hset(key, field, value)).await
    }

    /// Gets one hash field.
    pub async fn hget(&self, key: &str, field: &str) -> Reply {
        self.command(cmd::hget(key, field)).await
    }

    /// Sets multiple hash fields at once.
    pub async fn hmset(&self, key: &str, pairs: &[(&str, &str)]) -> Reply {
        self.command(cmd::hmset(key, pairs)).await
    }

    /// Returns all fields of a hash; decode with
    /// [`Reply::string_map`](crate::Reply::string_map).
    pub async fn hgetall(&self, key: &str) -> Reply {
        self.command(cmd::hgetall(key)).await
    }

    /// Publishes a message to a channel.
    pub async fn publish(&self, channel: &str, payload: impl Into<Bytes>) -> Reply {
        self.command(cmd::publish(channel, payload)).await
    }

    /// Removes every key of the selected database.
    pub async fn flushdb(&self) -> Reply {
        self.command(cmd::flushdb()).await
    }

    /// Sends an arbitrary command without waiting for its reply.
    ///
    /// The round trip runs on a background task; collect the outcome later
    /// through [`CommandFuture::reply`].
    pub fn async_command(&self, cmd: Cmd) -> CommandFuture {
        CommandFuture::spawn(self.pool.clone(), cmd)
    }

    /// GET without waiting for the reply.
    pub fn async_get(&self, key: &str) -> CommandFuture {
        self.async_command(cmd::get(key))
    }

    /// SET without waiting for the reply.
    pub fn async_set(&self, key: &str, value: impl Into<Bytes>) -> CommandFuture {
        self.async_command(cmd::set(key, value))
    }

    /// Starts a pipelined batch on an exclusively held connection.
    ///
    /// The connection comes from the pool and is only returned by
    /// [`MultiCommand::close`]; checkout failures are reported here.
    pub async fn multi_command(&self) -> Result<MultiCommand> {
        let conn = self.pool.checkout().await?;
        Ok(MultiCommand::new(self.pool.clone(), conn))
    }

    /// Starts a transaction: a [`MultiCommand`] with the MULTI boundary
    /// already open; [`Transaction::exec`] commits and releases the
    /// connection.
    pub async fn transaction(&self) -> Result<Transaction> {
        Ok(Transaction::new(self.multi_command().await?))
    }

    /// Opens a subscription on its own dedicated connection.
    ///
    /// Every published message is delivered to `handler` synchronously on
    /// the subscription's read loop, in server-send order.
    pub async fn subscription<F>(&self, handler: F) -> Result<Subscription>
    where
        F: FnMut(Message) + Send + 'static,
    {
        Subscription::open(self.pool.config(), handler).await
    }
}
