use std::collections::HashSet;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::core::command as cmd;
use crate::core::config::Config;
use crate::core::connection::{Connection, WriteEnd};
use crate::proto::error::{Error, Result};
use crate::proto::reply::Reply;

/// A message published to a subscribed channel or pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Delivered because of a direct channel subscription.
    Channel {
        /// The channel the message was published to.
        channel: String,
        /// The published payload.
        payload: Bytes,
    },
    /// Delivered because of a pattern subscription.
    Pattern {
        /// The pattern that matched.
        pattern: String,
        /// The channel the message was published to.
        channel: String,
        /// The published payload.
        payload: Bytes,
    },
}

impl Message {
    /// The channel the message was published to.
    pub fn channel(&self) -> &str {
        match self {
            Message::Channel { channel, .. } | Message::Pattern { channel, .. } => channel,
        }
    }

    /// The published payload.
    pub fn payload(&self) -> &Bytes {
        match self {
            Message::Channel { payload, .. } | Message::Pattern { payload, .. } => payload,
        }
    }

    /// Classifies an inbound reply on a subscription connection.
    ///
    /// `None` for everything that is not a published message, i.e. the
    /// subscribe/unsubscribe acknowledgement frames.
    fn from_reply(reply: &Reply) -> Option<Message> {
        let elems = reply.elems().ok()?;
        match elems.first()?.str().ok()? {
            "message" if elems.len() == 3 => Some(Message::Channel {
                channel: elems[1].str().ok()?.to_owned(),
                payload: elems[2].bytes().ok()?.clone(),
            }),
            "pmessage" if elems.len() == 4 => Some(Message::Pattern {
                pattern: elems[1].str().ok()?.to_owned(),
                channel: elems[2].str().ok()?.to_owned(),
                payload: elems[3].bytes().ok()?.clone(),
            }),
            _ => None,
        }
    }
}

/// A pub/sub subscription over its own dedicated connection.
///
/// Created by [`Client::subscription`]: the connection is split, a
/// background task loops over inbound frames, and every published message is
/// handed to the single registered handler synchronously on that task. The
/// handler therefore gates delivery — messages arrive in server-send order
/// with no concurrent handler invocations — and must not block for long.
///
/// The connection only ever carries subscription traffic; ordinary commands
/// (including `PUBLISH`) go through the [`Client`].
///
/// [`Client`]: crate::Client
/// [`Client::subscription`]: crate::Client::subscription
#[derive(Debug)]
pub struct Subscription {
    write: WriteEnd,
    channels: HashSet<String>,
    patterns: HashSet<String>,
    reader: JoinHandle<()>,
    closed: bool,
}

impl Subscription {
    pub(crate) async fn open<F>(config: &Config, mut handler: F) -> Result<Self>
    where
        F: FnMut(Message) + Send + 'static,
    {
        let conn = Connection::connect(config).await?;
        let (mut read, write) = conn.split();

        let reader = tokio::spawn(async move {
            loop {
                match read.read_reply().await {
                    Ok(reply) => match Message::from_reply(&reply) {
                        Some(msg) => handler(msg),
                        None => debug!(?reply, "subscription acknowledgement"),
                    },
                    Err(e) => {
                        error!(error = %e, "subscription read loop terminated");
                        return;
                    }
                }
            }
        });

        Ok(Self {
            write,
            channels: HashSet::new(),
            patterns: HashSet::new(),
            reader,
            closed: false,
        })
    }

    /// The channels currently subscribed to.
    pub fn channels(&self) -> &HashSet<String> {
        &self.channels
    }

    /// The patterns currently subscribed to.
    pub fn patterns(&self) -> &HashSet<String> {
        &self.patterns
    }

    /// Subscribes to the given channels.
    ///
    /// Names already in the active set are skipped; the set never holds
    /// duplicates.
    pub async fn subscribe(&mut self, channels: &[&str]) -> Result<()> {
        self.ensure_open()?;
        let fresh: Vec<&str> = channels
            .iter()
            .copied()
            .filter(|c| !self.channels.contains(*c))
            .collect();
        if fresh.is_empty() {
            return Ok(());
        }
        self.channels.extend(fresh.iter().map(|c| c.to_string()));
        self.write.write_cmd(&cmd::subscribe(&fresh)).await
    }

    /// Subscribes to the given patterns.
    pub async fn psubscribe(&mut self, patterns: &[&str]) -> Result<()> {
        self.ensure_open()?;
        let fresh: Vec<&str> = patterns
            .iter()
            .copied()
            .filter(|p| !self.patterns.contains(*p))
            .collect();
        if fresh.is_empty() {
            return Ok(());
        }
        self.patterns.extend(fresh.iter().map(|p| p.to_string()));
        self.write.write_cmd(&cmd::psubscribe(&fresh)).await
    }

    /// Unsubscribes from the given channels, or from all of them when the
    /// list is empty.
    ///
    /// Removal is a pure set difference: unsubscribing a channel that was
    /// never subscribed changes nothing and is not an error.
    pub async fn unsubscribe(&mut self, channels: &[&str]) -> Result<()> {
        self.ensure_open()?;
        if channels.is_empty() {
            if self.channels.is_empty() {
                return Ok(());
            }
            self.channels.clear();
            return self.write.write_cmd(&cmd::unsubscribe(&[])).await;
        }
        let known: Vec<&str> = channels
            .iter()
            .copied()
            .filter(|c| self.channels.contains(*c))
            .collect();
        if known.is_empty() {
            return Ok(());
        }
        for channel in &known {
            self.channels.remove(*channel);
        }
        self.write.write_cmd(&cmd::unsubscribe(&known)).await
    }

    /// Unsubscribes from the given patterns, or from all of them when the
    /// list is empty.
    pub async fn punsubscribe(&mut self, patterns: &[&str]) -> Result<()> {
        self.ensure_open()?;
        if patterns.is_empty() {
            if self.patterns.is_empty() {
                return Ok(());
            }
            self.patterns.clear();
            return self.write.write_cmd(&cmd::punsubscribe(&[])).await;
        }
        let known: Vec<&str> = patterns
            .iter()
            .copied()
            .filter(|p| self.patterns.contains(*p))
            .collect();
        if known.is_empty() {
            return Ok(());
        }
        for pattern in &known {
            self.patterns.remove(*pattern);
        }
        self.write.write_cmd(&cmd::punsubscribe(&known)).await
    }

    /// Terminates the read loop and releases the connection.
    ///
    /// Deterministic: the background task has fully stopped when this
    /// returns. Every later operation fails with the subscription-closed
    /// error. Idempotent.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.channels.clear();
        self.patterns.clear();
        self.reader.abort();
        let _ = (&mut self.reader).await;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Closed {
                resource: "subscription",
            });
        }
        Ok(())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockServer;
    use tokio::sync::mpsc;

    fn channel_handler() -> (
        impl FnMut(Message) + Send + 'static,
        mpsc::UnboundedReceiver<Message>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            move |msg| {
                let _ = tx.send(msg);
            },
            rx,
        )
    }

    #[tokio::test]
    async fn test_channel_message_delivery() {
        let server = MockServer::start(vec![(
            1,
            b"*3\r\n$9\r\nsubscribe\r\n$2\r\nc1\r\n:1\r\n\
              *3\r\n$7\r\nmessage\r\n$2\r\nc1\r\n$1\r\nx\r\n"
                .to_vec(),
        )])
        .await;
        let (handler, mut rx) = channel_handler();
        let mut sub = Subscription::open(&server.config(), handler).await.unwrap();

        sub.subscribe(&["c1"]).await.unwrap();
        let msg = rx.recv().await.unwrap();
        assert_eq!(
            msg,
            Message::Channel {
                channel: "c1".to_string(),
                payload: Bytes::from("x"),
            }
        );
        sub.close().await;
    }

    #[tokio::test]
    async fn test_pattern_message_delivery() {
        let server = MockServer::start(vec![(
            1,
            b"*3\r\n$10\r\npsubscribe\r\n$2\r\nc*\r\n:1\r\n\
              *4\r\n$8\r\npmessage\r\n$2\r\nc*\r\n$2\r\nc2\r\n$1\r\ny\r\n"
                .to_vec(),
        )])
        .await;
        let (handler, mut rx) = channel_handler();
        let mut sub = Subscription::open(&server.config(), handler).await.unwrap();

        sub.psubscribe(&["c*"]).await.unwrap();
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.channel(), "c2");
        assert!(matches!(msg, Message::Pattern { ref pattern, .. } if pattern == "c*"));
        sub.close().await;
    }

    #[tokio::test]
    async fn test_messages_arrive_in_order() {
        let server = MockServer::start(vec![(
            1,
            b"*3\r\n$9\r\nsubscribe\r\n$2\r\nc1\r\n:1\r\n\
              *3\r\n$7\r\nmessage\r\n$2\r\nc1\r\n$1\r\na\r\n\
              *3\r\n$7\r\nmessage\r\n$2\r\nc1\r\n$1\r\nb\r\n\
              *3\r\n$7\r\nmessage\r\n$2\r\nc1\r\n$1\r\nc\r\n"
                .to_vec(),
        )])
        .await;
        let (handler, mut rx) = channel_handler();
        let mut sub = Subscription::open(&server.config(), handler).await.unwrap();

        sub.subscribe(&["c1"]).await.unwrap();
        for expected in ["a", "b", "c"] {
            let msg = rx.recv().await.unwrap();
            assert_eq!(msg.payload().as_ref(), expected.as_bytes());
        }
        sub.close().await;
    }

    #[tokio::test]
    async fn test_subscribe_deduplicates() {
        let server = MockServer::start(vec![(1, Vec::new())]).await;
        let (handler, _rx) = channel_handler();
        let mut sub = Subscription::open(&server.config(), handler).await.unwrap();

        sub.subscribe(&["c1"]).await.unwrap();
        sub.subscribe(&["c1"]).await.unwrap();
        assert_eq!(sub.channels().len(), 1);

        sub.close().await;
        let commands = server.finish().await;
        // Only one SUBSCRIBE frame ever went out.
        assert_eq!(commands.len(), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_channel_is_a_noop() {
        let server = MockServer::start(vec![(1, Vec::new())]).await;
        let (handler, _rx) = channel_handler();
        let mut sub = Subscription::open(&server.config(), handler).await.unwrap();

        sub.subscribe(&["c1"]).await.unwrap();
        sub.unsubscribe(&["never-subscribed"]).await.unwrap();
        assert_eq!(sub.channels().len(), 1);
        assert!(sub.channels().contains("c1"));

        sub.close().await;
        let commands = server.finish().await;
        // The no-op unsubscribe sent nothing.
        assert_eq!(commands.len(), 1);
    }

    #[tokio::test]
    async fn test_operations_after_close_fail() {
        let server = MockServer::start(vec![]).await;
        let (handler, _rx) = channel_handler();
        let mut sub = Subscription::open(&server.config(), handler).await.unwrap();

        sub.close().await;
        let err = sub.subscribe(&["c1"]).await.unwrap_err();
        assert!(matches!(err, Error::Closed { .. }));
        // close is idempotent
        sub.close().await;
    }
}
