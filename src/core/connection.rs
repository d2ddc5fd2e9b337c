use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;
use tracing::{debug, error};

use crate::core::command::{self as cmd, Cmd};
use crate::core::config::Config;
use crate::proto::codec::{Decoder, Encoder};
use crate::proto::error::{Error, Result};
use crate::proto::reply::Reply;

/// The physical transport, selected by the configuration.
#[derive(Debug)]
pub(crate) enum Stream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_read(cx, buf),
            #[cfg(unix)]
            Stream::Unix(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_write(cx, buf),
            #[cfg(unix)]
            Stream::Unix(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_flush(cx),
            #[cfg(unix)]
            Stream::Unix(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            #[cfg(unix)]
            Stream::Unix(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}

/// A connection to a Redis server.
///
/// Owns exactly one transport plus the codec state for it. Requests and
/// replies on a connection are strictly ordered: reply N is read before
/// request N+1 goes out, except in [`send_batch`](Connection::send_batch),
/// which writes the whole batch first and then reads exactly one reply per
/// command, in issue order.
///
/// A connection that returns an error from any operation must be discarded;
/// its request/reply pairing can no longer be trusted.
pub(crate) struct Connection {
    stream: Stream,
    decoder: Decoder,
    encoder: Encoder,
    timeout: Option<Duration>,
}

impl Connection {
    /// Dials the transport selected by `config` and prepares the connection,
    /// selecting the configured database when it is non-zero.
    pub(crate) async fn connect(config: &Config) -> Result<Self> {
        let timeout = config.op_timeout();

        let stream = match config.socket_path() {
            Some(path) => {
                #[cfg(unix)]
                {
                    let s = with_timeout(timeout, "connect", async {
                        Ok(UnixStream::connect(path).await?)
                    })
                    .await?;
                    Stream::Unix(s)
                }
                #[cfg(not(unix))]
                {
                    let _ = path;
                    return Err(Error::Config {
                        message: "unix socket paths are not supported on this platform"
                            .to_string(),
                    });
                }
            }
            None => {
                let addr = config.addr();
                let s = with_timeout(timeout, "connect", async {
                    Ok(TcpStream::connect(addr).await?)
                })
                .await?;
                Stream::Tcp(s)
            }
        };

        let mut conn = Self {
            stream,
            decoder: Decoder::new(),
            encoder: Encoder::new(),
            timeout,
        };

        if config.db() != 0 {
            let reply = conn.send(&cmd::select(config.db())).await?;
            if let Some(err) = reply.error() {
                return Err(Error::Config {
                    message: format!("selecting database {} failed: {}", config.db(), err),
                });
            }
        }

        Ok(conn)
    }

    /// One round trip: write the command, read its reply.
    pub(crate) async fn send(&mut self, cmd: &Cmd) -> Result<Reply> {
        self.write_batch(std::slice::from_ref(cmd)).await?;
        self.read_reply().await
    }

    /// Writes all commands as one pipelined batch, then reads exactly one
    /// reply per command in issue order.
    pub(crate) async fn send_batch(&mut self, cmds: &[Cmd]) -> Result<Vec<Reply>> {
        self.write_batch(cmds).await?;
        let mut replies = Vec::with_capacity(cmds.len());
        for _ in 0..cmds.len() {
            replies.push(self.read_reply().await?);
        }
        Ok(replies)
    }

    async fn write_batch(&mut self, cmds: &[Cmd]) -> Result<()> {
        for cmd in cmds {
            debug!(?cmd, "sending command");
            self.encoder.encode(cmd.parts());
        }
        let data = self.encoder.take();
        let timeout = self.timeout;
        let stream = &mut self.stream;
        with_timeout(timeout, "write", async move {
            stream.write_all(&data).await?;
            Ok(())
        })
        .await
        .inspect_err(|e| error!(error = %e, "failed to write command batch"))
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let timeout = self.timeout;
        loop {
            if let Some(reply) = self.decoder.decode()? {
                debug!(?reply, "received reply");
                return Ok(reply);
            }
            let stream = &mut self.stream;
            let (n, buf) = with_timeout(timeout, "read", async move {
                let mut buf = vec![0u8; 4096];
                let n = stream.read(&mut buf).await?;
                Ok((n, buf))
            })
            .await
            .inspect_err(|e| error!(error = %e, "failed to read reply"))?;
            if n == 0 {
                return Err(Error::Protocol {
                    message: "connection closed by peer".to_string(),
                });
            }
            self.decoder.append(&buf[..n]);
        }
    }

    /// Splits the connection into a read end and a write end.
    ///
    /// Used by subscriptions, where one task blocks on inbound messages
    /// while the owner keeps sending control frames.
    pub(crate) fn split(self) -> (ReadEnd, WriteEnd) {
        let (read, write) = tokio::io::split(self.stream);
        (
            ReadEnd {
                read,
                decoder: self.decoder,
            },
            WriteEnd {
                write,
                encoder: self.encoder,
                timeout: self.timeout,
            },
        )
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("stream", &self.stream)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// The reading half of a split connection.
///
/// Reads deliberately carry no timeout: a subscription loop legitimately
/// blocks for as long as no message is published.
pub(crate) struct ReadEnd {
    read: ReadHalf<Stream>,
    decoder: Decoder,
}

impl ReadEnd {
    pub(crate) async fn read_reply(&mut self) -> Result<Reply> {
        loop {
            if let Some(reply) = self.decoder.decode()? {
                return Ok(reply);
            }
            let mut buf = vec![0u8; 4096];
            let n = self.read.read(&mut buf).await?;
            if n == 0 {
                return Err(Error::Protocol {
                    message: "connection closed by peer".to_string(),
                });
            }
            self.decoder.append(&buf[..n]);
        }
    }
}

/// The writing half of a split connection.
#[derive(Debug)]
pub(crate) struct WriteEnd {
    write: WriteHalf<Stream>,
    encoder: Encoder,
    timeout: Option<Duration>,
}

impl WriteEnd {
    pub(crate) async fn write_cmd(&mut self, cmd: &Cmd) -> Result<()> {
        debug!(?cmd, "sending control command");
        self.encoder.encode(cmd.parts());
        let data = self.encoder.take();
        let timeout = self.timeout;
        let write = &mut self.write;
        with_timeout(timeout, "write", async move {
            write.write_all(&data).await?;
            Ok(())
        })
        .await
    }
}

async fn with_timeout<F, T>(timeout: Option<Duration>, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(t) => tokio::time::timeout(t, fut)
            .await
            .map_err(|_| Error::timed_out(what))?,
        None => fut.await,
    }
}
