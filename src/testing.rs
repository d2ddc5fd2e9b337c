//! Scripted loopback server for hermetic protocol tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::core::config::Config;
use crate::proto::codec::Decoder;
use crate::proto::reply::Reply;

/// A single-connection mock Redis server.
///
/// Each script step reads the given number of command frames and then writes
/// the canned response bytes verbatim. After the script is exhausted the
/// socket is held open silently, so late reads block (or time out) instead
/// of seeing EOF.
pub(crate) struct MockServer {
    addr: std::net::SocketAddr,
    handle: JoinHandle<Vec<Reply>>,
}

impl MockServer {
    pub(crate) async fn start(script: Vec<(usize, Vec<u8>)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut decoder = Decoder::new();
            let mut received = Vec::new();

            for (expected, response) in script {
                let mut got = 0;
                while got < expected {
                    match decoder.decode().unwrap() {
                        Some(frame) => {
                            received.push(frame);
                            got += 1;
                        }
                        None => {
                            let mut buf = vec![0u8; 4096];
                            let n = socket.read(&mut buf).await.unwrap();
                            if n == 0 {
                                return received;
                            }
                            decoder.append(&buf[..n]);
                        }
                    }
                }
                if !response.is_empty() {
                    socket.write_all(&response).await.unwrap();
                }
            }

            // Drain until the client hangs up.
            let mut buf = vec![0u8; 4096];
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return received,
                    Ok(n) => {
                        decoder.append(&buf[..n]);
                        while let Ok(Some(frame)) = decoder.decode() {
                            received.push(frame);
                        }
                    }
                }
            }
        });

        Self { addr, handle }
    }

    /// A configuration pointing at this server.
    pub(crate) fn config(&self) -> Config {
        Config::new().address(self.addr.to_string())
    }

    /// Waits for the client to disconnect and returns every command frame
    /// the server received, in arrival order.
    pub(crate) async fn finish(self) -> Vec<Reply> {
        self.handle.await.unwrap()
    }
}
