use tokio::sync::Mutex;
use tracing::debug;

use crate::core::command::Cmd;
use crate::core::config::Config;
use crate::core::connection::Connection;
use crate::proto::error::Result;
use crate::proto::reply::Reply;

/// Idle connections retained beyond this are closed on checkin.
const MAX_IDLE: usize = 8;

/// Checkout/checkin pool over one server.
///
/// The pool is the only structure concurrent callers mutate; the mutex over
/// the idle vector is the single point of mutual exclusion. A checked-out
/// connection is exclusively owned by its operation until it is checked back
/// in, so frames from different callers never interleave on one transport.
///
/// Connections that hit a transport or protocol error are never checked back
/// in: the caller drops them and the next checkout dials a fresh one.
#[derive(Debug)]
pub(crate) struct Pool {
    config: Config,
    idle: Mutex<Vec<Connection>>,
}

impl Pool {
    pub(crate) fn new(config: Config) -> Self {
        Self {
            config,
            idle: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    /// Takes an idle connection or dials a new one.
    pub(crate) async fn checkout(&self) -> Result<Connection> {
        if let Some(conn) = self.idle.lock().await.pop() {
            return Ok(conn);
        }
        debug!("dialing new connection");
        Connection::connect(&self.config).await
    }

    /// Returns a healthy connection for reuse.
    pub(crate) async fn checkin(&self, conn: Connection) {
        let mut idle = self.idle.lock().await;
        if idle.len() < MAX_IDLE {
            idle.push(conn);
        }
    }

    /// Runs one command with checkout/checkin discipline.
    ///
    /// Failures poison only this reply: the error is wrapped into a
    /// [`Reply::Error`] and the connection involved is discarded.
    pub(crate) async fn execute(&self, cmd: &Cmd) -> Reply {
        let mut conn = match self.checkout().await {
            Ok(conn) => conn,
            Err(e) => return Reply::from_error(&e),
        };
        match conn.send(cmd).await {
            Ok(reply) => {
                self.checkin(conn).await;
                reply
            }
            Err(e) => Reply::from_error(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command as cmd;
    use crate::testing::MockServer;

    #[tokio::test]
    async fn test_execute_reuses_checked_in_connection() {
        // The mock accepts a single connection; a second dial would fail.
        let server = MockServer::start(vec![
            (1, b"+OK\r\n".to_vec()),
            (1, b":5\r\n".to_vec()),
        ])
        .await;
        let pool = Pool::new(server.config());

        let first = pool.execute(&cmd::set("k", "v")).await;
        assert_eq!(first.str().unwrap(), "OK");
        let second = pool.execute(&cmd::incr("n")).await;
        assert_eq!(second.int().unwrap(), 5);
    }

    #[tokio::test]
    async fn test_execute_wraps_connect_failure() {
        // Point at a port nothing listens on.
        let pool = Pool::new(Config::new().address("127.0.0.1:1"));
        let reply = pool.execute(&cmd::ping()).await;
        let err = reply.error().expect("expected an error reply");
        assert_eq!(err.kind, crate::proto::reply::ReplyErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_failed_connection_is_not_reused() {
        let server = MockServer::start(vec![(1, b"+OK\r\n".to_vec())]).await;
        let pool = Pool::new(server.config());

        let ok = pool.execute(&cmd::ping()).await;
        assert!(!ok.is_error());

        // The server stops responding after its script; a short timeout
        // poisons the reply and the connection is dropped, not pooled.
        let pool = Pool::new(
            server
                .config()
                .timeout(std::time::Duration::from_millis(50)),
        );
        let failed = pool.execute(&cmd::ping()).await;
        assert!(failed.is_error());
        assert!(pool.idle.lock().await.is_empty());
    }
}
