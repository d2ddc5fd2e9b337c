use std::time::Duration;

use crate::proto::error::{Error, Result};

/// Default address used when neither an address nor a socket path is set.
const DEFAULT_ADDRESS: &str = "127.0.0.1:6379";

/// Client configuration.
///
/// Built with setter chaining and handed to [`Client::new`]:
///
/// ```
/// use std::time::Duration;
/// use redlink::Config;
///
/// let config = Config::new()
///     .address("127.0.0.1:6379")
///     .database(8)
///     .timeout(Duration::from_secs(10));
/// ```
///
/// The transport is either a TCP address (`host:port`) or a Unix socket
/// path; setting both is rejected when the client is built. The timeout
/// applies to connection establishment and to every read and write.
///
/// [`Client::new`]: crate::Client::new
#[derive(Debug, Clone, Default)]
pub struct Config {
    address: Option<String>,
    path: Option<String>,
    database: u32,
    timeout: Option<Duration>,
}

impl Config {
    /// Creates a configuration with defaults: TCP to `127.0.0.1:6379`,
    /// database 0, no timeout.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TCP address in `host:port` form.
    #[inline]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Sets the Unix socket path.
    #[inline]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the logical database selected on connect.
    #[inline]
    pub fn database(mut self, database: u32) -> Self {
        self.database = database;
        self
    }

    /// Sets the connect and per-operation timeout.
    #[inline]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Parses a configuration from a connection URL.
    ///
    /// Supported forms are `redis://host:port/db` and `unix:///path/to.sock`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unparseable URLs, unknown schemes, and
    /// non-numeric database segments.
    pub fn from_url(input: &str) -> Result<Self> {
        let parsed = url::Url::parse(input).map_err(|e| Error::Config {
            message: format!("invalid url: {e}"),
        })?;

        match parsed.scheme() {
            "redis" => {
                let host = parsed.host_str().ok_or_else(|| Error::Config {
                    message: "missing host in url".to_string(),
                })?;
                let port = parsed.port().unwrap_or(6379);
                let mut config = Config::new().address(format!("{host}:{port}"));
                let db_segment = parsed.path().trim_start_matches('/');
                if !db_segment.is_empty() {
                    let database = db_segment.parse::<u32>().map_err(|_| Error::Config {
                        message: format!("invalid database in url: {db_segment}"),
                    })?;
                    config = config.database(database);
                }
                Ok(config)
            }
            "unix" => Ok(Config::new().path(parsed.path())),
            other => Err(Error::Config {
                message: format!("unsupported scheme: {other}"),
            }),
        }
    }

    /// Checks option consistency; called once at client construction.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.address.is_some() && self.path.is_some() {
            return Err(Error::Config {
                message: "address and path are mutually exclusive".to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn addr(&self) -> &str {
        self.address.as_deref().unwrap_or(DEFAULT_ADDRESS)
    }

    pub(crate) fn socket_path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub(crate) fn db(&self) -> u32 {
        self.database
    }

    pub(crate) fn op_timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
