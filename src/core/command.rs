use bytes::Bytes;

/// A command ready to be sent to Redis.
///
/// A `Cmd` is just the command name plus its arguments; the wire codec turns
/// it into a request frame at send time. The per-verb constructors in this
/// module cover the common commands, and `Cmd::new` is the escape hatch for
/// everything else:
///
/// ```
/// use redlink::cmd::Cmd;
///
/// let cmd = Cmd::new("OBJECT").arg("ENCODING").arg("mykey".to_string());
/// ```
#[derive(Debug, Clone)]
pub struct Cmd {
    args: Vec<Bytes>,
}

impl Cmd {
    /// Creates a new command with the given name.
    #[inline]
    pub fn new(name: impl Into<Bytes>) -> Self {
        Self {
            args: vec![name.into()],
        }
    }

    /// Appends an argument to the command.
    #[inline]
    pub fn arg<T: Into<Bytes>>(mut self, arg: T) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends every item of an iterator as an argument.
    #[inline]
    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The full argument vector, command name first.
    #[inline]
    pub(crate) fn parts(&self) -> &[Bytes] {
        &self.args
    }
}

/// Creates a PING command.
#[inline]
pub fn ping() -> Cmd {
    Cmd::new("PING")
}

/// Creates an ECHO command.
#[inline]
pub fn echo(msg: impl Into<Bytes>) -> Cmd {
    Cmd::new("ECHO").arg(msg)
}

/// Creates a GET command.
#[inline]
pub fn get(key: &str) -> Cmd {
    Cmd::new("GET").arg(key.to_string())
}

/// Creates a SET command.
#[inline]
pub fn set(key: &str, value: impl Into<Bytes>) -> Cmd {
    Cmd::new("SET").arg(key.to_string()).arg(value)
}

/// Creates a SETEX command.
#[inline]
pub fn setex(key: &str, seconds: u64, value: impl Into<Bytes>) -> Cmd {
    Cmd::new("SETEX")
        .arg(key.to_string())
        .arg(seconds.to_string())
        .arg(value)
}

/// Creates an MSET command from key/value pairs.
#[inline]
pub fn mset(pairs: &[(&str, &str)]) -> Cmd {
    let mut cmd = Cmd::new("MSET");
    for (key, value) in pairs {
        cmd = cmd.arg(key.to_string()).arg(value.to_string());
    }
    cmd
}

/// Creates a DEL command.
#[inline]
pub fn del(key: &str) -> Cmd {
    Cmd::new("DEL").arg(key.to_string())
}

/// Creates an EXISTS command.
#[inline]
pub fn exists(key: &str) -> Cmd {
    Cmd::new("EXISTS").arg(key.to_string())
}

/// Creates an INCR command.
#[inline]
pub fn incr(key: &str) -> Cmd {
    Cmd::new("INCR").arg(key.to_string())
}

/// Creates an RPUSH command.
#[inline]
pub fn rpush<I, T>(key: &str, values: I) -> Cmd
where
    I: IntoIterator<Item = T>,
    T: Into<Bytes>,
{
    Cmd::new("RPUSH").arg(key.to_string()).args(values)
}

/// Creates an LPUSH command.
#[inline]
pub fn lpush<I, T>(key: &str, values: I) -> Cmd
where
    I: IntoIterator<Item = T>,
    T: Into<Bytes>,
{
    Cmd::new("LPUSH").arg(key.to_string()).args(values)
}

/// Creates an LRANGE command.
#[inline]
pub fn lrange(key: &str, start: i64, stop: i64) -> Cmd {
    Cmd::new("LRANGE")
        .arg(key.to_string())
        .arg(start.to_string())
        .arg(stop.to_string())
}

/// Creates an HSET command.
#[inline]
pub fn hset(key: &str, field: &str, value: impl Into<Bytes>) -> Cmd {
    Cmd::new("HSET")
        .arg(key.to_string())
        .arg(field.to_string())
        .arg(value)
}

/// Creates an HGET command.
#[inline]
pub fn hget(key: &str, field: &str) -> Cmd {
    Cmd::new("HGET").arg(key.to_string()).arg(field.to_string())
}

/// Creates an HMSET command from field/value pairs.
#[inline]
pub fn hmset(key: &str, pairs: &[(&str, &str)]) -> Cmd {
    let mut cmd = Cmd::new("HMSET").arg(key.to_string());
    for (field, value) in pairs {
        cmd = cmd.arg(field.to_string()).arg(value.to_string());
    }
    cmd
}

/// Creates an HGETALL command.
#[inline]
pub fn hgetall(key: &str) -> Cmd {
    Cmd::new("HGETALL").arg(key.to_string())
}

/// Creates a PUBLISH command.
#[inline]
pub fn publish(channel: &str, payload: impl Into<Bytes>) -> Cmd {
    Cmd::new("PUBLISH").arg(channel.to_string()).arg(payload)
}

/// Creates a FLUSHDB command.
#[inline]
pub fn flushdb() -> Cmd {
    Cmd::new("FLUSHDB")
}

/// Creates a SELECT command.
#[inline]
pub fn select(db: u32) -> Cmd {
    Cmd::new("SELECT").arg(db.to_string())
}

/// Creates a WATCH command for the given keys.
#[inline]
pub fn watch(keys: &[&str]) -> Cmd {
    Cmd::new("WATCH").args(keys.iter().map(|k| k.to_string()))
}

/// Creates a MULTI command.
#[inline]
pub fn multi() -> Cmd {
    Cmd::new("MULTI")
}

/// Creates an EXEC command.
#[inline]
pub fn exec() -> Cmd {
    Cmd::new("EXEC")
}

/// Creates a SUBSCRIBE command for the given channels.
#[inline]
pub fn subscribe(channels: &[&str]) -> Cmd {
    Cmd::new("SUBSCRIBE").args(channels.iter().map(|c| c.to_string()))
}

/// Creates an UNSUBSCRIBE command; no channels means all.
#[inline]
pub fn unsubscribe(channels: &[&str]) -> Cmd {
    Cmd::new("UNSUBSCRIBE").args(channels.iter().map(|c| c.to_string()))
}

/// Creates a PSUBSCRIBE command for the given patterns.
#[inline]
pub fn psubscribe(patterns: &[&str]) -> Cmd {
    Cmd::new("PSUBSCRIBE").args(patterns.iter().map(|p| p.to_string()))
}

/// Creates a PUNSUBSCRIBE command; no patterns means all.
#[inline]
pub fn punsubscribe(patterns: &[&str]) -> Cmd {
    Cmd::new("PUNSUBSCRIBE").args(patterns.iter().map(|p| p.to_string()))
}
