use bytes::{Buf, Bytes, BytesMut};

use crate::proto::error::{Error, Result};
use crate::proto::reply::{Reply, ReplyError};

/// Streaming RESP decoder.
///
/// Call [`append`](Decoder::append) when data arrives, then
/// [`decode`](Decoder::decode) to pull out complete replies. `Ok(None)`
/// means more bytes are needed; the buffer is only consumed once a whole
/// reply (including nested array elements) has been parsed, so a partial
/// frame can always be resumed.
///
/// Server error lines (`-ERR …`) decode into [`Reply::Error`]; decoding
/// itself only fails on malformed input.
#[derive(Debug, Default)]
pub(crate) struct Decoder {
    buf: BytesMut,
}

impl Decoder {
    pub(crate) fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    /// Appends raw bytes received from the transport.
    pub(crate) fn append(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Attempts to decode the next complete reply.
    pub(crate) fn decode(&mut self) -> Result<Option<Reply>> {
        let mut pos = 0;
        match parse(&self.buf, &mut pos)? {
            Some(reply) => {
                self.buf.advance(pos);
                Ok(Some(reply))
            }
            None => Ok(None),
        }
    }
}

/// Parses one reply starting at `*pos`, advancing `*pos` past it.
///
/// Leaves `*pos` untouched relative to complete frames when input runs out,
/// which is what makes partial arrays restartable.
fn parse(buf: &[u8], pos: &mut usize) -> Result<Option<Reply>> {
    if *pos >= buf.len() {
        return Ok(None);
    }

    match buf[*pos] {
        b'+' => {
            let line = match take_line(buf, pos) {
                Some(line) => line,
                None => return Ok(None),
            };
            Ok(Some(Reply::Status(utf8_line(line)?)))
        }
        b'-' => {
            let line = match take_line(buf, pos) {
                Some(line) => line,
                None => return Ok(None),
            };
            Ok(Some(Reply::Error(ReplyError::server(utf8_line(line)?))))
        }
        b':' => {
            let line = match take_line(buf, pos) {
                Some(line) => line,
                None => return Ok(None),
            };
            Ok(Some(Reply::Integer(parse_int(line)?)))
        }
        b'$' => {
            let mark = *pos;
            let line = match take_line(buf, pos) {
                Some(line) => line,
                None => return Ok(None),
            };
            let len = parse_int(line)?;
            if len == -1 {
                return Ok(Some(Reply::Nil));
            }
            let len = usize::try_from(len).map_err(|_| malformed("negative bulk length"))?;
            if buf.len() < *pos + len + 2 {
                *pos = mark;
                return Ok(None);
            }
            let data = Bytes::copy_from_slice(&buf[*pos..*pos + len]);
            *pos += len + 2;
            Ok(Some(Reply::Bulk(data)))
        }
        b'*' => {
            let mark = *pos;
            let line = match take_line(buf, pos) {
                Some(line) => line,
                None => return Ok(None),
            };
            let len = parse_int(line)?;
            if len == -1 {
                return Ok(Some(Reply::Nil));
            }
            let len = usize::try_from(len).map_err(|_| malformed("negative array length"))?;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                match parse(buf, pos)? {
                    Some(reply) => items.push(reply),
                    None => {
                        *pos = mark;
                        return Ok(None);
                    }
                }
            }
            Ok(Some(Reply::Array(items)))
        }
        tag => Err(malformed(&format!("unknown frame tag: {}", tag as char))),
    }
}

/// Returns the line payload between the tag byte and CRLF, advancing `*pos`
/// past the terminator. `None` when the terminator has not arrived yet.
fn take_line<'a>(buf: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    let start = *pos + 1;
    for i in start..buf.len().saturating_sub(1) {
        if buf[i] == b'\r' && buf[i + 1] == b'\n' {
            *pos = i + 2;
            return Some(&buf[start..i]);
        }
    }
    None
}

fn utf8_line(line: &[u8]) -> Result<String> {
    std::str::from_utf8(line)
        .map(str::to_owned)
        .map_err(|_| malformed("non-utf8 line"))
}

fn parse_int(line: &[u8]) -> Result<i64> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| malformed("invalid integer"))
}

fn malformed(message: &str) -> Error {
    Error::Protocol {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::reply::ReplyErrorKind;

    #[test]
    fn test_decode_status() {
        let mut decoder = Decoder::new();
        decoder.append(b"+OK\r\n");
        assert_eq!(
            decoder.decode().unwrap(),
            Some(Reply::Status("OK".to_string()))
        );
    }

    #[test]
    fn test_decode_server_error_is_a_reply() {
        let mut decoder = Decoder::new();
        decoder.append(b"-ERR unknown command\r\n");
        let reply = decoder.decode().unwrap().unwrap();
        let err = reply.error().unwrap();
        assert_eq!(err.kind, ReplyErrorKind::Server);
        assert_eq!(err.message, "ERR unknown command");
    }

    #[test]
    fn test_decode_integer() {
        let mut decoder = Decoder::new();
        decoder.append(b":-42\r\n");
        assert_eq!(decoder.decode().unwrap(), Some(Reply::Integer(-42)));
    }

    #[test]
    fn test_decode_bulk() {
        let mut decoder = Decoder::new();
        decoder.append(b"$5\r\nhello\r\n");
        assert_eq!(
            decoder.decode().unwrap(),
            Some(Reply::Bulk(Bytes::from("hello")))
        );
    }

    #[test]
    fn test_decode_nil_bulk() {
        let mut decoder = Decoder::new();
        decoder.append(b"$-1\r\n");
        assert_eq!(decoder.decode().unwrap(), Some(Reply::Nil));
    }

    #[test]
    fn test_decode_nil_array() {
        let mut decoder = Decoder::new();
        decoder.append(b"*-1\r\n");
        assert_eq!(decoder.decode().unwrap(), Some(Reply::Nil));
    }

    #[test]
    fn test_decode_array() {
        let mut decoder = Decoder::new();
        decoder.append(b"*2\r\n$3\r\nfoo\r\n:7\r\n");
        assert_eq!(
            decoder.decode().unwrap(),
            Some(Reply::Array(vec![
                Reply::Bulk(Bytes::from("foo")),
                Reply::Integer(7),
            ]))
        );
    }

    #[test]
    fn test_decode_partial_line() {
        let mut decoder = Decoder::new();
        decoder.append(b"+OK\r");
        assert_eq!(decoder.decode().unwrap(), None);
        decoder.append(b"\n");
        assert_eq!(
            decoder.decode().unwrap(),
            Some(Reply::Status("OK".to_string()))
        );
    }

    #[test]
    fn test_decode_partial_array_is_restartable() {
        let mut decoder = Decoder::new();
        decoder.append(b"*2\r\n$3\r\nfoo\r\n");
        assert_eq!(decoder.decode().unwrap(), None);
        // The array header must not have been consumed.
        decoder.append(b"$3\r\nbar\r\n");
        assert_eq!(
            decoder.decode().unwrap(),
            Some(Reply::Array(vec![
                Reply::Bulk(Bytes::from("foo")),
                Reply::Bulk(Bytes::from("bar")),
            ]))
        );
    }

    #[test]
    fn test_decode_pipelined_replies() {
        let mut decoder = Decoder::new();
        decoder.append(b"+OK\r\n:1\r\n+QUEUED\r\n");
        assert_eq!(
            decoder.decode().unwrap(),
            Some(Reply::Status("OK".to_string()))
        );
        assert_eq!(decoder.decode().unwrap(), Some(Reply::Integer(1)));
        assert_eq!(
            decoder.decode().unwrap(),
            Some(Reply::Status("QUEUED".to_string()))
        );
        assert_eq!(decoder.decode().unwrap(), None);
    }

    #[test]
    fn test_decode_unknown_tag() {
        let mut decoder = Decoder::new();
        decoder.append(b"!oops\r\n");
        assert!(matches!(decoder.decode(), Err(Error::Protocol { .. })));
    }
}
