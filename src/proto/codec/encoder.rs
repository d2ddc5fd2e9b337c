use bytes::{BufMut, Bytes, BytesMut};

/// Encodes commands into RESP request frames.
///
/// Every request is an array of bulk strings: the command name followed by
/// its arguments. The encoder accumulates into an internal buffer so a
/// pipelined batch can be written with a single transport write.
#[derive(Debug)]
pub(crate) struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    pub(crate) fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    /// Appends one command frame to the buffer.
    ///
    /// `args` is the full argument vector, command name first.
    pub(crate) fn encode(&mut self, args: &[Bytes]) {
        self.buf.put_u8(b'*');
        self.buf.extend_from_slice(args.len().to_string().as_bytes());
        self.buf.extend_from_slice(b"\r\n");
        for arg in args {
            self.buf.put_u8(b'$');
            self.buf.extend_from_slice(arg.len().to_string().as_bytes());
            self.buf.extend_from_slice(b"\r\n");
            self.buf.extend_from_slice(arg);
            self.buf.extend_from_slice(b"\r\n");
        }
    }

    /// Takes the accumulated bytes, leaving the buffer empty for reuse.
    pub(crate) fn take(&mut self) -> BytesMut {
        self.buf.split()
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&'static str]) -> Vec<Bytes> {
        parts.iter().map(|p| Bytes::from_static(p.as_bytes())).collect()
    }

    #[test]
    fn test_encode_single_command() {
        let mut encoder = Encoder::new();
        encoder.encode(&args(&["GET", "key"]));
        assert_eq!(encoder.take().as_ref(), b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n");
    }

    #[test]
    fn test_encode_empty_argument() {
        let mut encoder = Encoder::new();
        encoder.encode(&args(&["SET", "key", ""]));
        assert_eq!(
            encoder.take().as_ref(),
            b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$0\r\n\r\n"
        );
    }

    #[test]
    fn test_encode_batch_accumulates() {
        let mut encoder = Encoder::new();
        encoder.encode(&args(&["PING"]));
        encoder.encode(&args(&["PING"]));
        assert_eq!(
            encoder.take().as_ref(),
            b"*1\r\n$4\r\nPING\r\n*1\r\n$4\r\nPING\r\n"
        );
    }

    #[test]
    fn test_take_resets_buffer() {
        let mut encoder = Encoder::new();
        encoder.encode(&args(&["PING"]));
        let _ = encoder.take();
        assert!(encoder.take().is_empty());
    }
}
