//! RESP wire codec.
//!
//! The encoder turns a command name plus argument list into a request frame;
//! the decoder incrementally turns raw bytes into [`Reply`](crate::Reply)
//! values. Nothing outside this module touches wire bytes.

pub(crate) mod decoder;
pub(crate) mod encoder;

pub(crate) use decoder::Decoder;
pub(crate) use encoder::Encoder;
