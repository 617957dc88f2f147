//! Errors raised while decoding untrusted bytes.

use thiserror::Error;

/// Error raised by codec operations.
#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("extra data: {0} bytes")]
    ExtraData(usize),
    #[error("invalid length: {0}")]
    InvalidLength(usize),
    #[error("invalid varint")]
    InvalidVarint,
    #[error("invalid bool")]
    InvalidBool,
    #[error("invalid {0}: {1}")]
    Invalid(&'static str, &'static str),
}
