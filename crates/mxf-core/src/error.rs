//! Error types for mxf-core.

use thiserror::Error;

/// Byte-codec and identity-type errors.
#[derive(Debug, Error)]
#[must_use]
pub enum Error {
    #[error("unexpected end of data: need {need} bytes, have {have}")]
    UnexpectedEof { need: usize, have: usize },

    #[error("malformed BER length: {0}")]
    MalformedLength(&'static str),

    #[error("length {value} overflows a {width}-byte field")]
    LengthOverflow { value: u64, width: u8 },

    #[error("value too large to materialise on this platform: {0} bytes")]
    ChunkTooLarge(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for mxf-core operations.
pub type Result<T> = std::result::Result<T, Error>;
