//! Error types for mxf-io.

use thiserror::Error;

#[derive(Debug, Error)]
#[must_use]
pub enum Error {
    #[error(transparent)]
    Core(#[from] mxf_core::Error),

    #[error("truncated KLV key/length at offset {offset}")]
    TruncatedKl { offset: i64 },

    #[error("truncated value: need {need} bytes, have {have}")]
    TruncatedValue { need: u64, have: u64 },

    #[error("sentinel position (-1) passed to seek")]
    SentinelSeek,

    #[error("no source configured on this KLV cursor")]
    NoSource,

    #[error("no destination configured on this KLV cursor")]
    NoDestination,

    #[error("chunk too large to materialise on this platform: {0} bytes")]
    ChunkTooLarge(u64),

    #[error("I/O error at offset {offset:?}: {source}")]
    Io {
        offset: Option<i64>,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
