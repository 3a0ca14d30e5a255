//! Error types for mxf-metadata.

use mxf_core::Uuid;
use thiserror::Error;

#[derive(Debug, Error)]
#[must_use]
pub enum Error {
    #[error(transparent)]
    Core(#[from] mxf_core::Error),

    /// A primer-local tag has no entry in the primer (spec §7 `UnknownTag`).
    #[error("unknown primer tag {0:#06x}")]
    UnknownTag(u16),

    /// A strong reference's target was never registered (spec §7
    /// `DanglingStrongRef`); the partition load is structurally invalid.
    #[error("dangling strong reference to {0}")]
    DanglingStrongRef(Uuid),

    /// Primer serialisation was asked to encode more tags than a 2-byte
    /// local tag space can hold.
    #[error("primer tag space exhausted")]
    PrimerTagSpaceExhausted,

    /// A primer set's value did not decode as a well-formed (tag, UL)
    /// sequence.
    #[error("malformed primer set: {0}")]
    MalformedPrimer(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
