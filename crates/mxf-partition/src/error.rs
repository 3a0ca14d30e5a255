//! Error types for mxf-partition.

use thiserror::Error;

#[derive(Debug, Error)]
#[must_use]
pub enum Error {
    #[error(transparent)]
    Io(#[from] mxf_io::Error),

    #[error(transparent)]
    Core(#[from] mxf_core::Error),

    #[error(transparent)]
    Metadata(#[from] mxf_metadata::Error),

    /// The bytes at the current position are not a partition pack (spec
    /// §4.7 family check).
    #[error("not a partition pack at offset {offset}")]
    NotAPartitionPack { offset: i64 },

    /// `ReadMetadata` found a non-primer set before the primer, or a
    /// second primer (spec §4.7 "the primer ... must be the first KLV
    /// read").
    #[error("primer out of order in header metadata")]
    PrimerOutOfOrder,

    /// An index table segment's stream-offsets were not non-decreasing,
    /// or segments overlapped/gapped across the timeline (spec §4.8).
    #[error("index table invariant violated: {0}")]
    MalformedIndexTable(&'static str),

    /// A local-set property encoded to more than 65535 bytes, which the
    /// 2-byte local-set length field cannot frame (spec §4.6).
    #[error("encoded property value ({len} bytes) exceeds the local-set length field")]
    PropertyTooLarge { len: usize },

    /// A KAG padding gap could not be expressed as a single Fill item
    /// (spec §6): the gap was non-zero but smaller than the minimum
    /// possible Fill KLV (16-byte key + 1-byte length).
    #[error("KAG padding of {0} bytes is smaller than the minimum Fill item")]
    PaddingTooSmall(u64),

    /// A property's stored value does not match the kind its type
    /// descriptor declares — serialisation has no encoding for the pair.
    #[error("property value does not match its descriptor's kind: {0}")]
    MismatchedPropertyKind(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
