//! KLV streaming and partition/metadata handling for the MXF (SMPTE
//! 377-family) professional video container format.
//!
//! This crate is a thin facade over four layers:
//!
//! - [`mxf_core`] — byte codecs, Universal Labels, instance UUIDs, and
//!   timestamps
//! - [`mxf_io`] — the positioned file cursor and the KLV object cursor
//! - [`mxf_metadata`] — the type registry, primer, metadata object graph,
//!   and reference resolver
//! - [`mxf_partition`] — partitions, index tables, and sequential essence
//!   access
//!
//! # Example
//!
//! ```no_run
//! use mxf::{open_partition_pack, FileCursor, PositionedFile};
//! use std::fs::File;
//!
//! let f = File::open("sample.mxf").unwrap();
//! let mut cursor = FileCursor::new(f);
//! cursor.seek_to(0).unwrap();
//! let pack = open_partition_pack(&mut cursor).unwrap();
//! println!("{:?} essence containers", pack.essence_containers.len());
//! ```

pub use mxf_core::{length, KagSize, KeyFormat, LenFormat, Timestamp, Ul, UlMask, Uuid};
pub use mxf_io::{CursorIdentity, FileCursor, FileSlot, KlvObject, PositionedFile, ReadHandler, SENTINEL_ALL, SENTINEL_POSITION};
pub use mxf_metadata::{
    registry, DanglingWeakRef, MetadataObject, ObjectId, Primer, Property, PropertyDescriptor, PropertyKind,
    PropertyValue, RefKind, ReferenceResolver, StaticRegistry, TypeDescriptor, TypeRegistry,
};
pub use mxf_partition::{
    check_timeline_partition, IndexEntry, IndexTableSegment, Partition, PartitionKind, PartitionPack, PartitionStatus,
};

/// Read and validate the partition pack at the file's current position,
/// leaving the cursor positioned at the first byte after it.
///
/// Grounded on the teacher's `IccParser::parse` entry point: a single
/// free function that performs one bounds-checked read and hands back a
/// typed result, rather than a builder or session object.
pub fn open_partition_pack(file: &mut dyn PositionedFile) -> mxf_partition::Result<PartitionPack> {
    let mut kl = KlvObject::new();
    kl.read_kl(file, KeyFormat::Ul, LenFormat::Ber)?;
    let ul = kl.ul().expect("KeyFormat::Ul always yields a UL");

    if !registry::in_family(&ul, &registry::PARTITION_PACK_UL, &registry::PARTITION_PACK_FAMILY_MASK) {
        let offset = kl.source().map(|s| s.key_offset).unwrap_or(0);
        return Err(mxf_partition::Error::NotAPartitionPack { offset });
    }

    kl.read_data(file, SENTINEL_ALL)?;
    PartitionPack::decode(&ul, kl.chunk())
}
