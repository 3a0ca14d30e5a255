//! The metadata object graph (spec §3).
//!
//! Grounded on `exiftool-core/src/value.rs::RawValue` (a tagged-union
//! value type with `as_*` accessors) generalised from "parsed EXIF
//! format" to "parsed MXF property", plus the strong/weak reference
//! variants the EXIF side has no counterpart for.

use mxf_core::{Timestamp, Ul, Uuid};

/// One child property of a [`MetadataObject`] (spec §3/§4.6).
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    String(String),
    Timestamp(Timestamp),
    Ul(Ul),
    Uuid(Uuid),
    /// Array of scalar values (spec §3 "an array of scalars").
    Array(Vec<PropertyValue>),
    /// A child object embedded inline rather than referenced (a "nested
    /// local set", spec §4.6).
    Nested(Box<MetadataObject>),
    /// An owned child living in the same partition, by InstanceUID.
    StrongRef(Uuid),
    /// An unowned peer, by InstanceUID.
    WeakRef(Uuid),
    /// Bytes kept opaque because no property descriptor matched (spec §7
    /// `UnknownUL`/`UnknownTag`).
    Raw(Vec<u8>),
}

impl PropertyValue {
    pub fn as_strong_ref(&self) -> Option<Uuid> {
        match self {
            PropertyValue::StrongRef(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_weak_ref(&self) -> Option<Uuid> {
        match self {
            PropertyValue::WeakRef(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            PropertyValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }
}

/// A single named property slot on a [`MetadataObject`]: the UL that
/// identifies it plus its decoded (or unresolved) value.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub ul: Ul,
    pub value: PropertyValue,
}

/// A node in the metadata graph (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataObject {
    pub type_ul: Ul,
    pub instance_uid: Option<Uuid>,
    pub properties: Vec<Property>,
}

impl MetadataObject {
    pub fn new(type_ul: Ul) -> Self {
        Self { type_ul, instance_uid: None, properties: Vec::new() }
    }

    pub fn property(&self, ul: &Ul) -> Option<&PropertyValue> {
        self.properties.iter().find(|p| p.ul.equals_exact(ul)).map(|p| &p.value)
    }

    pub fn set_property(&mut self, ul: Ul, value: PropertyValue) {
        if let Some(existing) = self.properties.iter_mut().find(|p| p.ul.equals_exact(&ul)) {
            existing.value = value;
        } else {
            self.properties.push(Property { ul, value });
        }
    }

    /// UUIDs of every strong-referenced child this object owns.
    pub fn strong_ref_targets(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.properties.iter().filter_map(|p| p.value.as_strong_ref())
    }

    /// UUIDs of every weak-referenced peer this object points at.
    pub fn weak_ref_targets(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.properties.iter().filter_map(|p| p.value.as_weak_ref())
    }
}
