//! Type registry: UL-keyed lookup of type and property descriptors (spec
//! §1/§4.6). The registry is an external collaborator by design — callers
//! may supply their own (e.g. loaded from a vendor dictionary); this module
//! only supplies [`StaticRegistry`], a built-in table of the structural ULs
//! every MXF file needs regardless of vendor.
//!
//! Grounded on the generated `phf::Map<u16, TagDef>` tables the teacher
//! ships per vendor, generalised here to a `u128` key (the UL's 16 bytes,
//! big-endian) since a UL is wider than any integer the teacher's tables
//! key on.

use mxf_core::{Ul, UlMask};

/// How a property's value is framed inside its inner KLV item (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    /// Fixed-width ASCII, padded/truncated to the given byte length.
    FixedString(u16),
    Utf16String,
    Timestamp,
    Ul,
    Uuid,
    /// Batch: 4-byte count, 4-byte element size, then elements.
    Batch,
    /// Array: same framing as batch but semantically an ordered list.
    Array,
    StrongRef,
    WeakRef,
    /// A child local set parsed recursively rather than decoded as a
    /// scalar.
    NestedSet,
    /// No descriptor matched; value is kept as opaque bytes (spec §7
    /// `UnknownUL`/`UnknownTag`).
    Raw,
}

/// A single property of a metadata type (spec §4.6).
pub trait PropertyDescriptor: Send + Sync {
    fn ul(&self) -> Ul;
    fn name(&self) -> &'static str;
    fn kind(&self) -> PropertyKind;
}

/// A metadata set's type (spec §3 "type descriptor").
pub trait TypeDescriptor: Send + Sync {
    fn ul(&self) -> Ul;
    fn name(&self) -> &'static str;

    /// Look up one of this type's properties by UL.
    fn property(&self, ul: &Ul) -> Option<&dyn PropertyDescriptor>;

    /// This type's properties in declared order — the order serialisation
    /// emits them in (spec §4.6 "Serialisation").
    fn properties(&self) -> Vec<&dyn PropertyDescriptor>;

    /// Whether `ul` is this type's InstanceUID property (spec §4.6).
    fn is_instance_uid_property(&self, ul: &Ul) -> bool;
}

/// Read-only lookup of type descriptors by UL (spec §1: external
/// collaborator; §4.6: "the set UL selects a type descriptor from the
/// registry").
pub trait TypeRegistry: Send + Sync {
    fn lookup(&self, ul: &Ul) -> Option<&dyn TypeDescriptor>;
}

/// Membership test for a UL family using the family's registered mask
/// (spec §9 "single canonical `ul_equal`"). Every family-membership check
/// in this workspace routes through this function rather than comparing
/// bytes ad hoc.
pub fn in_family(candidate: &Ul, family_representative: &Ul, mask: &UlMask) -> bool {
    candidate.equals_with_mask(family_representative, mask)
}

/// Ignores bytes 13 and 14 (partition kind — Header/Body/Footer — and
/// open/closed+complete status), which vary across partition pack
/// variants.
pub const PARTITION_PACK_FAMILY_MASK: UlMask = {
    let mut m = [true; 16];
    m[13] = false;
    m[14] = false;
    UlMask(m)
};

/// Ignores byte 13, which selects the segment's sub-variant.
pub const INDEX_TABLE_SEGMENT_FAMILY_MASK: UlMask = {
    let mut m = [true; 16];
    m[13] = false;
    UlMask(m)
};

/// Ignores the last 3 bytes, which select the specific structural
/// metadata type (Preface, Identification, ...). Used by
/// `ReadMetadata`'s "is the next KLV still a header metadata set" check
/// (spec §4.7).
pub const STRUCTURAL_SET_FAMILY_MASK: UlMask = {
    let mut m = [true; 16];
    m[13] = false;
    m[14] = false;
    m[15] = false;
    UlMask(m)
};

/// Representative structural-metadata-set UL; compare candidates with
/// [`STRUCTURAL_SET_FAMILY_MASK`].
pub const STRUCTURAL_SET_UL: Ul = PREFACE_UL;

/// A representative Partition Pack UL (Header, Open, Incomplete). Byte 13
/// is the partition kind (`0x02` Header, `0x03` Body, `0x04` Footer) and
/// byte 14 is the open/closed+complete status; compare candidates with
/// [`PARTITION_PACK_FAMILY_MASK`], never exactly.
pub const PARTITION_PACK_UL: Ul = Ul::new([
    0x06, 0x0E, 0x2B, 0x34, 0x02, 0x05, 0x01, 0x01, 0x0D, 0x01, 0x02, 0x01, 0x01, 0x02, 0x01, 0x00,
]);

/// The Primer Pack UL (exact match; there is only one variant).
pub const PRIMER_PACK_UL: Ul = Ul::new([
    0x06, 0x0E, 0x2B, 0x34, 0x02, 0x05, 0x01, 0x01, 0x0D, 0x01, 0x02, 0x01, 0x01, 0x05, 0x01, 0x00,
]);

/// The KLV-Fill item UL (exact match).
pub const FILL_ITEM_UL: Ul = Ul::new([
    0x06, 0x0E, 0x2B, 0x34, 0x01, 0x01, 0x01, 0x01, 0x03, 0x01, 0x02, 0x10, 0x01, 0x00, 0x00, 0x00,
]);

/// A representative Index Table Segment UL. Compare candidates with
/// [`INDEX_TABLE_SEGMENT_FAMILY_MASK`].
pub const INDEX_TABLE_SEGMENT_UL: Ul = Ul::new([
    0x06, 0x0E, 0x2B, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0D, 0x01, 0x02, 0x01, 0x01, 0x10, 0x01, 0x00,
]);

/// Preface Set key (spec §3; same constant the teacher already carries
/// in `exiftool-formats/src/mxf.rs`).
pub const PREFACE_UL: Ul = Ul::new([
    0x06, 0x0E, 0x2B, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0D, 0x01, 0x01, 0x01, 0x01, 0x01, 0x2F, 0x00,
]);

/// Identification Set key (ditto).
pub const IDENTIFICATION_UL: Ul = Ul::new([
    0x06, 0x0E, 0x2B, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0D, 0x01, 0x01, 0x01, 0x01, 0x01, 0x30, 0x00,
]);

/// The `InstanceUID` property UL, shared by every structural metadata
/// set.
pub const INSTANCE_UID_UL: Ul = Ul::new([
    0x06, 0x0E, 0x2B, 0x34, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x15, 0x02, 0x00, 0x00, 0x00, 0x00,
]);

#[derive(Debug, Clone, Copy)]
pub struct StaticPropertyDescriptor {
    pub ul: [u8; 16],
    pub name: &'static str,
    pub kind: PropertyKind,
}

impl PropertyDescriptor for StaticPropertyDescriptor {
    fn ul(&self) -> Ul {
        Ul::new(self.ul)
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> PropertyKind {
        self.kind
    }
}

pub struct StaticTypeDescriptor {
    pub ul: [u8; 16],
    pub name: &'static str,
    pub instance_uid_property: Option<[u8; 16]>,
    pub properties: &'static [StaticPropertyDescriptor],
}

impl TypeDescriptor for StaticTypeDescriptor {
    fn ul(&self) -> Ul {
        Ul::new(self.ul)
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn property(&self, ul: &Ul) -> Option<&dyn PropertyDescriptor> {
        self.properties
            .iter()
            .find(|p| p.ul().equals_exact(ul))
            .map(|p| p as &dyn PropertyDescriptor)
    }

    fn properties(&self) -> Vec<&dyn PropertyDescriptor> {
        self.properties.iter().map(|p| p as &dyn PropertyDescriptor).collect()
    }

    fn is_instance_uid_property(&self, ul: &Ul) -> bool {
        self.instance_uid_property.map(|iu| Ul::new(iu).equals_exact(ul)).unwrap_or(false)
    }
}

const INSTANCE_UID_PROPERTY: StaticPropertyDescriptor =
    StaticPropertyDescriptor { ul: INSTANCE_UID_UL.0, name: "InstanceUID", kind: PropertyKind::Uuid };

static PREFACE_PROPERTIES: &[StaticPropertyDescriptor] = &[INSTANCE_UID_PROPERTY];
static IDENTIFICATION_PROPERTIES: &[StaticPropertyDescriptor] = &[INSTANCE_UID_PROPERTY];

static PREFACE_TYPE: StaticTypeDescriptor = StaticTypeDescriptor {
    ul: PREFACE_UL.0,
    name: "Preface",
    instance_uid_property: Some(INSTANCE_UID_UL.0),
    properties: PREFACE_PROPERTIES,
};

static IDENTIFICATION_TYPE: StaticTypeDescriptor = StaticTypeDescriptor {
    ul: IDENTIFICATION_UL.0,
    name: "Identification",
    instance_uid_property: Some(INSTANCE_UID_UL.0),
    properties: IDENTIFICATION_PROPERTIES,
};

fn ul_key(ul: &Ul) -> u128 {
    u128::from_be_bytes(*ul.as_bytes())
}

// Key is `u128::from_be_bytes(PREFACE_UL.0)`; phf needs a literal so it
// can build its hash table at compile time.
static BUILTIN_TYPES: phf::Map<u128, &'static StaticTypeDescriptor> = phf::phf_map! {
    8048936394925706192217016509980028672u128 => &PREFACE_TYPE,
};

/// Built-in registry covering the handful of structural types every MXF
/// file session needs (Preface, Identification) regardless of vendor.
/// Callers with a richer type dictionary implement [`TypeRegistry`]
/// themselves and typically fall back to this one for unknown ULs.
pub struct StaticRegistry;

impl TypeRegistry for StaticRegistry {
    fn lookup(&self, ul: &Ul) -> Option<&dyn TypeDescriptor> {
        if ul.equals_exact(&IDENTIFICATION_UL) {
            return Some(&IDENTIFICATION_TYPE);
        }
        BUILTIN_TYPES.get(&ul_key(ul)).map(|d| *d as &dyn TypeDescriptor)
    }
}
