//! End-to-end parse -> serialise -> re-parse round trip (spec §4.6
//! "Serialisation", §8 "Partition round-trip").

use std::io::Cursor;

use mxf_core::{length, Ul, Uuid};
use mxf_io::FileCursor;
use mxf_metadata::{
    registry::{self, StaticPropertyDescriptor, StaticTypeDescriptor},
    Primer, PropertyKind, TypeDescriptor, TypeRegistry,
};
use mxf_partition::Partition;

const PARENT_UL: Ul = Ul::new([0x06, 0x0E, 0x2B, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0D, 0x01, 0x01, 0x01, 0x01, 0x01, 0xB0, 0x00]);
const CHILD_UL: Ul = Ul::new([0x06, 0x0E, 0x2B, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0D, 0x01, 0x01, 0x01, 0x01, 0x01, 0xB1, 0x00]);
const PEER_UL: Ul = Ul::new([0x06, 0x0E, 0x2B, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0D, 0x01, 0x01, 0x01, 0x01, 0x01, 0xB2, 0x00]);
const INSTANCE_UID_UL: Ul = registry::INSTANCE_UID_UL;
const CHILD_REF_UL: Ul = Ul::new([0x06, 0x0E, 0x2B, 0x34, 0x01, 0x01, 0x01, 0x02, 0x06, 0x01, 0x01, 0x04, 0x01, 0x00, 0x00, 0x00]);
const PEER_REF_UL: Ul = Ul::new([0x06, 0x0E, 0x2B, 0x34, 0x01, 0x01, 0x01, 0x02, 0x06, 0x01, 0x01, 0x04, 0x02, 0x00, 0x00, 0x00]);
const NAME_UL: Ul = Ul::new([0x06, 0x0E, 0x2B, 0x34, 0x01, 0x01, 0x01, 0x02, 0x06, 0x01, 0x01, 0x04, 0x03, 0x00, 0x00, 0x00]);

const INSTANCE_UID_PROPERTY: StaticPropertyDescriptor =
    StaticPropertyDescriptor { ul: INSTANCE_UID_UL.0, name: "InstanceUID", kind: PropertyKind::Uuid };
const CHILD_REF_PROPERTY: StaticPropertyDescriptor =
    StaticPropertyDescriptor { ul: CHILD_REF_UL.0, name: "Child", kind: PropertyKind::StrongRef };
const PEER_REF_PROPERTY: StaticPropertyDescriptor =
    StaticPropertyDescriptor { ul: PEER_REF_UL.0, name: "Peer", kind: PropertyKind::WeakRef };
const NAME_PROPERTY: StaticPropertyDescriptor =
    StaticPropertyDescriptor { ul: NAME_UL.0, name: "Name", kind: PropertyKind::FixedString(8) };

static PARENT_PROPERTIES: &[StaticPropertyDescriptor] =
    &[INSTANCE_UID_PROPERTY, CHILD_REF_PROPERTY, PEER_REF_PROPERTY, NAME_PROPERTY];
static CHILD_PROPERTIES: &[StaticPropertyDescriptor] = &[INSTANCE_UID_PROPERTY];
static PEER_PROPERTIES: &[StaticPropertyDescriptor] = &[INSTANCE_UID_PROPERTY];

static PARENT_TYPE: StaticTypeDescriptor = StaticTypeDescriptor {
    ul: PARENT_UL.0,
    name: "ParentSet",
    instance_uid_property: Some(INSTANCE_UID_UL.0),
    properties: PARENT_PROPERTIES,
};
static CHILD_TYPE: StaticTypeDescriptor = StaticTypeDescriptor {
    ul: CHILD_UL.0,
    name: "ChildSet",
    instance_uid_property: Some(INSTANCE_UID_UL.0),
    properties: CHILD_PROPERTIES,
};
static PEER_TYPE: StaticTypeDescriptor = StaticTypeDescriptor {
    ul: PEER_UL.0,
    name: "PeerSet",
    instance_uid_property: Some(INSTANCE_UID_UL.0),
    properties: PEER_PROPERTIES,
};

struct TestRegistry;

impl TypeRegistry for TestRegistry {
    fn lookup(&self, ul: &Ul) -> Option<&dyn TypeDescriptor> {
        if ul.equals_exact(&PARENT_UL) {
            Some(&PARENT_TYPE)
        } else if ul.equals_exact(&CHILD_UL) {
            Some(&CHILD_TYPE)
        } else if ul.equals_exact(&PEER_UL) {
            Some(&PEER_TYPE)
        } else {
            None
        }
    }
}

fn local_item(tag: u16, value: &[u8]) -> Vec<u8> {
    let mut out = tag.to_be_bytes().to_vec();
    out.extend_from_slice(&(value.len() as u16).to_be_bytes());
    out.extend_from_slice(value);
    out
}

fn klv(ul: Ul, value: &[u8]) -> Vec<u8> {
    let mut out = ul.as_bytes().to_vec();
    out.extend(length::encode_ber_min(value.len() as u64));
    out.extend_from_slice(value);
    out
}

fn sample_pack(kag: u32) -> mxf_partition::PartitionPack {
    mxf_partition::PartitionPack {
        kind: mxf_partition::PartitionKind::Header,
        status: mxf_partition::PartitionStatus::ClosedComplete,
        kag_size: mxf_core::KagSize::new(kag).unwrap(),
        this_partition: 0,
        previous_partition: 0,
        footer_partition: 0,
        header_byte_count: 0,
        index_byte_count: 0,
        index_sid: 0,
        body_offset: 0,
        body_sid: 0,
        operational_pattern: Ul::new([0u8; 16]),
        essence_containers: Vec::new(),
    }
}

/// Build a parent (strong ref to a child, weak ref to a peer, plus a
/// fixed-string name) + child + peer partition, parse it, serialise it
/// back out, then parse the serialised bytes again and check the graph
/// survived the round trip intact.
#[test]
fn parse_serialise_reparse_preserves_graph() {
    let parent_uuid = Uuid::from_bytes([1u8; 16]);
    let child_uuid = Uuid::from_bytes([2u8; 16]);
    let peer_uuid = Uuid::from_bytes([3u8; 16]);

    let primer = Primer::with_seed([
        (1u16, INSTANCE_UID_UL),
        (2u16, CHILD_REF_UL),
        (3u16, PEER_REF_UL),
        (4u16, NAME_UL),
    ]);
    let primer_klv = klv(registry::PRIMER_PACK_UL, &primer.serialize());

    let parent_value = [
        local_item(1, parent_uuid.as_bytes()),
        local_item(2, child_uuid.as_bytes()),
        local_item(3, peer_uuid.as_bytes()),
        local_item(4, b"reel-1\0\0"),
    ]
    .concat();
    let parent_klv = klv(PARENT_UL, &parent_value);
    let child_klv = klv(CHILD_UL, &local_item(1, child_uuid.as_bytes()));
    let peer_klv = klv(PEER_UL, &local_item(1, peer_uuid.as_bytes()));

    let mut bytes = Vec::new();
    bytes.extend(primer_klv);
    bytes.extend(parent_klv);
    bytes.extend(child_klv);
    bytes.extend(peer_klv);

    let registry = TestRegistry;
    let mut source_file = FileCursor::new(Cursor::new(bytes));
    let mut source = Partition::new(sample_pack(1));
    source.read_metadata(&mut source_file, &registry, None).unwrap();
    let (dangling_weak, strong_result) = source.finalize_references();
    assert!(dangling_weak.is_empty());
    assert!(strong_result.is_ok());
    assert_eq!(source.all_metadata().len(), 3);

    let mut out_file = FileCursor::new(Cursor::new(Vec::new()));
    let written = source.serialize_metadata(&mut out_file, &registry, 0).unwrap();
    assert!(written > 0);

    out_file.get_mut().set_position(0);
    let mut reparsed = Partition::new(sample_pack(1));
    let consumed = reparsed.read_metadata(&mut out_file, &registry, None).unwrap();
    assert_eq!(consumed, written);
    assert_eq!(reparsed.all_metadata().len(), 3);

    let (dangling_weak, strong_result) = reparsed.finalize_references();
    assert!(dangling_weak.is_empty());
    assert!(strong_result.is_ok());

    let top_level = reparsed.top_level_metadata();
    assert_eq!(top_level.len(), 1);
    let parent = top_level[0];
    assert_eq!(parent.instance_uid, Some(parent_uuid));
    let strong: Vec<_> = parent.strong_ref_targets().collect();
    let weak: Vec<_> = parent.weak_ref_targets().collect();
    assert_eq!(strong, vec![child_uuid]);
    assert_eq!(weak, vec![peer_uuid]);

    let name = parent.property(&NAME_UL).unwrap();
    match name {
        mxf_metadata::PropertyValue::String(s) => assert_eq!(s, "reel-1"),
        other => panic!("expected a string property, got {other:?}"),
    }
}

/// A non-trivial KAG forces Fill items between every metadata set; the
/// round trip must still hold bit-for-bit on the decoded graph.
#[test]
fn parse_serialise_reparse_with_kag_alignment() {
    let parent_uuid = Uuid::from_bytes([9u8; 16]);
    let child_uuid = Uuid::from_bytes([10u8; 16]);

    let primer = Primer::with_seed([(1u16, INSTANCE_UID_UL), (2u16, CHILD_REF_UL)]);
    let primer_klv = klv(registry::PRIMER_PACK_UL, &primer.serialize());
    let parent_value = [local_item(1, parent_uuid.as_bytes()), local_item(2, child_uuid.as_bytes())].concat();
    let parent_klv = klv(PARENT_UL, &parent_value);
    let child_klv = klv(CHILD_UL, &local_item(1, child_uuid.as_bytes()));

    let mut bytes = Vec::new();
    bytes.extend(primer_klv);
    bytes.extend(parent_klv);
    bytes.extend(child_klv);

    let registry = TestRegistry;
    let mut source_file = FileCursor::new(Cursor::new(bytes));
    let mut source = Partition::new(sample_pack(512));
    source.read_metadata(&mut source_file, &registry, None).unwrap();
    source.finalize_references();

    let mut out_file = FileCursor::new(Cursor::new(Vec::new()));
    source.serialize_metadata(&mut out_file, &registry, 0).unwrap();

    out_file.get_mut().set_position(0);
    let mut reparsed = Partition::new(sample_pack(512));
    reparsed.read_metadata(&mut out_file, &registry, None).unwrap();
    assert_eq!(reparsed.all_metadata().len(), 2);

    let top_level = reparsed.top_level_metadata();
    assert_eq!(top_level.len(), 1);
    assert_eq!(top_level[0].instance_uid, Some(parent_uuid));
}
