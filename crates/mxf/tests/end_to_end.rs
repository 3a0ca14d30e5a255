//! A full header partition (pack + primer + one metadata set) followed by
//! an essence region, read back through the facade end to end.

use std::io::Cursor;

use mxf::{
    length, open_partition_pack, registry, FileCursor, KagSize, Partition, PartitionKind, PartitionPack,
    PartitionStatus, PositionedFile, Primer, StaticRegistry, Ul, Uuid,
};

fn klv(ul: Ul, value: &[u8]) -> Vec<u8> {
    let mut out = ul.as_bytes().to_vec();
    out.extend(length::encode_ber_min(value.len() as u64));
    out.extend_from_slice(value);
    out
}

fn local_item(tag: u16, value: &[u8]) -> Vec<u8> {
    let mut out = tag.to_be_bytes().to_vec();
    out.extend_from_slice(&(value.len() as u16).to_be_bytes());
    out.extend_from_slice(value);
    out
}

#[test]
fn header_partition_then_essence_round_trips_through_the_facade() {
    let instance_uid = Uuid::from_bytes([0x11; 16]);

    let pack = PartitionPack {
        kind: PartitionKind::Header,
        status: PartitionStatus::ClosedComplete,
        kag_size: KagSize::new(1).unwrap(),
        this_partition: 0,
        previous_partition: 0,
        footer_partition: 0,
        header_byte_count: 0,
        index_byte_count: 0,
        index_sid: 0,
        body_offset: 0,
        body_sid: 1,
        operational_pattern: Ul::new([0x06, 0x0E, 0x2B, 0x34, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]),
        essence_containers: Vec::new(),
    };

    let primer = Primer::with_seed([(1u16, registry::INSTANCE_UID_UL)]);
    let preface_value = local_item(1, instance_uid.as_bytes());

    let mut bytes = Vec::new();
    bytes.extend(klv(pack.key_ul(), &pack.encode()));
    bytes.extend(klv(registry::PRIMER_PACK_UL, &primer.serialize()));
    bytes.extend(klv(registry::PREFACE_UL, &preface_value));
    bytes.extend(klv(registry::FILL_ITEM_UL, &[0u8; 8]));
    let essence_ul = Ul::new([0x06, 0x0E, 0x2B, 0x34, 0x01, 0x02, 0x01, 0x01, 0x0D, 0x01, 0x03, 0x01, 0x01, 0x10, 0x01, 0x00]);
    bytes.extend(klv(essence_ul, b"one-frame-of-essence"));

    let mut file = FileCursor::new(Cursor::new(bytes));

    let decoded_pack = open_partition_pack(&mut file).unwrap();
    assert_eq!(decoded_pack.kind, PartitionKind::Header);

    let mut partition = Partition::new(decoded_pack);
    let registry = StaticRegistry;
    partition.read_metadata(&mut file, &registry, None).unwrap();

    assert_eq!(partition.all_metadata().len(), 1);
    assert_eq!(partition.all_metadata()[0].instance_uid, Some(instance_uid));

    partition.start_elements(&mut file).unwrap();
    let element = partition.next_element(&mut file).unwrap();
    assert!(element.is_some());
    assert_eq!(element.unwrap().value_len(), b"one-frame-of-essence".len() as u64);
    assert!(partition.next_element(&mut file).unwrap().is_none());
}
