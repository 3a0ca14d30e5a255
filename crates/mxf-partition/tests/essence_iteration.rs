//! Sequential essence iteration across a KLV-Fill gap (concrete scenario:
//! `[item_A, fill, item_B]` yields exactly two elements).

use std::io::Cursor;

use mxf_core::{length, KagSize, Ul};
use mxf_io::FileCursor;
use mxf_metadata::registry;
use mxf_partition::{Partition, PartitionKind, PartitionPack, PartitionStatus};

const ESSENCE_UL: Ul = Ul::new([0x06, 0x0E, 0x2B, 0x34, 0x01, 0x02, 0x01, 0x01, 0x0D, 0x01, 0x03, 0x01, 0x01, 0x10, 0x01, 0x00]);

fn klv(ul: Ul, value: &[u8]) -> Vec<u8> {
    let mut out = ul.as_bytes().to_vec();
    out.extend(length::encode_ber_min(value.len() as u64));
    out.extend_from_slice(value);
    out
}

fn sample_pack() -> PartitionPack {
    PartitionPack {
        kind: PartitionKind::Body,
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
        operational_pattern: Ul::new([0u8; 16]),
        essence_containers: Vec::new(),
    }
}

#[test]
fn fill_between_essence_items_is_skipped() {
    let item_a = klv(ESSENCE_UL, b"frame-a-bytes");
    let fill = klv(registry::FILL_ITEM_UL, &[0u8; 17]);
    let item_b = klv(ESSENCE_UL, b"frame-b-bytes");
    let next_partition = klv(sample_pack().key_ul(), &sample_pack().encode());

    let mut bytes = Vec::new();
    bytes.extend(item_a);
    bytes.extend(fill);
    bytes.extend(item_b);
    bytes.extend(next_partition);

    let mut file = FileCursor::new(Cursor::new(bytes));
    let mut partition = Partition::new(sample_pack());

    partition.start_elements(&mut file).unwrap();

    let first = partition.next_element(&mut file).unwrap();
    assert!(first.is_some());
    assert_eq!(first.unwrap().value_len(), b"frame-a-bytes".len() as u64);

    let second = partition.next_element(&mut file).unwrap();
    assert!(second.is_some());
    assert_eq!(second.unwrap().value_len(), b"frame-b-bytes".len() as u64);

    let third = partition.next_element(&mut file).unwrap();
    assert!(third.is_none());
}
