#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use mxf_core::{KagSize, Ul};
use mxf_io::FileCursor;
use mxf_metadata::StaticRegistry;
use mxf_partition::{Partition, PartitionKind, PartitionPack, PartitionStatus};

fn dummy_pack() -> PartitionPack {
    PartitionPack {
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
        operational_pattern: Ul::new([0u8; 16]),
        essence_containers: Vec::new(),
    }
}

fuzz_target!(|data: &[u8]| {
    // Fuzz header metadata decoding with arbitrary bytes standing in for
    // the primer and local-set region of a header partition.
    let mut file = FileCursor::new(Cursor::new(data.to_vec()));
    let mut partition = Partition::new(dummy_pack());
    let registry = StaticRegistry;
    if partition.read_metadata(&mut file, &registry, None).is_ok() {
        let _ = partition.finalize_references();
        let _ = partition.top_level_metadata();
    }
});
