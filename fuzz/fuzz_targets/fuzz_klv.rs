#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use mxf_core::{KeyFormat, LenFormat};
use mxf_io::{FileCursor, KlvObject, SENTINEL_ALL};

fuzz_target!(|data: &[u8]| {
    // Fuzz KL header parsing and chunked value reads with arbitrary bytes.
    let mut file = FileCursor::new(Cursor::new(data.to_vec()));
    let mut kl = KlvObject::new();
    if kl.read_kl(&mut file, KeyFormat::Ul, LenFormat::Ber).is_ok() {
        let _ = kl.read_data(&mut file, SENTINEL_ALL);
    }
});
