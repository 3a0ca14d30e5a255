//! The KLV cursor (spec §4.3-§4.4, §9 "deep virtual hierarchy -> capability
//! trait").
//!
//! `KlvObject` is a concrete struct, not a class hierarchy: the one place
//! the source used virtual dispatch with `Base_*` re-entry guards is value
//! materialisation, which we model as a single [`ReadHandler`] capability
//! invoked from one concrete method (`read_data_from`) — there is no
//! subclass to re-enter.

use mxf_core::{length, Ul};
use std::sync::Arc;

use crate::{Error, PositionedFile, Result};

/// "To the end of the value" sentinel for `read_data`/`read_data_from`
/// (spec §4.3).
pub const SENTINEL_ALL: u64 = u64::MAX;

/// Where a cursor's key/length/value currently lives in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSlot {
    /// Absolute byte offset of the first key byte.
    pub key_offset: i64,
    /// Bytes consumed by key + length (KL size).
    pub kl_size: u32,
}

impl FileSlot {
    pub fn value_start(&self) -> i64 {
        self.key_offset + self.kl_size as i64
    }
}

/// Read-only identity a [`ReadHandler`] is allowed to consult (spec §4.4:
/// "it may consult only cursor's immutable identity ... never its chunk").
#[derive(Debug, Clone, Copy)]
pub struct CursorIdentity {
    pub ul: Option<Ul>,
    pub value_len: u64,
    pub source: Option<FileSlot>,
}

/// A collaborator that fulfils ranged reads of a KLV value on a cursor's
/// behalf (spec §4.4). Invoked only during materialisation, never during
/// KL parsing.
pub trait ReadHandler: Send + Sync {
    /// Must replace `buffer` wholly (no append semantics) and may return
    /// fewer bytes than `size` at end-of-source.
    fn read_data(&self, buffer: &mut Vec<u8>, identity: &CursorIdentity, start: u64, size: u64) -> Result<u64>;
}

/// A single KLV triple's cursor state (spec §3 "KLV object").
pub struct KlvObject {
    ul: Option<Ul>,
    value_len: u64,
    source: Option<FileSlot>,
    dest: Option<FileSlot>,
    chunk: Vec<u8>,
    data_base: u64,
    read_handler: Option<Arc<dyn ReadHandler>>,
    label: Option<String>,
}

impl Default for KlvObject {
    fn default() -> Self {
        Self::new()
    }
}

impl KlvObject {
    pub fn new() -> Self {
        Self {
            ul: None,
            value_len: 0,
            source: None,
            dest: None,
            chunk: Vec::new(),
            data_base: 0,
            read_handler: None,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn set_read_handler(&mut self, handler: Arc<dyn ReadHandler>) {
        self.read_handler = Some(handler);
    }

    pub fn set_source(&mut self, slot: FileSlot) {
        self.source = Some(slot);
    }

    pub fn set_destination(&mut self, slot: FileSlot) {
        self.dest = Some(slot);
    }

    pub fn ul(&self) -> Option<Ul> {
        self.ul
    }

    pub fn value_len(&self) -> u64 {
        self.value_len
    }

    pub fn chunk(&self) -> &[u8] {
        &self.chunk
    }

    pub fn data_base(&self) -> u64 {
        self.data_base
    }

    pub fn source(&self) -> Option<FileSlot> {
        self.source
    }

    /// Destination info, falling back to source when no destination has
    /// been explicitly set (spec §4.3: "common in-place rewrite pattern").
    pub fn effective_destination(&self) -> Option<FileSlot> {
        self.dest.or(self.source)
    }

    fn identity(&self) -> CursorIdentity {
        CursorIdentity { ul: self.ul, value_len: self.value_len, source: self.source }
    }

    fn invariants_hold(&self) -> bool {
        self.data_base.saturating_add(self.chunk.len() as u64) <= self.value_len
    }

    /// Decode the key and length at the file's current position,
    /// populate this cursor's identity, and leave the file positioned at
    /// the first value byte. Returns the KL size.
    ///
    /// This never calls back into any other `KlvObject` method — there
    /// is no subclass to protect against re-entering (spec §4.3).
    pub fn read_kl(
        &mut self,
        file: &mut dyn PositionedFile,
        key_format: mxf_core::KeyFormat,
        len_format: mxf_core::LenFormat,
    ) -> Result<u32> {
        use mxf_core::{KeyFormat, LenFormat};

        let key_offset = file.tell()?;

        let key_width = match key_format {
            KeyFormat::None => 0,
            KeyFormat::OneByte => 1,
            KeyFormat::TwoByte => 2,
            KeyFormat::FourByte => 4,
            KeyFormat::Ul | KeyFormat::Auto => 16,
        };

        let key_bytes = if key_width > 0 {
            read_exact_checked(file, key_width, key_offset)?
        } else {
            Vec::new()
        };

        let ul = if key_width == 16 {
            Some(Ul::from_slice(&key_bytes).map_err(|_| Error::TruncatedKl { offset: key_offset })?)
        } else {
            None
        };

        let (value_len, len_consumed) = match len_format {
            LenFormat::None => (0u64, 0usize),
            LenFormat::OneByte => {
                let b = read_exact_checked(file, 1, key_offset)?;
                (b[0] as u64, 1)
            }
            LenFormat::TwoByte => {
                let b = read_exact_checked(file, 2, key_offset)?;
                (length::decode_fixed(&b, 2)?, 2)
            }
            LenFormat::FourByte => {
                let b = read_exact_checked(file, 4, key_offset)?;
                (length::decode_fixed(&b, 4)?, 4)
            }
            LenFormat::Ber => {
                let first = read_exact_checked(file, 1, key_offset)?;
                if first[0] < 0x80 {
                    (first[0] as u64, 1)
                } else {
                    let n = (first[0] & 0x7F) as usize;
                    if n == 0 || n > 8 {
                        return Err(Error::TruncatedKl { offset: key_offset });
                    }
                    let rest = read_exact_checked(file, n, key_offset)?;
                    let mut all = first;
                    all.extend_from_slice(&rest);
                    let (v, _) = length::decode_ber(&all).map_err(|_| Error::TruncatedKl { offset: key_offset })?;
                    (v, 1 + n)
                }
            }
        };

        let kl_size = (key_width + len_consumed) as u32;

        self.ul = ul;
        self.value_len = value_len;
        self.source = Some(FileSlot { key_offset, kl_size });
        self.chunk.clear();
        self.data_base = 0;

        tracing::debug!(
            label = self.label.as_deref().unwrap_or(""),
            offset = key_offset,
            kl_size,
            value_len,
            "read_kl"
        );

        Ok(kl_size)
    }

    /// Materialise up to `size` bytes starting at the beginning of the
    /// value. Equivalent to `read_data_from(file, 0, size)`.
    pub fn read_data(&mut self, file: &mut dyn PositionedFile, size: u64) -> Result<u64> {
        self.read_data_from(file, 0, size)
    }

    /// Load `bytes` as this cursor's value directly, as though freshly
    /// materialised, so a caller building a value rather than reading one
    /// can still hand it to `write_data_from_to` (spec §4.3's write-side
    /// counterpart to `read_data`).
    pub fn set_value(&mut self, bytes: Vec<u8>) {
        self.value_len = bytes.len() as u64;
        self.chunk = bytes;
        self.data_base = 0;
    }

    /// Materialise up to `size` bytes starting at `offset` within the
    /// value field, replacing the chunk wholly (spec §4.3).
    pub fn read_data_from(&mut self, file: &mut dyn PositionedFile, offset: u64, size: u64) -> Result<u64> {
        let remaining = self.value_len.saturating_sub(offset);
        let want = if size == SENTINEL_ALL { remaining } else { size.min(remaining) };

        if want > usize::MAX as u64 {
            return Err(Error::ChunkTooLarge(want));
        }

        let mut buffer = Vec::new();
        let got = if let Some(handler) = self.read_handler.clone() {
            let identity = self.identity();
            handler.read_data(&mut buffer, &identity, offset, want)?
        } else {
            let slot = self.source.ok_or(Error::NoSource)?;
            file.seek_to(slot.value_start() + offset as i64)?;
            let want_usize = want as usize;
            let mut tmp = vec![0u8; want_usize];
            let mut filled = 0usize;
            while filled < want_usize {
                let n = file.read_some(&mut tmp[filled..])?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            tmp.truncate(filled);
            buffer = tmp;
            filled as u64
        };

        self.chunk = buffer;
        self.data_base = offset;
        debug_assert!(self.invariants_hold());

        Ok(got)
    }

    /// Emit `key_bytes` (16-byte UL or a primer-assigned local tag,
    /// already encoded by the caller) and a length field to the
    /// destination file, at the destination's key offset.
    ///
    /// `len_size` selects the length encoding: `1`/`2`/`4` for a
    /// fixed-width field, `0` for the minimum-width BER encoding.
    pub fn write_kl(
        &mut self,
        file: &mut dyn PositionedFile,
        key_bytes: &[u8],
        len_size: u8,
        override_length: Option<u64>,
    ) -> Result<u32> {
        let value_len = override_length.unwrap_or(self.value_len);
        let key_offset = self.effective_destination().map(|d| d.key_offset);
        let key_offset = match key_offset {
            Some(o) => {
                file.seek_to(o)?;
                o
            }
            None => file.tell()?,
        };

        file.write_all_at(key_bytes)?;

        let len_bytes = match len_size {
            1 | 2 | 4 => length::encode_fixed(value_len, len_size)?,
            0 => length::encode_ber_min(value_len),
            other => return Err(mxf_core::Error::LengthOverflow { value: value_len, width: other }.into()),
        };
        file.write_all_at(&len_bytes)?;

        let kl_size = (key_bytes.len() + len_bytes.len()) as u32;
        self.dest = Some(FileSlot { key_offset, kl_size });
        Ok(kl_size)
    }

    /// Write `chunk[chunk_start..chunk_start+size]` to the destination
    /// file at `destination_value_start + dst_offset`.
    pub fn write_data_from_to(
        &mut self,
        file: &mut dyn PositionedFile,
        dst_offset: u64,
        chunk_start: u64,
        size: u64,
    ) -> Result<()> {
        #[cfg(target_pointer_width = "32")]
        if size > u32::MAX as u64 {
            return Err(Error::ChunkTooLarge(size));
        }

        let start = chunk_start as usize;
        let end = start
            .checked_add(size as usize)
            .filter(|&e| e <= self.chunk.len())
            .ok_or(Error::TruncatedValue { need: chunk_start + size, have: self.chunk.len() as u64 })?;

        let dest = self.effective_destination().ok_or(Error::NoDestination)?;
        file.seek_to(dest.value_start() + dst_offset as i64)?;
        file.write_all_at(&self.chunk[start..end])?;
        Ok(())
    }
}

fn read_exact_checked(file: &mut dyn PositionedFile, n: usize, key_offset: i64) -> Result<Vec<u8>> {
    file.read_exact_n(n).map_err(|e| match e {
        Error::TruncatedValue { .. } => Error::TruncatedKl { offset: key_offset },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::FileCursor;
    use mxf_core::{KeyFormat, LenFormat};
    use std::io::Cursor;

    fn make_klv(ul: [u8; 16], value: &[u8]) -> Vec<u8> {
        let mut v = ul.to_vec();
        v.extend(length::encode_ber_min(value.len() as u64));
        v.extend_from_slice(value);
        v
    }

    #[test]
    fn read_kl_then_chunked_value_read() {
        let ul = [0x06, 0x0E, 0x2B, 0x34, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
        let value = vec![0xAAu8; 1 << 20];
        let bytes = make_klv(ul, &value);
        let mut file = FileCursor::new(Cursor::new(bytes));

        let mut klv = KlvObject::new();
        let kl_size = klv.read_kl(&mut file, KeyFormat::Ul, LenFormat::Ber).unwrap();
        assert_eq!(kl_size, 16 + 3);
        assert_eq!(klv.value_len(), value.len() as u64);

        let got = klv.read_data_from(&mut file, 0, 65536).unwrap();
        assert_eq!(got, 65536);
        assert_eq!(klv.data_base(), 0);
        assert_eq!(klv.chunk().len(), 65536);

        let got2 = klv.read_data_from(&mut file, 65536, 65536).unwrap();
        assert_eq!(got2, 65536);
        assert_eq!(klv.data_base(), 65536);
        assert_eq!(klv.chunk().len(), 65536);
        assert!(klv.chunk().iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn truncated_kl_on_eof() {
        let mut file = FileCursor::new(Cursor::new(vec![0x06, 0x0E]));
        let mut klv = KlvObject::new();
        let err = klv.read_kl(&mut file, KeyFormat::Ul, LenFormat::Ber).unwrap_err();
        assert!(matches!(err, Error::TruncatedKl { .. }));
    }

    #[test]
    fn read_data_all_sentinel_reads_to_end() {
        let ul = [1u8; 16];
        let value = vec![7u8; 100];
        let bytes = make_klv(ul, &value);
        let mut file = FileCursor::new(Cursor::new(bytes));
        let mut klv = KlvObject::new();
        klv.read_kl(&mut file, KeyFormat::Ul, LenFormat::Ber).unwrap();
        let got = klv.read_data(&mut file, SENTINEL_ALL).unwrap();
        assert_eq!(got, 100);
    }

    struct HalfHandler;
    impl ReadHandler for HalfHandler {
        fn read_data(&self, buffer: &mut Vec<u8>, identity: &CursorIdentity, start: u64, size: u64) -> Result<u64> {
            let remaining = identity.value_len.saturating_sub(start);
            let n = size.min(remaining).min(10);
            *buffer = vec![0x42u8; n as usize];
            Ok(n)
        }
    }

    #[test]
    fn read_handler_is_used_for_materialisation_and_replaces_chunk() {
        let ul = [1u8; 16];
        let value = vec![0u8; 50];
        let bytes = make_klv(ul, &value);
        let mut file = FileCursor::new(Cursor::new(bytes));
        let mut klv = KlvObject::new();
        klv.read_kl(&mut file, KeyFormat::Ul, LenFormat::Ber).unwrap();
        klv.set_read_handler(std::sync::Arc::new(HalfHandler));

        let got = klv.read_data(&mut file, 30).unwrap();
        assert_eq!(got, 10);
        assert_eq!(klv.chunk(), &[0x42u8; 10][..]);
    }

    #[test]
    fn write_kl_then_read_back() {
        let mut file = FileCursor::new(Cursor::new(vec![0u8; 64]));
        let mut klv = KlvObject::new();
        klv.set_destination(FileSlot { key_offset: 0, kl_size: 0 });
        let value = b"hello world".to_vec();
        let ul = [9u8; 16];
        klv.value_len = value.len() as u64;
        let kl_size = klv.write_kl(&mut file, &ul, 0, None).unwrap();
        klv.chunk = value.clone();
        klv.write_data_from_to(&mut file, 0, 0, value.len() as u64).unwrap();

        file.get_mut().set_position(0);
        let mut reread = KlvObject::new();
        let reread_kl_size = reread
            .read_kl(&mut file, KeyFormat::Ul, LenFormat::Ber)
            .unwrap();
        assert_eq!(reread_kl_size, kl_size);
        assert_eq!(reread.ul().unwrap().as_bytes(), &ul);
        reread.read_data(&mut file, SENTINEL_ALL).unwrap();
        assert_eq!(reread.chunk(), &value[..]);
    }
}
