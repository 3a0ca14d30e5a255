//! Positioned file cursor (spec §4.2).
//!
//! Generalises the teacher's `ReadSeek` blanket trait
//! (`exiftool-formats/src/traits.rs`, `dyn Read + Seek` over a single
//! object) to also cover positioned writes, since MXF cursors rewrite a
//! file in place. `SENTINEL_POSITION` is reserved and must never be
//! passed to `seek`.

use crate::{Error, Result};
use std::io::{Read, Seek, SeekFrom, Write};

/// Reserved "unknown/sentinel" position (spec §4.2).
pub const SENTINEL_POSITION: i64 = -1;

/// A positioned byte stream: tell/seek/read/write over a 64-bit signed
/// offset space. Short reads at EOF return the actual byte count rather
/// than erroring.
pub trait PositionedFile {
    fn tell(&mut self) -> Result<i64>;
    fn seek_to(&mut self, pos: i64) -> Result<()>;
    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize>;
    fn write_some(&mut self, buf: &[u8]) -> Result<usize>;

    /// Read exactly `n` bytes, looping over short reads; errors if EOF
    /// is hit before `n` bytes are available.
    fn read_exact_n(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            let got = self.read_some(&mut out[filled..])?;
            if got == 0 {
                return Err(Error::TruncatedValue { need: n as u64, have: filled as u64 });
            }
            filled += got;
        }
        Ok(out)
    }

    fn write_all_at(&mut self, buf: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.write_some(&buf[written..])?;
            if n == 0 {
                return Err(Error::Io {
                    offset: self.tell().ok(),
                    source: std::io::Error::new(std::io::ErrorKind::WriteZero, "write returned 0"),
                });
            }
            written += n;
        }
        Ok(())
    }
}

fn check_seek_target(pos: i64) -> Result<()> {
    if pos == SENTINEL_POSITION {
        return Err(Error::SentinelSeek);
    }
    Ok(())
}

/// Production implementation over `std::fs::File` (or any `Read + Write
/// + Seek`).
pub struct FileCursor<F> {
    inner: F,
}

impl<F: Read + Write + Seek> FileCursor<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> F {
        self.inner
    }

    pub fn get_mut(&mut self) -> &mut F {
        &mut self.inner
    }
}

impl<F: Read + Write + Seek> PositionedFile for FileCursor<F> {
    fn tell(&mut self) -> Result<i64> {
        let pos = self
            .inner
            .stream_position()
            .map_err(|source| Error::Io { offset: None, source })?;
        Ok(pos as i64)
    }

    fn seek_to(&mut self, pos: i64) -> Result<()> {
        check_seek_target(pos)?;
        self.inner
            .seek(SeekFrom::Start(pos as u64))
            .map_err(|source| Error::Io { offset: Some(pos), source })?;
        Ok(())
    }

    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner
            .read(buf)
            .map_err(|source| Error::Io { offset: self.tell().ok(), source })
    }

    fn write_some(&mut self, buf: &[u8]) -> Result<usize> {
        self.inner
            .write(buf)
            .map_err(|source| Error::Io { offset: self.tell().ok(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn seek_rejects_sentinel() {
        let mut c = FileCursor::new(Cursor::new(vec![0u8; 8]));
        assert!(matches!(c.seek_to(SENTINEL_POSITION), Err(Error::SentinelSeek)));
    }

    #[test]
    fn tell_seek_read_write_round_trip() {
        let mut c = FileCursor::new(Cursor::new(vec![0u8; 16]));
        c.seek_to(4).unwrap();
        assert_eq!(c.tell().unwrap(), 4);
        c.write_all_at(&[1, 2, 3]).unwrap();
        c.seek_to(4).unwrap();
        let data = c.read_exact_n(3).unwrap();
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[test]
    fn short_read_at_eof_returns_actual_count() {
        let mut c = FileCursor::new(Cursor::new(vec![1, 2, 3]));
        let mut buf = [0u8; 8];
        let n = c.read_some(&mut buf).unwrap();
        assert_eq!(n, 3);
    }

    #[test]
    fn read_exact_n_past_eof_errors() {
        let mut c = FileCursor::new(Cursor::new(vec![1, 2, 3]));
        assert!(c.read_exact_n(8).is_err());
    }
}
