//! The primer: a per-partition bijective map from 2-byte local tags to
//! full ULs (spec §4.5).
//!
//! Grounded on the bounds-checked table-read shape in
//! `exiftool-icc/src/lib.rs` (parse a count-prefixed table of fixed-size
//! records), generalised here to a bidirectional map with deterministic
//! tag allocation on write.

use std::collections::{BTreeMap, HashMap};

use mxf_core::{length, Ul};

use crate::{Error, Result};

/// Bytes per primer record: 2-byte tag + 16-byte UL.
const RECORD_SIZE: u32 = 18;

/// Bidirectional tag/UL map for one partition (spec §4.5).
#[derive(Debug, Clone, Default)]
pub struct Primer {
    tag_to_ul: BTreeMap<u16, Ul>,
    ul_to_tag: HashMap<Ul, u16>,
    next_tag: u16,
}

impl Primer {
    pub fn new() -> Self {
        Self { tag_to_ul: BTreeMap::new(), ul_to_tag: HashMap::new(), next_tag: 1 }
    }

    /// Build a primer pre-seeded with `entries` (e.g. a vendor's standard
    /// tag assignments); tag allocation on subsequent writes skips every
    /// tag used here (spec §4.5).
    pub fn with_seed(entries: impl IntoIterator<Item = (u16, Ul)>) -> Self {
        let mut p = Self::new();
        for (tag, ul) in entries {
            p.tag_to_ul.insert(tag, ul);
            p.ul_to_tag.insert(ul, tag);
        }
        p
    }

    pub fn lookup_by_tag(&self, tag: u16) -> Option<Ul> {
        self.tag_to_ul.get(&tag).copied()
    }

    /// Look up `ul`'s local tag, assigning and recording a fresh one if
    /// this UL has not been seen in this partition before.
    pub fn lookup_by_ul(&mut self, ul: Ul) -> Result<u16> {
        if let Some(&tag) = self.ul_to_tag.get(&ul) {
            return Ok(tag);
        }
        let tag = self.allocate_tag()?;
        self.tag_to_ul.insert(tag, ul);
        self.ul_to_tag.insert(ul, tag);
        Ok(tag)
    }

    fn allocate_tag(&mut self) -> Result<u16> {
        loop {
            let candidate = self.next_tag;
            if candidate == 0 {
                return Err(Error::PrimerTagSpaceExhausted);
            }
            self.next_tag = self.next_tag.wrapping_add(1);
            if !self.tag_to_ul.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tag_to_ul.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tag_to_ul.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, Ul)> + '_ {
        self.tag_to_ul.iter().map(|(&tag, &ul)| (tag, ul))
    }

    /// Encode this primer's value as a batch: big-endian 4-byte count,
    /// big-endian 4-byte element size (18), then `[tag(2) || ul(16)]`
    /// records in ascending tag order (spec §8 scenario 2).
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + self.tag_to_ul.len() * RECORD_SIZE as usize);
        out.extend_from_slice(&(self.tag_to_ul.len() as u32).to_be_bytes());
        out.extend_from_slice(&RECORD_SIZE.to_be_bytes());
        for (&tag, ul) in &self.tag_to_ul {
            out.extend_from_slice(&tag.to_be_bytes());
            out.extend_from_slice(ul.as_bytes());
        }
        out
    }

    /// Parse a primer batch value (the inverse of [`Primer::serialize`]).
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(Error::MalformedPrimer("batch header truncated"));
        }
        let count = length::decode_fixed(&data[0..4], 4)? as usize;
        let element_size = length::decode_fixed(&data[4..8], 4)? as usize;
        if element_size != RECORD_SIZE as usize {
            return Err(Error::MalformedPrimer("unexpected primer record size"));
        }
        let body = &data[8..];
        if body.len() < count * element_size {
            return Err(Error::MalformedPrimer("batch shorter than declared count"));
        }

        let mut primer = Self::new();
        for i in 0..count {
            let record = &body[i * element_size..(i + 1) * element_size];
            let tag = u16::from_be_bytes([record[0], record[1]]);
            let ul = Ul::from_slice(&record[2..18])?;
            primer.tag_to_ul.insert(tag, ul);
            primer.ul_to_tag.insert(ul, tag);
        }
        primer.next_tag = primer.tag_to_ul.keys().next_back().map(|&t| t.wrapping_add(1)).unwrap_or(1);
        Ok(primer)
    }
}
