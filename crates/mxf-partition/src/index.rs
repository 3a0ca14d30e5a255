//! Index table segments: edit-unit to byte-offset mapping (spec §4.8).
//!
//! Grounded on the count-prefixed batch read in `exiftool-core/src/ifd.rs`
//! (read a record count, then loop reading fixed-size records), applied
//! here to the index entry batch instead of an IFD's tag/value records.

use mxf_core::length;

use crate::{Error, Result};

/// One edit-unit's index entry (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub temporal_offset: i8,
    pub key_frame_offset: i8,
    pub flags: u8,
    pub stream_offset: u64,
}

/// One index table segment (spec §4.8).
#[derive(Debug, Clone, PartialEq)]
pub struct IndexTableSegment {
    pub edit_rate_numerator: u32,
    pub edit_rate_denominator: u32,
    pub index_start_position: u64,
    pub duration: u64,
    /// 0 for variable-size streams (a delta entry table governs edit
    /// unit boundaries instead); otherwise the fixed byte count of every
    /// edit unit.
    pub edit_unit_byte_count: u32,
    pub index_sid: u32,
    pub body_sid: u32,
    pub entries: Vec<IndexEntry>,
}

impl IndexTableSegment {
    /// The half-open `[start, start+duration)` range this segment covers
    /// on its essence stream's timeline.
    pub fn range(&self) -> std::ops::Range<u64> {
        self.index_start_position..self.index_start_position + self.duration
    }

    /// Verify the within-segment invariant: stream-offsets are
    /// non-decreasing (spec §4.8/§8).
    pub fn check_non_decreasing_offsets(&self) -> Result<()> {
        let mut prev = None;
        for e in &self.entries {
            if let Some(p) = prev {
                if e.stream_offset < p {
                    return Err(Error::MalformedIndexTable("stream offsets must be non-decreasing"));
                }
            }
            prev = Some(e.stream_offset);
        }
        Ok(())
    }

    /// Encode this segment's value bytes: the scalar header fields
    /// followed by the entry batch (4-byte count, 4-byte element size,
    /// then `(i8, i8, u8, u64)` records).
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(40 + self.entries.len() * 11);
        out.extend_from_slice(&self.edit_rate_numerator.to_be_bytes());
        out.extend_from_slice(&self.edit_rate_denominator.to_be_bytes());
        out.extend_from_slice(&self.index_start_position.to_be_bytes());
        out.extend_from_slice(&self.duration.to_be_bytes());
        out.extend_from_slice(&self.edit_unit_byte_count.to_be_bytes());
        out.extend_from_slice(&self.index_sid.to_be_bytes());
        out.extend_from_slice(&self.body_sid.to_be_bytes());
        out.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());
        out.extend_from_slice(&11u32.to_be_bytes());
        for e in &self.entries {
            out.push(e.temporal_offset as u8);
            out.push(e.key_frame_offset as u8);
            out.push(e.flags);
            out.extend_from_slice(&e.stream_offset.to_be_bytes());
        }
        out
    }

    /// Decode a segment's value bytes (the inverse of
    /// [`IndexTableSegment::encode`]).
    pub fn decode(value: &[u8]) -> Result<Self> {
        if value.len() < 36 {
            return Err(Error::MalformedIndexTable("segment header truncated"));
        }
        let edit_rate_numerator = u32::from_be_bytes(value[0..4].try_into().unwrap());
        let edit_rate_denominator = u32::from_be_bytes(value[4..8].try_into().unwrap());
        let index_start_position = u64::from_be_bytes(value[8..16].try_into().unwrap());
        let duration = u64::from_be_bytes(value[16..24].try_into().unwrap());
        let edit_unit_byte_count = u32::from_be_bytes(value[24..28].try_into().unwrap());
        let index_sid = u32::from_be_bytes(value[28..32].try_into().unwrap());
        let body_sid = u32::from_be_bytes(value[32..36].try_into().unwrap());

        let entries = if value.len() >= 44 {
            let count = length::decode_fixed(&value[36..40], 4)? as usize;
            let element_size = length::decode_fixed(&value[40..44], 4)? as usize;
            if element_size != 11 {
                return Err(Error::MalformedIndexTable("unexpected index entry record size"));
            }
            let body = &value[44..];
            if body.len() < count * element_size {
                return Err(Error::MalformedIndexTable("entry batch shorter than declared count"));
            }
            let mut entries = Vec::with_capacity(count);
            for i in 0..count {
                let rec = &body[i * element_size..(i + 1) * element_size];
                entries.push(IndexEntry {
                    temporal_offset: rec[0] as i8,
                    key_frame_offset: rec[1] as i8,
                    flags: rec[2],
                    stream_offset: u64::from_be_bytes(rec[3..11].try_into().unwrap()),
                });
            }
            entries
        } else {
            Vec::new()
        };

        let segment = Self {
            edit_rate_numerator,
            edit_rate_denominator,
            index_start_position,
            duration,
            edit_unit_byte_count,
            index_sid,
            body_sid,
            entries,
        };
        segment.check_non_decreasing_offsets()?;
        Ok(segment)
    }
}

/// Check the cross-segment invariant: among segments attached to the same
/// essence stream, start-positions partition the timeline without gaps
/// or overlaps (spec §4.8/§8). `segments` need not be pre-sorted.
pub fn check_timeline_partition(segments: &[&IndexTableSegment]) -> Result<()> {
    let mut sorted: Vec<&&IndexTableSegment> = segments.iter().collect();
    sorted.sort_by_key(|s| s.index_start_position);

    let mut expected_next = None;
    for s in sorted {
        if let Some(next) = expected_next {
            if s.index_start_position != next {
                return Err(Error::MalformedIndexTable("index segments leave a gap or overlap on the timeline"));
            }
        }
        expected_next = Some(s.index_start_position + s.duration);
    }
    Ok(())
}
