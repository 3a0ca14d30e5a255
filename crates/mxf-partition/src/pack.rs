//! The partition pack: KAG size, essence container list, sibling
//! partition offsets, and the open/closed+complete status (spec §3/§4.7).
//!
//! Grounded on `exiftool-formats/src/mxf.rs` (`PARTITION_PACK_KEY`, the
//! byte layout of major/minor version, KAG size, header/index byte
//! counts, and `parse_operational_pattern`) read back into typed fields
//! instead of flat `AttrValue` strings.

use mxf_core::{length, KagSize, Ul};
use mxf_metadata::registry;

use crate::{Error, Result};

/// Which role a partition plays in the file (spec §4.7; encoded in byte
/// 13 of the partition pack UL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionKind {
    Header,
    Body,
    Footer,
}

impl PartitionKind {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x02 => Some(Self::Header),
            0x03 => Some(Self::Body),
            0x04 => Some(Self::Footer),
            _ => None,
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            Self::Header => 0x02,
            Self::Body => 0x03,
            Self::Footer => 0x04,
        }
    }
}

/// Open/closed x incomplete/complete (spec §4.7). Transitions toward
/// closed and toward complete are monotonic — once set, a write session
/// never reverts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionStatus {
    OpenIncomplete,
    ClosedIncomplete,
    OpenComplete,
    ClosedComplete,
}

impl PartitionStatus {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::OpenIncomplete),
            0x02 => Some(Self::ClosedIncomplete),
            0x03 => Some(Self::OpenComplete),
            0x04 => Some(Self::ClosedComplete),
            _ => None,
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            Self::OpenIncomplete => 0x01,
            Self::ClosedIncomplete => 0x02,
            Self::OpenComplete => 0x03,
            Self::ClosedComplete => 0x04,
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, Self::ClosedIncomplete | Self::ClosedComplete)
    }

    pub fn is_complete(self) -> bool {
        matches!(self, Self::OpenComplete | Self::ClosedComplete)
    }

    /// Sticky transition to closed; already-closed statuses are
    /// unaffected (spec §4.7 "monotonic").
    #[must_use]
    pub fn close(self) -> Self {
        match self {
            Self::OpenIncomplete => Self::ClosedIncomplete,
            Self::OpenComplete => Self::ClosedComplete,
            closed => closed,
        }
    }

    /// Sticky transition to complete.
    #[must_use]
    pub fn complete(self) -> Self {
        match self {
            Self::OpenIncomplete => Self::OpenComplete,
            Self::ClosedIncomplete => Self::ClosedComplete,
            complete => complete,
        }
    }
}

/// The partition pack object (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionPack {
    pub kind: PartitionKind,
    pub status: PartitionStatus,
    pub kag_size: KagSize,
    pub this_partition: u64,
    pub previous_partition: u64,
    pub footer_partition: u64,
    pub header_byte_count: u64,
    pub index_byte_count: u64,
    pub index_sid: u32,
    pub body_offset: u64,
    pub body_sid: u32,
    pub operational_pattern: Ul,
    pub essence_containers: Vec<Ul>,
}

impl PartitionPack {
    pub fn key_ul(&self) -> Ul {
        let mut bytes = *registry::PARTITION_PACK_UL.as_bytes();
        bytes[13] = self.kind.to_byte();
        bytes[14] = self.status.to_byte();
        Ul::new(bytes)
    }

    /// Decode a partition pack's value bytes. `key` is the outer KLV's
    /// UL (bytes 13/14 carry kind and status).
    pub fn decode(key: &Ul, value: &[u8]) -> Result<Self> {
        if value.len() < 80 {
            return Err(mxf_core::Error::MalformedLength("partition pack value shorter than 80 bytes").into());
        }

        let key_bytes = key.as_bytes();
        let kind = PartitionKind::from_byte(key_bytes[13])
            .ok_or(mxf_core::Error::MalformedLength("unrecognised partition kind byte"))?;
        let status = PartitionStatus::from_byte(key_bytes[14])
            .ok_or(mxf_core::Error::MalformedLength("unrecognised partition status byte"))?;

        let kag_raw = length::decode_fixed(&value[4..8], 4)? as u32;
        let kag_size = KagSize::new(kag_raw).unwrap_or_default();

        let this_partition = u64::from_be_bytes(value[8..16].try_into().unwrap());
        let previous_partition = u64::from_be_bytes(value[16..24].try_into().unwrap());
        let footer_partition = u64::from_be_bytes(value[24..32].try_into().unwrap());
        let header_byte_count = u64::from_be_bytes(value[32..40].try_into().unwrap());
        let index_byte_count = u64::from_be_bytes(value[40..48].try_into().unwrap());
        let index_sid = u32::from_be_bytes(value[48..52].try_into().unwrap());
        let body_offset = u64::from_be_bytes(value[52..60].try_into().unwrap());
        let body_sid = u32::from_be_bytes(value[60..64].try_into().unwrap());
        let operational_pattern = Ul::from_slice(&value[64..80])?;

        let essence_containers = if value.len() >= 88 {
            let count = u32::from_be_bytes(value[80..84].try_into().unwrap()) as usize;
            let element_size = u32::from_be_bytes(value[84..88].try_into().unwrap()) as usize;
            let mut out = Vec::with_capacity(count);
            let body = &value[88..];
            for i in 0..count {
                let start = i * element_size;
                let end = start + 16;
                if end > body.len() {
                    break;
                }
                out.push(Ul::from_slice(&body[start..end])?);
            }
            out
        } else {
            Vec::new()
        };

        Ok(Self {
            kind,
            status,
            kag_size,
            this_partition,
            previous_partition,
            footer_partition,
            header_byte_count,
            index_byte_count,
            index_sid,
            body_offset,
            body_sid,
            operational_pattern,
            essence_containers,
        })
    }

    /// Encode this pack's value bytes (mirrors [`PartitionPack::decode`]).
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(88 + self.essence_containers.len() * 16);
        out.extend_from_slice(&1u16.to_be_bytes()); // major version
        out.extend_from_slice(&2u16.to_be_bytes()); // minor version
        out.extend_from_slice(&self.kag_size.get().to_be_bytes());
        out.extend_from_slice(&self.this_partition.to_be_bytes());
        out.extend_from_slice(&self.previous_partition.to_be_bytes());
        out.extend_from_slice(&self.footer_partition.to_be_bytes());
        out.extend_from_slice(&self.header_byte_count.to_be_bytes());
        out.extend_from_slice(&self.index_byte_count.to_be_bytes());
        out.extend_from_slice(&self.index_sid.to_be_bytes());
        out.extend_from_slice(&self.body_offset.to_be_bytes());
        out.extend_from_slice(&self.body_sid.to_be_bytes());
        out.extend_from_slice(self.operational_pattern.as_bytes());
        out.extend_from_slice(&(self.essence_containers.len() as u32).to_be_bytes());
        out.extend_from_slice(&16u32.to_be_bytes());
        for ul in &self.essence_containers {
            out.extend_from_slice(ul.as_bytes());
        }
        out
    }
}
