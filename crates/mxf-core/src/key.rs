//! Universal Labels and instance identity (spec §3).
//!
//! A [`Ul`] is the 16-byte SMPTE type identifier used as a KLV key and as
//! the type selector for metadata sets and properties. A [`Uuid`] is the
//! distinct 16-byte identity used for `InstanceUID`/reference linking —
//! unlike a `Ul` it always compares bytewise, so it is a thin re-export of
//! the `uuid` crate's type rather than a parallel hand-rolled one.

use crate::{Error, Result};
use std::fmt;

/// Re-exported so callers never need `uuid` as a direct dependency.
pub use uuid::Uuid;

/// A 16-byte SMPTE Universal Label.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct Ul(pub [u8; 16]);

impl Ul {
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let arr: [u8; 16] = data
            .try_into()
            .map_err(|_| Error::UnexpectedEof { need: 16, have: data.len() })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Exact 16-byte comparison, ignoring any family mask.
    pub fn equals_exact(&self, other: &Ul) -> bool {
        self.0 == other.0
    }

    /// Family-masked comparison (spec §4.1, §9 "UL equality mask").
    ///
    /// This is the single canonical comparison every higher layer must
    /// route through; `mask` marks which of the 16 bytes participate.
    /// A byte not covered by the mask is ignored (typically byte 7, the
    /// version/registry byte, for item ULs per spec §3).
    pub fn equals_with_mask(&self, other: &Ul, mask: &UlMask) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .enumerate()
            .all(|(i, (a, b))| !mask.compares(i) || a == b)
    }
}

impl fmt::Debug for Ul {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ul(")?;
        for b in &self.0 {
            write!(f, "{:02X}", b)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Ul {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Per-byte participation mask for [`Ul::equals_with_mask`].
///
/// Registries hand out one of these per UL family; the default ignores
/// nothing (exact match), matching spec §4.1 "defaults to exact match".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct UlMask(pub [bool; 16]);

impl UlMask {
    /// All 16 bytes participate (exact-match default).
    pub const EXACT: UlMask = UlMask([true; 16]);

    /// Mask that ignores byte 7 (the version/registry byte many item
    /// ULs vary on), per spec §3.
    pub const IGNORE_VERSION_BYTE: UlMask = {
        let mut m = [true; 16];
        m[7] = false;
        UlMask(m)
    };

    fn compares(&self, index: usize) -> bool {
        self.0[index]
    }
}

impl Default for UlMask {
    fn default() -> Self {
        Self::EXACT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ul_with_last(last: u8) -> Ul {
        let mut b = [0u8; 16];
        b[0..8].copy_from_slice(&[0x06, 0x0E, 0x2B, 0x34, 0x02, 0x05, 0x01, 0x01]);
        b[15] = last;
        Ul(b)
    }

    #[test]
    fn exact_equality() {
        let a = ul_with_last(1);
        let b = ul_with_last(1);
        let c = ul_with_last(2);
        assert!(a.equals_exact(&b));
        assert!(!a.equals_exact(&c));
    }

    #[test]
    fn masked_equality_ignores_version_byte() {
        let mut a = ul_with_last(1);
        let mut b = ul_with_last(1);
        a.0[7] = 1;
        b.0[7] = 2;
        assert!(!a.equals_exact(&b));
        assert!(a.equals_with_mask(&b, &UlMask::IGNORE_VERSION_BYTE));
    }

    #[test]
    fn mask_equality_reflexive_symmetric() {
        let a = ul_with_last(9);
        let b = ul_with_last(9);
        assert!(a.equals_with_mask(&a, &UlMask::EXACT));
        assert_eq!(
            a.equals_with_mask(&b, &UlMask::IGNORE_VERSION_BYTE),
            b.equals_with_mask(&a, &UlMask::IGNORE_VERSION_BYTE)
        );
    }

    #[test]
    fn uuid_is_bytewise_distinct_from_ul() {
        let u1 = Uuid::from_bytes([1u8; 16]);
        let u2 = Uuid::from_bytes([1u8; 16]);
        assert_eq!(u1, u2);
    }
}
