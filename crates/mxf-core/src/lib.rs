//! Core types and codecs for MXF (SMPTE 377-family) container parsing.
//!
//! This crate provides the bottom layer of the stack:
//!
//! - [`length`] - BER and fixed-width length codecs
//! - [`Ul`] / [`UlMask`] - Universal Label type and its family-masked equality
//! - [`Uuid`] - instance identity (re-exported from the `uuid` crate)
//! - [`Timestamp`] - the 8-byte MXF date/time encoding
//! - [`KeyFormat`] / [`LenFormat`] / [`KagSize`] - per-stream/per-partition
//!   framing configuration (spec §6)
//!
//! # Example
//!
//! ```
//! use mxf_core::length;
//!
//! let encoded = length::encode_ber_min(128);
//! let (decoded, consumed) = length::decode_ber(&encoded).unwrap();
//! assert_eq!(decoded, 128);
//! assert_eq!(consumed, encoded.len());
//! ```

mod config;
mod error;
mod key;
pub mod length;
mod timestamp;

pub use config::{KagSize, KeyFormat, LenFormat};
pub use error::{Error, Result};
pub use key::{Ul, UlMask, Uuid};
pub use timestamp::Timestamp;
