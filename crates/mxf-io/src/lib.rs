//! Positioned file I/O and the KLV cursor (spec §4.2-§4.4).
//!
//! - [`PositionedFile`] / [`FileCursor`] — a 64-bit signed-offset read/write
//!   cursor over a single file.
//! - [`KlvObject`] / [`ReadHandler`] — decodes and re-encodes individual
//!   KLV triples against a `PositionedFile`, with value materialisation
//!   delegable to a handler for chunked or streamed access.

mod cursor;
mod error;
mod klv;

pub use cursor::{FileCursor, PositionedFile, SENTINEL_POSITION};
pub use error::{Error, Result};
pub use klv::{CursorIdentity, FileSlot, KlvObject, ReadHandler, SENTINEL_ALL};
