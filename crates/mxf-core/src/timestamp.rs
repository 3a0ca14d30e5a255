//! MXF timestamp codec — the 8-byte date/time value used throughout
//! header metadata (`CreationDate`, `ModificationDate`, ...).
//!
//! Encoding (big-endian): year (u16), month, day, hour, minute, second
//! (u8 each), msec (u16, quarter-millisecond units per SMPTE 377M — we
//! keep raw msec as written, matching `exiftool-formats/src/mxf.rs`'s
//! plain millisecond decode of the same 8-byte shape for Preface dates).

use crate::{Error, Result};

/// A decoded MXF timestamp. Calendar fields are kept verbatim even when
/// they don't form a valid date — `to_chrono` is the fallible step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub msec: u16,
}

impl Timestamp {
    pub const ENCODED_LEN: usize = 8;

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::ENCODED_LEN {
            return Err(Error::UnexpectedEof { need: Self::ENCODED_LEN, have: data.len() });
        }
        Ok(Self {
            year: u16::from_be_bytes([data[0], data[1]]),
            month: data[2],
            day: data[3],
            hour: data[4],
            minute: data[5],
            second: data[6],
            msec: data[7] as u16,
        })
    }

    pub fn encode(&self) -> [u8; 8] {
        let y = self.year.to_be_bytes();
        [
            y[0],
            y[1],
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.msec.min(255) as u8,
        ]
    }

    /// Convert to a `chrono::NaiveDateTime`, or `None` if the calendar
    /// fields are not a valid date/time (e.g. month 13).
    pub fn to_chrono(&self) -> Option<chrono::NaiveDateTime> {
        let date = chrono::NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?;
        let time = chrono::NaiveTime::from_hms_milli_opt(
            self.hour as u32,
            self.minute as u32,
            self.second as u32,
            (self.msec as u32) * 4,
        )?;
        Some(chrono::NaiveDateTime::new(date, time))
    }

    pub fn from_chrono(dt: chrono::NaiveDateTime) -> Self {
        use chrono::{Datelike, Timelike};
        Self {
            year: dt.year() as u16,
            month: dt.month() as u8,
            day: dt.day() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
            msec: (dt.and_utc().timestamp_subsec_millis() / 4) as u16,
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_encode_round_trip() {
        let bytes = [0x07, 0xE8, 3, 15, 12, 30, 0, 1];
        let ts = Timestamp::decode(&bytes).unwrap();
        assert_eq!(ts.year, 2024);
        assert_eq!(ts.month, 3);
        assert_eq!(ts.day, 15);
        assert_eq!(ts.encode(), bytes);
    }

    #[test]
    fn invalid_calendar_fields_preserved_not_panicking() {
        let bytes = [0x07, 0xE8, 13, 40, 25, 90, 90, 0];
        let ts = Timestamp::decode(&bytes).unwrap();
        assert_eq!(ts.month, 13);
        assert_eq!(ts.to_chrono(), None);
    }

    #[test]
    fn truncated_input_errors() {
        assert!(Timestamp::decode(&[0; 4]).is_err());
    }
}
