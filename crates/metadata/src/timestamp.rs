//! Capture timestamp parsing.
//!
//! Metadata tools print dates as `YYYY:MM:DD HH:MM:SS`, optionally followed
//! by sub-seconds and a zone (`+02:00` or `Z`). Only whole seconds matter
//! for naming, so sub-seconds are dropped.

use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

const DATE_TIME_LENGTH: usize = "YYYY:MM:DD HH:MM:SS".len();

/// A parsed timestamp, with or without a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// The value carried its own UTC offset.
    Aware(OffsetDateTime),
    /// Wall-clock time only.
    Naive(PrimitiveDateTime),
}

impl Timestamp {
    /// Parse a metadata date, returning `None` for anything that isn't one
    /// (including the all-zero placeholder cameras write when the clock was
    /// never set).
    ///
    /// # Examples
    ///
    /// ```
    /// use camsync_metadata::Timestamp;
    ///
    /// assert!(matches!(Timestamp::parse("2023:06:01 14:30:00"), Some(Timestamp::Naive(_))));
    /// assert!(matches!(Timestamp::parse("2023:06:02 09:00:00+02:00"), Some(Timestamp::Aware(_))));
    /// assert_eq!(Timestamp::parse("0000:00:00 00:00:00"), None);
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let date_time = PrimitiveDateTime::parse(
            value.get(..DATE_TIME_LENGTH)?,
            format_description!("[year]:[month]:[day] [hour]:[minute]:[second]"),
        )
        .ok()?;
        let mut rest = value.get(DATE_TIME_LENGTH..)?;
        if let Some(fraction) = rest.strip_prefix('.') {
            let digits = fraction.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                return None;
            }
            rest = &fraction[digits..];
        }
        let rest = rest.trim();
        if rest.is_empty() {
            return Some(Self::Naive(date_time));
        }
        if rest.eq_ignore_ascii_case("z") {
            return Some(Self::Aware(date_time.assume_utc()));
        }
        let offset = UtcOffset::parse(rest, format_description!("[offset_hour sign:mandatory]:[offset_minute]")).ok()?;
        Some(Self::Aware(date_time.assume_offset(offset)))
    }

    /// Resolve to an absolute time, using `offset` only if the value had none.
    pub fn or_offset(self, offset: UtcOffset) -> OffsetDateTime {
        match self {
            Self::Aware(aware) => aware,
            Self::Naive(naive) => naive.assume_offset(offset),
        }
    }
}
