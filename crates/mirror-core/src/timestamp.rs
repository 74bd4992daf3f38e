//! Whole-second modification times in the `YYYYMMDDHHMMSS` wire form.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::SystemTime;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};

/// A modification time truncated to whole seconds, in UTC.
///
/// Local and remote timestamps are compared through this type only, so a
/// file uploaded with its mtime copied to the remote side compares equal on
/// the next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModTime(NaiveDateTime);

/// A remote timestamp reply that is not `YYYYMMDDHHMMSS[...]`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid modification time '{0}'")]
pub struct ParseModTimeError(pub String);

impl ModTime {
    pub const FORMAT: &'static str = "%Y%m%d%H%M%S";

    pub fn from_naive(time: NaiveDateTime) -> Self {
        Self(time.with_nanosecond(0).unwrap_or(time))
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        let utc: DateTime<Utc> = time.into();
        Self::from_naive(utc.naive_utc())
    }

    /// Modification time of a local file.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        let modified = std::fs::metadata(path)?.modified()?;
        Ok(Self::from_system_time(modified))
    }

    /// Parse a remote reply. Only the first 14 digits are significant;
    /// servers may append fractional seconds.
    pub fn parse(text: &str) -> Result<Self, ParseModTimeError> {
        let invalid = || ParseModTimeError(text.to_string());
        let digits = text.trim().get(..14).ok_or_else(invalid)?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let field = |range: std::ops::Range<usize>| digits[range].parse::<u32>().ok();

        let year = digits[0..4].parse::<i32>().map_err(|_| invalid())?;
        let (month, day) = (field(4..6).ok_or_else(invalid)?, field(6..8).ok_or_else(invalid)?);
        let (hour, minute, second) = (
            field(8..10).ok_or_else(invalid)?,
            field(10..12).ok_or_else(invalid)?,
            field(12..14).ok_or_else(invalid)?,
        );

        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .map(Self)
            .ok_or_else(invalid)
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for ModTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl FromStr for ModTime {
    type Err = ParseModTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
