//! Fixed-format `YYYY-MM-DD HH:MM:SS` calendar values.
//!
//! # Invariants
//! - Parsing accepts exactly the fixed pattern; no partial or alternate forms.
//! - `to_string()` of a parsed value reproduces the parsed text byte-for-byte.
//! - No timezone and no calendar validation beyond the pattern.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

// `[0-9]` rather than `\d`: the regex crate's `\d` also matches non-ASCII digits.
static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<year>[0-9]{4})-(?P<month>[0-9]{2})-(?P<day>[0-9]{2}) (?P<hours>[0-9]{2}):(?P<minutes>[0-9]{2}):(?P<seconds>[0-9]{2})$",
    )
    .expect("valid timestamp regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    NoMatch(String),
}

impl Display for TimestampError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoMatch(input) => write!(f, "found no data to capture in `{input}`"),
        }
    }
}

impl Error for TimestampError {}

/// Six-field date-time as stored in text columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hours: i32,
    pub minutes: i32,
    pub seconds: i32,
}

impl Timestamp {
    pub fn new(year: i32, month: i32, day: i32, hours: i32, minutes: i32, seconds: i32) -> Self {
        Self {
            year,
            month,
            day,
            hours,
            minutes,
            seconds,
        }
    }

    /// Current local wall-clock time, truncated to whole seconds.
    pub fn now() -> Self {
        Self::from(Local::now().naive_local())
    }

    pub fn parse(input: &str) -> Result<Self, TimestampError> {
        let captures = TIMESTAMP_RE
            .captures(input)
            .ok_or_else(|| TimestampError::NoMatch(input.to_string()))?;

        // Each group is 2-4 ASCII digits, so the integer parse cannot fail.
        let field = |name: &str| -> i32 {
            captures
                .name(name)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or_default()
        };

        Ok(Self {
            year: field("year"),
            month: field("month"),
            day: field("day"),
            hours: field("hours"),
            minutes: field("minutes"),
            seconds: field("seconds"),
        })
    }

    /// Returns the chrono equivalent when the fields form a real calendar value.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(
            self.year,
            u32::try_from(self.month).ok()?,
            u32::try_from(self.day).ok()?,
        )?;
        date.and_hms_opt(
            u32::try_from(self.hours).ok()?,
            u32::try_from(self.minutes).ok()?,
            u32::try_from(self.seconds).ok()?,
        )
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hours, self.minutes, self.seconds
        )
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Self {
            year: value.year(),
            month: value.month() as i32,
            day: value.day() as i32,
            hours: value.hour() as i32,
            minutes: value.minute() as i32,
            seconds: value.second() as i32,
        }
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::Text(value.to_string())
    }
}
