//! Event timestamps and the clock that hands them out.
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("timestamp {0} s after the epoch is outside the representable date range")]
    OutOfRange(u64),
}

/// A UTC instant with whole-second precision, serialised as seconds since the epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(#[serde(with = "chrono::serde::ts_seconds")] DateTime<Utc>);

impl Timestamp {
    pub fn from_secs(secs: u64) -> Result<Self, ClockError> {
        i64::try_from(secs)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(Self)
            .ok_or(ClockError::OutOfRange(secs))
    }

    /// Seconds since the epoch; instants before 1970 read as 0.
    pub fn as_secs(self) -> u64 {
        u64::try_from(self.0.timestamp()).unwrap_or(0)
    }

    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({self})")
    }
}

/// RFC 3339, e.g. `1970-04-26T17:46:40Z`.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

/// Source of synthetic event timestamps.
///
/// The clock is a plain value: whoever emits an event takes the current reading and
/// keeps the advanced clock, so the sequence of readings is strictly increasing for as
/// long as the same clock is passed along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    next: u64,
}

impl Clock {
    /// 10 000 000 s after the epoch.
    pub const DEFAULT_EPOCH_OFFSET: u64 = 10_000_000;

    pub const fn starting_at(secs: u64) -> Self {
        Self { next: secs }
    }

    /// Returns the current reading and the clock advanced by one second.
    ///
    /// Fails once the reading leaves the range of representable dates.
    pub fn tick(self) -> Result<(Timestamp, Clock), ClockError> {
        let now = Timestamp::from_secs(self.next)?;
        let next = self
            .next
            .checked_add(1)
            .ok_or(ClockError::OutOfRange(self.next))?;
        Ok((now, Clock::starting_at(next)))
    }

    /// Seconds since the epoch of the next reading.
    pub fn peek(&self) -> u64 {
        self.next
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::starting_at(Self::DEFAULT_EPOCH_OFFSET)
    }
}
