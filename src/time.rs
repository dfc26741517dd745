// LFProc - Low-frequency windowed processing for sensor archives
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Time axis primitives
//!
//! Timestamps are integer microseconds since the Unix epoch. Integer time keeps
//! grid arithmetic exact: a grid point computed twice is the same value, which the
//! window stitching relies on.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Microseconds per second
pub const MICROS_PER_SEC: i64 = 1_000_000;

/// Width of a rendered timestamp in output file names
pub const FORMATTED_WIDTH: usize = 21;

/// Convert seconds to the nearest whole microsecond
pub fn secs_to_micros(secs: f64) -> i64 {
    (secs * MICROS_PER_SEC as f64).round() as i64
}

/// Convert microseconds to seconds
pub fn micros_to_secs(micros: i64) -> f64 {
    micros as f64 / MICROS_PER_SEC as f64
}

/// A point in time, microseconds since 1970-01-01T00:00:00Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create from raw microseconds
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Create from whole seconds
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * MICROS_PER_SEC)
    }

    /// Create from a chrono UTC datetime
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_micros())
    }

    /// Raw microseconds
    pub const fn as_micros(self) -> i64 {
        self.0
    }

    /// Seconds since the epoch as a float
    pub fn as_secs_f64(self) -> f64 {
        micros_to_secs(self.0)
    }

    /// Shift by a signed number of microseconds
    pub const fn offset(self, micros: i64) -> Self {
        Self(self.0 + micros)
    }

    /// Signed distance `self - earlier` in microseconds
    pub const fn micros_since(self, earlier: Timestamp) -> i64 {
        self.0 - earlier.0
    }

    /// Convert to a chrono datetime (None when out of chrono's range)
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_micros(self.0)
    }

    /// Parse an RFC 3339 string or a naive `YYYY-MM-DDTHH:MM:SS[.f]` string taken as UTC
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let trimmed = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::from_datetime(dt.with_timezone(&Utc)));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Ok(Self::from_datetime(naive.and_utc()));
            }
        }
        Err(CatalogError::BadTimestamp(text.to_string()))
    }

    /// Render at millisecond precision with path-unsafe characters removed.
    ///
    /// `2015-01-01T12:30:00.250` becomes `2015-01-01T123000.250`, always
    /// [`FORMATTED_WIDTH`] characters for in-range dates.
    pub fn format_ms(self) -> String {
        let rendered = match self.to_datetime() {
            Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            None => self.0.to_string(),
        };
        rendered
            .chars()
            .filter(|c| !matches!(c, ':' | '/' | '\\' | '*' | '?' | '"' | '<' | '>' | '|'))
            .take(FORMATTED_WIDTH)
            .collect()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.6f")),
            None => write!(f, "{}us", self.0),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

/// Closed time span `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Length in microseconds
    pub fn duration_micros(&self) -> i64 {
        self.end.micros_since(self.start)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.start, self.end)
    }
}

/// Equally spaced output timestamps covering `[start, end)`.
///
/// Points are computed on demand, so a grid spanning months costs nothing to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeGrid {
    start: Timestamp,
    step_us: i64,
    len: usize,
}

impl TimeGrid {
    /// Build the grid `start, start+step, ...` strictly before `end`.
    ///
    /// A non-positive step or an empty range yields an empty grid.
    pub fn new(start: Timestamp, end: Timestamp, step_us: i64) -> Self {
        let span = end.micros_since(start);
        let len = if step_us <= 0 || span <= 0 {
            0
        } else {
            ((span + step_us - 1) / step_us) as usize
        };
        Self {
            start,
            step_us,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Grid spacing in microseconds
    pub fn step_micros(&self) -> i64 {
        self.step_us
    }

    /// Timestamp of point `index`. Indices past the end extrapolate.
    pub fn at(&self, index: usize) -> Timestamp {
        self.start.offset(self.step_us * index as i64)
    }

    /// Points `from..to` (clamped to the grid)
    pub fn slice(&self, from: usize, to: usize) -> Vec<Timestamp> {
        let to = to.min(self.len);
        (from.min(to)..to).map(|i| self.at(i)).collect()
    }

    /// Last point of the grid
    pub fn last(&self) -> Option<Timestamp> {
        self.len.checked_sub(1).map(|i| self.at(i))
    }
}
