//! Error types for LFProc
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;

use thiserror::Error;

use crate::time::{TimeRange, Timestamp};

/// Result type alias for LFProc operations
pub type Result<T> = std::result::Result<T, LfprocError>;

/// Error produced by a [`SegmentReader`](crate::reader::SegmentReader).
///
/// Readers are supplied by the caller, so their failures are carried as-is.
pub type ReaderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for LFProc operations
#[derive(Error, Debug)]
pub enum LfprocError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Missing source coverage
    #[error("Data gap: {0}")]
    DataGap(#[from] DataGapError),

    /// Failure inside the external reader
    #[error("Reader failed on '{source_ref}': {source}")]
    Reader {
        source_ref: String,
        #[source]
        source: ReaderError,
    },

    /// Time series shape or content error
    #[error("Series error: {0}")]
    Series(#[from] SeriesError),

    /// Window file encoding error
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Catalog error
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Filesystem error
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache bookkeeping broke its own invariant. Indicates a bug, never bad data.
    #[error("Cache invariant violated: {0}")]
    CacheInvariant(String),
}

impl LfprocError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a reader failure with the source it was reading
    pub fn reader(source_ref: impl Into<String>, source: ReaderError) -> Self {
        Self::Reader {
            source_ref: source_ref.into(),
            source,
        }
    }
}

/// Errors in processor configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Processing requested before an output directory was set up
    #[error("Output directory not configured; call set_output_folder first")]
    OutputDirUnset,

    /// A known parameter received an unusable value
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    /// Requested time range cannot produce any window
    #[error("Range [{start}, {end}) too short: {grid_points} grid points, need more than {needed}")]
    RangeTooShort {
        start: Timestamp,
        end: Timestamp,
        grid_points: usize,
        needed: usize,
    },

    /// Configuration document could not be parsed
    #[error("Malformed configuration: {0}")]
    Malformed(String),
}

/// Segments could not be assembled into one continuous series
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} disjoint group(s) after coalescing {} segment(s) with tolerance {tolerance_us}us: {}", .groups.len(), .segments.len(), describe(.groups))]
pub struct DataGapError {
    /// Spans of the input segments, sorted by start
    pub segments: Vec<TimeRange>,
    /// Spans of the disjoint groups left after coalescing
    pub groups: Vec<TimeRange>,
    /// Tolerance that was applied
    pub tolerance_us: i64,
}

impl DataGapError {
    /// No segment at all covered the request
    pub fn no_coverage(tolerance_us: i64) -> Self {
        Self {
            segments: Vec::new(),
            groups: Vec::new(),
            tolerance_us,
        }
    }
}

fn describe(groups: &[TimeRange]) -> String {
    if groups.is_empty() {
        return "no data".to_string();
    }
    groups
        .iter()
        .map(|g| g.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors about time series shape and content
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    /// A series must hold at least one sample
    #[error("Empty time series")]
    Empty,

    /// Sample buffer does not match the axes
    #[error("Shape mismatch: {samples} samples x {channels} channels needs {expected} values, got {actual}")]
    ShapeMismatch {
        samples: usize,
        channels: usize,
        expected: usize,
        actual: usize,
    },

    /// Time axis must be strictly increasing
    #[error("Time axis not strictly increasing at index {index}")]
    NonMonotonicTime { index: usize },

    /// Segments from different channel layouts cannot be combined
    #[error("Channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    /// Target grid for resampling was empty
    #[error("Empty resampling grid")]
    EmptyGrid,

    /// Filter parameters were unusable
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
}

/// Errors decoding or encoding window files
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// File does not start with the expected magic bytes
    #[error("Invalid magic bytes")]
    InvalidMagic,

    /// Written by an unknown format revision
    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u32),

    /// Buffer too short
    #[error("Buffer too short: need at least {needed} bytes, got {available}")]
    BufferTooShort { needed: usize, available: usize },

    /// Invalid checksum
    #[error("Invalid checksum: expected {expected:08x}, got {actual:08x}")]
    InvalidChecksum { expected: u32, actual: u32 },

    /// Header values are inconsistent with the payload
    #[error("Malformed window file: {0}")]
    Malformed(String),
}

/// Errors about the source catalog
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// Entry with start not before end
    #[error("Entry '{source_ref}' has start {start} not before end {end}")]
    InvalidInterval {
        source_ref: String,
        start: Timestamp,
        end: Timestamp,
    },

    /// Timestamp text could not be parsed
    #[error("Unparsable timestamp '{0}'")]
    BadTimestamp(String),

    /// Catalog table could not be read
    #[error("Catalog table error: {0}")]
    Table(String),
}

impl From<csv::Error> for CatalogError {
    fn from(e: csv::Error) -> Self {
        CatalogError::Table(e.to_string())
    }
}
