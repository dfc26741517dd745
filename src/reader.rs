// LFProc - Low-frequency windowed processing for sensor archives
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Source readers
//!
//! A [`SegmentReader`] turns a source reference from the catalog into a
//! [`TimeSeries`]. Format-specific readers live outside this crate; the
//! adapters here wrap closures and the native window format.

use std::path::PathBuf;

use crate::error::{LfprocError, ReaderError};
use crate::format::decode_series;
use crate::series::TimeSeries;
use crate::time::Timestamp;

/// Capability to load source files
pub trait SegmentReader {
    /// Read the whole source
    fn read(&mut self, source_ref: &str) -> Result<TimeSeries, ReaderError>;

    /// Read only samples within `[start, end]`.
    ///
    /// Returns `None` when nothing in the source falls inside. The default
    /// reads the whole source and selects.
    fn read_range(
        &mut self,
        source_ref: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Option<TimeSeries>, ReaderError> {
        Ok(self.read(source_ref)?.select_time(Some(start), Some(end)))
    }

    /// Whether [`read_range`](Self::read_range) avoids a full read.
    ///
    /// Partial readers bypass the segment cache.
    fn supports_partial_reading(&self) -> bool {
        false
    }
}

impl<R: SegmentReader + ?Sized> SegmentReader for Box<R> {
    fn read(&mut self, source_ref: &str) -> Result<TimeSeries, ReaderError> {
        (**self).read(source_ref)
    }

    fn read_range(
        &mut self,
        source_ref: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Option<TimeSeries>, ReaderError> {
        (**self).read_range(source_ref, start, end)
    }

    fn supports_partial_reading(&self) -> bool {
        (**self).supports_partial_reading()
    }
}

/// Full reader backed by a closure
pub struct FnReader<F> {
    read_fn: F,
}

impl<F> FnReader<F>
where
    F: FnMut(&str) -> Result<TimeSeries, ReaderError>,
{
    pub fn new(read_fn: F) -> Self {
        Self { read_fn }
    }
}

impl<F> SegmentReader for FnReader<F>
where
    F: FnMut(&str) -> Result<TimeSeries, ReaderError>,
{
    fn read(&mut self, source_ref: &str) -> Result<TimeSeries, ReaderError> {
        (self.read_fn)(source_ref)
    }
}

/// Partial reader backed by a closure taking the requested span
pub struct RangeFnReader<F> {
    read_fn: F,
}

impl<F> RangeFnReader<F>
where
    F: FnMut(&str, Option<(Timestamp, Timestamp)>) -> Result<Option<TimeSeries>, ReaderError>,
{
    /// `read_fn` receives `None` for a full read
    pub fn new(read_fn: F) -> Self {
        Self { read_fn }
    }
}

impl<F> SegmentReader for RangeFnReader<F>
where
    F: FnMut(&str, Option<(Timestamp, Timestamp)>) -> Result<Option<TimeSeries>, ReaderError>,
{
    fn read(&mut self, source_ref: &str) -> Result<TimeSeries, ReaderError> {
        (self.read_fn)(source_ref, None)?
            .ok_or_else(|| format!("source '{source_ref}' holds no samples").into())
    }

    fn read_range(
        &mut self,
        source_ref: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Option<TimeSeries>, ReaderError> {
        (self.read_fn)(source_ref, Some((start, end)))
    }

    fn supports_partial_reading(&self) -> bool {
        true
    }
}

/// Reads sources stored in the native `.lfd` window format.
///
/// Relative source references resolve against `root` when one is set.
#[derive(Debug, Clone, Default)]
pub struct NativeFileReader {
    root: Option<PathBuf>,
}

impl NativeFileReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative references against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, source_ref: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(source_ref),
            None => PathBuf::from(source_ref),
        }
    }
}

impl SegmentReader for NativeFileReader {
    fn read(&mut self, source_ref: &str) -> Result<TimeSeries, ReaderError> {
        let path = self.resolve(source_ref);
        let bytes = std::fs::read(&path).map_err(|e| LfprocError::io(&path, e))?;
        Ok(decode_series(&bytes)?)
    }
}
