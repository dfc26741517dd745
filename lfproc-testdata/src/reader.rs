// LFProc Testdata - On-the-fly reader
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Reader that renders synthetic source files on request.
//!
//! Supports partial reads: only the rows inside the requested span are
//! rendered, and they match the same rows of a full read exactly.

use lfproc::{ReaderError, SegmentReader, TimeSeries, Timestamp};

use crate::archive::SyntheticArchive;

/// Partial-reading reader over a [`SyntheticArchive`]
#[derive(Debug, Clone)]
pub struct SyntheticReader {
    archive: SyntheticArchive,
    reads: usize,
}

impl SyntheticReader {
    pub fn new(archive: SyntheticArchive) -> Self {
        Self { archive, reads: 0 }
    }

    /// Number of read calls served so far
    pub fn reads(&self) -> usize {
        self.reads
    }

    fn index(&self, source_ref: &str) -> Result<usize, ReaderError> {
        self.archive
            .file_index(source_ref)
            .ok_or_else(|| format!("no synthetic file named '{source_ref}'").into())
    }
}

impl SegmentReader for SyntheticReader {
    fn read(&mut self, source_ref: &str) -> Result<TimeSeries, ReaderError> {
        let index = self.index(source_ref)?;
        self.reads += 1;
        Ok(self.archive.file_series(index)?)
    }

    fn read_range(
        &mut self,
        source_ref: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Option<TimeSeries>, ReaderError> {
        let index = self.index(source_ref)?;
        self.reads += 1;

        let cfg = self.archive.config();
        let span = self.archive.file_span(index);
        let dt = cfg.sample_interval_us;
        let last = cfg.samples_per_file as i64 - 1;

        // First row at or after `start`, last row at or before `end`
        let first = (start.micros_since(span.start) + dt - 1).div_euclid(dt).max(0);
        let upto = end.micros_since(span.start).div_euclid(dt).min(last);
        if first > upto {
            return Ok(None);
        }
        let rows = (upto - first + 1) as usize;
        Ok(Some(self.archive.render_rows(index, first as usize, rows)?))
    }

    fn supports_partial_reading(&self) -> bool {
        true
    }
}
