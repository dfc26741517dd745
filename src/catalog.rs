// LFProc - Low-frequency windowed processing for sensor archives
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Source file catalog
//!
//! The [`TimeCatalog`] is the registry of source files and the time span each
//! one covers. It is built once (typically from a CSV table produced by a
//! directory scan) and never changes afterwards.
//!
//! # Table format
//!
//! ```text
//! file,start_time,end_time
//! data/run_0001.lfd,2015-01-01T00:00:00,2015-01-01T00:00:29.9995
//! data/run_0002.lfd,2015-01-01T00:00:30,2015-01-01T00:00:59.9995
//! ```

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, LfprocError, Result};
use crate::gaps;
use crate::time::{TimeRange, Timestamp};

/// Reference to a source file, as understood by the configured reader
pub type SourceRef = String;

/// One source file and the span it covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub source_ref: SourceRef,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

impl CatalogEntry {
    pub fn new(source_ref: impl Into<String>, start_time: Timestamp, end_time: Timestamp) -> Self {
        Self {
            source_ref: source_ref.into(),
            start_time,
            end_time,
        }
    }

    /// True if the entry intersects the open interval `(bg, ed)`
    pub fn overlaps(&self, bg: Timestamp, ed: Timestamp) -> bool {
        self.start_time < ed && self.end_time > bg
    }
}

/// Row of the on-disk catalog table
#[derive(Debug, Serialize, Deserialize)]
struct CatalogRow {
    file: String,
    start_time: String,
    end_time: String,
}

/// Sorted registry of source files
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeCatalog {
    entries: Vec<CatalogEntry>,
}

impl TimeCatalog {
    /// Build a catalog, sorting entries by start time.
    ///
    /// Entries whose start is not before their end are rejected.
    pub fn new(mut entries: Vec<CatalogEntry>) -> std::result::Result<Self, CatalogError> {
        if let Some(bad) = entries.iter().find(|e| e.start_time >= e.end_time) {
            return Err(CatalogError::InvalidInterval {
                source_ref: bad.source_ref.clone(),
                start: bad.start_time,
                end: bad.end_time,
            });
        }
        entries.sort_by_key(|e| e.start_time);
        Ok(Self { entries })
    }

    /// Read a `file,start_time,end_time` table
    pub fn from_csv_reader<R: Read>(reader: R) -> std::result::Result<Self, CatalogError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut entries = Vec::new();
        for row in rdr.deserialize::<CatalogRow>() {
            let row = row?;
            entries.push(CatalogEntry {
                start_time: Timestamp::parse(&row.start_time)?,
                end_time: Timestamp::parse(&row.end_time)?,
                source_ref: row.file,
            });
        }
        Self::new(entries)
    }

    /// Load a catalog table from disk
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| LfprocError::io(path, e))?;
        Ok(Self::from_csv_reader(file)?)
    }

    /// Write the catalog as a `file,start_time,end_time` table
    pub fn to_csv_writer<W: Write>(&self, writer: W) -> std::result::Result<(), CatalogError> {
        let mut wtr = csv::Writer::from_writer(writer);
        for e in &self.entries {
            wtr.serialize(CatalogRow {
                file: e.source_ref.clone(),
                start_time: e.start_time.to_string(),
                end_time: e.end_time.to_string(),
            })?;
        }
        wtr.flush()
            .map_err(|e| CatalogError::Table(e.to_string()))?;
        Ok(())
    }

    /// Save the catalog table to disk
    pub fn to_csv_path(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| LfprocError::io(path, e))?;
        Ok(self.to_csv_writer(file)?)
    }

    /// Entries in ascending start order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry with `start_time < ed` and `end_time > bg`, in catalog order
    pub fn overlapping(&self, bg: Timestamp, ed: Timestamp) -> Vec<&CatalogEntry> {
        // Entries starting at or after `ed` cannot overlap; the scan stops there.
        let upper = self.entries.partition_point(|e| e.start_time < ed);
        self.entries[..upper]
            .iter()
            .filter(|e| e.end_time > bg)
            .collect()
    }

    /// Spans of continuous coverage.
    ///
    /// See [`gaps::contiguous_segments`] for the tolerance rule.
    pub fn contiguous_segments(&self, gap_tolerance_us: Option<i64>) -> Vec<TimeRange> {
        gaps::contiguous_segments(&self.entries, gap_tolerance_us)
    }

    /// Earliest start to latest end over all entries
    pub fn time_span(&self) -> Option<TimeRange> {
        let first = self.entries.first()?;
        let end = self.entries.iter().map(|e| e.end_time).max()?;
        Some(TimeRange::new(first.start_time, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, start: i64, end: i64) -> CatalogEntry {
        CatalogEntry::new(name, Timestamp::from_secs(start), Timestamp::from_secs(end))
    }

    #[test]
    fn test_new_sorts_by_start() {
        let cat = TimeCatalog::new(vec![
            entry("c", 20, 30),
            entry("a", 0, 10),
            entry("b", 10, 20),
        ])
        .unwrap();
        let names: Vec<_> = cat.entries().iter().map(|e| e.source_ref.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_rejects_empty_interval() {
        let err = TimeCatalog::new(vec![entry("x", 5, 5)]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInterval { .. }));
    }

    #[test]
    fn test_overlapping_is_strict() {
        let cat = TimeCatalog::new(vec![
            entry("a", 0, 10),
            entry("b", 10, 20),
            entry("c", 20, 30),
        ])
        .unwrap();

        let hit = cat.overlapping(Timestamp::from_secs(10), Timestamp::from_secs(20));
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].source_ref, "b");

        let hit = cat.overlapping(Timestamp::from_secs(5), Timestamp::from_secs(25));
        let names: Vec<_> = hit.iter().map(|e| e.source_ref.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);

        assert!(cat
            .overlapping(Timestamp::from_secs(30), Timestamp::from_secs(40))
            .is_empty());
    }

    #[test]
    fn test_overlapping_long_entry() {
        // A long file starting first still overlaps a late query
        let cat = TimeCatalog::new(vec![entry("long", 0, 100), entry("short", 10, 12)]).unwrap();
        let hit = cat.overlapping(Timestamp::from_secs(50), Timestamp::from_secs(60));
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].source_ref, "long");
    }

    #[test]
    fn test_csv_roundtrip() {
        let csv_text = "file,start_time,end_time\n\
                        b.lfd,2015-01-01T00:00:30,2015-01-01T00:00:59.9995\n\
                        a.lfd,2015-01-01T00:00:00,2015-01-01T00:00:29.9995\n";
        let cat = TimeCatalog::from_csv_reader(csv_text.as_bytes()).unwrap();
        assert_eq!(cat.len(), 2);
        assert_eq!(cat.entries()[0].source_ref, "a.lfd");
        assert_eq!(
            cat.entries()[0].end_time,
            Timestamp::parse("2015-01-01T00:00:29.9995").unwrap()
        );

        let mut buf = Vec::new();
        cat.to_csv_writer(&mut buf).unwrap();
        let again = TimeCatalog::from_csv_reader(buf.as_slice()).unwrap();
        assert_eq!(cat, again);
    }

    #[test]
    fn test_csv_bad_timestamp() {
        let csv_text = "file,start_time,end_time\nx,not-a-time,2015-01-01T00:00:00\n";
        let err = TimeCatalog::from_csv_reader(csv_text.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogError::BadTimestamp(_)));
    }

    #[test]
    fn test_time_span() {
        let cat = TimeCatalog::new(vec![entry("a", 0, 50), entry("b", 10, 20)]).unwrap();
        let span = cat.time_span().unwrap();
        assert_eq!(span.start, Timestamp::from_secs(0));
        assert_eq!(span.end, Timestamp::from_secs(50));
        assert!(TimeCatalog::default().time_span().is_none());
    }
}
