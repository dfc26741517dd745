// LFProc - Low-frequency windowed processing for sensor archives
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Catalog-driven access to source data
//!
//! [`SegmentStore`] answers "give me everything between `a` and `b`" by asking
//! the catalog which files overlap and loading each one through the cache.

use crate::cache::{CacheStats, SegmentCache};
use crate::catalog::TimeCatalog;
use crate::error::Result;
use crate::reader::SegmentReader;
use crate::series::TimeSeries;
use crate::time::Timestamp;

/// Catalog plus segment cache
#[derive(Debug)]
pub struct SegmentStore {
    catalog: TimeCatalog,
    cache: SegmentCache,
}

impl SegmentStore {
    pub fn new(catalog: TimeCatalog, reader: Box<dyn SegmentReader>) -> Self {
        Self {
            catalog,
            cache: SegmentCache::new(reader),
        }
    }

    pub fn catalog(&self) -> &TimeCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &SegmentCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Cache budget in gigabytes
    pub fn set_cache_limit_gb(&mut self, gb: f64) {
        self.cache.set_limit_gb(gb);
    }

    pub fn set_cache_limit_bytes(&mut self, bytes: usize) {
        self.cache.set_limit_bytes(bytes);
    }

    /// One piece per overlapping source file, restricted to `[start, end]`.
    ///
    /// Pieces come back in catalog order. Files whose samples all fall outside
    /// the range are skipped.
    pub fn fetch(&mut self, start: Timestamp, end: Timestamp) -> Result<Vec<TimeSeries>> {
        let refs: Vec<String> = self
            .catalog
            .overlapping(start, end)
            .into_iter()
            .map(|e| e.source_ref.clone())
            .collect();
        log::debug!("fetch {start} .. {end}: {} source file(s)", refs.len());

        let partial = self.cache.supports_partial_reading();
        let mut pieces = Vec::with_capacity(refs.len());
        for source_ref in &refs {
            let piece = if partial {
                self.cache.read_range(source_ref, start, end)?
            } else {
                self.cache
                    .load(source_ref)?
                    .select_time(Some(start), Some(end))
            };
            match piece {
                Some(series) => pieces.push(series),
                None => log::warn!("{source_ref} has no samples in {start} .. {end}, skipped"),
            }
        }
        Ok(pieces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::reader::{FnReader, RangeFnReader};
    use crate::time::MICROS_PER_SEC;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Ten 10 s files, sample every second; file `fN` starts at N*10 s
    fn catalog() -> TimeCatalog {
        TimeCatalog::new(
            (0..10)
                .map(|i| {
                    CatalogEntry::new(
                        format!("f{i}"),
                        Timestamp::from_secs(i * 10),
                        Timestamp::from_secs(i * 10 + 9),
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    fn file(source_ref: &str) -> TimeSeries {
        let idx: i64 = source_ref[1..].parse().unwrap();
        let data = (0..10).map(|i| (idx * 10 + i) as f32).collect();
        TimeSeries::from_regular(Timestamp::from_secs(idx * 10), MICROS_PER_SEC, 1, data).unwrap()
    }

    #[test]
    fn test_fetch_selects_inclusive_range() {
        let reader = FnReader::new(|r: &str| Ok(file(r)));
        let mut store = SegmentStore::new(catalog(), Box::new(reader));
        let pieces = store
            .fetch(Timestamp::from_secs(15), Timestamp::from_secs(32))
            .unwrap();
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0].time_min(), Timestamp::from_secs(15));
        assert_eq!(pieces[2].time_max(), Timestamp::from_secs(32));
        let total: usize = pieces.iter().map(|p| p.n_samples()).sum();
        assert_eq!(total, 18);
    }

    #[test]
    fn test_fetch_reuses_cache() {
        let reads = Rc::new(Cell::new(0));
        let counter = reads.clone();
        let reader = FnReader::new(move |r: &str| {
            counter.set(counter.get() + 1);
            Ok(file(r))
        });
        let mut store = SegmentStore::new(catalog(), Box::new(reader));
        store
            .fetch(Timestamp::from_secs(0), Timestamp::from_secs(15))
            .unwrap();
        store
            .fetch(Timestamp::from_secs(12), Timestamp::from_secs(25))
            .unwrap();
        assert_eq!(reads.get(), 3);
        assert_eq!(store.cache_stats().hits, 1);
    }

    #[test]
    fn test_fetch_skips_files_without_samples() {
        // Query between the last sample of f1 (19 s) and the first of f2 (20 s)
        let reader = FnReader::new(|r: &str| Ok(file(r)));
        let mut store = SegmentStore::new(catalog(), Box::new(reader));
        let pieces = store
            .fetch(Timestamp::from_micros(19_200_000), Timestamp::from_micros(19_800_000))
            .unwrap();
        assert!(pieces.is_empty());
    }

    #[test]
    fn test_partial_reader_bypasses_cache() {
        let reader = RangeFnReader::new(|r: &str, span: Option<(Timestamp, Timestamp)>| {
            let full = file(r);
            Ok(match span {
                Some((a, b)) => full.select_time(Some(a), Some(b)),
                None => Some(full),
            })
        });
        let mut store = SegmentStore::new(catalog(), Box::new(reader));
        let pieces = store
            .fetch(Timestamp::from_secs(5), Timestamp::from_secs(12))
            .unwrap();
        assert_eq!(pieces.len(), 2);
        assert!(store.cache().is_empty());
    }

    #[test]
    fn test_fetch_reader_error() {
        let reader = FnReader::new(|r: &str| {
            if r == "f3" {
                Err("disk on fire".into())
            } else {
                Ok(file(r))
            }
        });
        let mut store = SegmentStore::new(catalog(), Box::new(reader));
        let err = store
            .fetch(Timestamp::from_secs(25), Timestamp::from_secs(35))
            .unwrap_err();
        assert!(err.to_string().contains("f3"));
    }
}
