// LFProc - Low-frequency windowed processing for sensor archives
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Size-bounded segment cache
//!
//! Keeps recently read source files in memory so that consecutive windows
//! straddling the same file do not read it twice.
//!
//! ```text
//!  entries: source_ref -> (series, tick)
//!  recency: tick -> source_ref          (oldest first)
//!
//!  load(ref)
//!    hit  -> re-tick (move to newest)
//!    miss -> read, insert newest, evict oldest
//!            while size > limit && len > 1
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::catalog::SourceRef;
use crate::error::{LfprocError, ReaderError, Result};
use crate::reader::SegmentReader;
use crate::series::TimeSeries;
use crate::time::Timestamp;

/// Bytes per gigabyte used for cache budgets
pub const BYTES_PER_GB: f64 = 1e9;

/// Default cache budget (1 GB)
pub const DEFAULT_CACHE_LIMIT_BYTES: usize = 1_000_000_000;

/// Cache activity counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of loads served from memory
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Slot {
    series: TimeSeries,
    tick: u64,
}

/// LRU cache of whole source files
pub struct SegmentCache {
    reader: Box<dyn SegmentReader>,
    entries: HashMap<SourceRef, Slot>,
    recency: BTreeMap<u64, SourceRef>,
    next_tick: u64,
    total_bytes: usize,
    limit_bytes: usize,
    stats: CacheStats,
}

impl SegmentCache {
    /// Create an empty cache with the default budget
    pub fn new(reader: Box<dyn SegmentReader>) -> Self {
        Self {
            reader,
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            next_tick: 0,
            total_bytes: 0,
            limit_bytes: DEFAULT_CACHE_LIMIT_BYTES,
            stats: CacheStats::default(),
        }
    }

    /// Set the budget in bytes.
    ///
    /// Shrinking does not evict immediately; the next miss does.
    pub fn set_limit_bytes(&mut self, bytes: usize) {
        self.limit_bytes = bytes;
    }

    /// Set the budget in gigabytes (1e9 bytes)
    pub fn set_limit_gb(&mut self, gb: f64) {
        self.limit_bytes = (gb.max(0.0) * BYTES_PER_GB) as usize;
    }

    pub fn limit_bytes(&self) -> usize {
        self.limit_bytes
    }

    /// Sum of payload bytes of every cached series
    pub fn estimated_size(&self) -> usize {
        self.total_bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, source_ref: &str) -> bool {
        self.entries.contains_key(source_ref)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Cached references, least recently used first
    pub fn recency_order(&self) -> Vec<&str> {
        self.recency.values().map(String::as_str).collect()
    }

    /// Drop every cached series
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.total_bytes = 0;
    }

    /// Whether the underlying reader serves partial ranges
    pub fn supports_partial_reading(&self) -> bool {
        self.reader.supports_partial_reading()
    }

    /// Partial read straight from the reader, bypassing the cache
    pub fn read_range(
        &mut self,
        source_ref: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Option<TimeSeries>> {
        self.reader
            .read_range(source_ref, start, end)
            .map_err(|e: ReaderError| LfprocError::reader(source_ref, e))
    }

    /// Series for `source_ref`, read on a miss
    pub fn load(&mut self, source_ref: &str) -> Result<&TimeSeries> {
        let tick = self.bump_tick();
        if let Some(slot) = self.entries.get_mut(source_ref) {
            self.recency.remove(&slot.tick);
            slot.tick = tick;
            self.recency.insert(tick, source_ref.to_string());
            self.stats.hits += 1;
            log::debug!("cache hit: {source_ref}");
        } else {
            self.stats.misses += 1;
            log::debug!("cache miss: {source_ref}");
            let series = self
                .reader
                .read(source_ref)
                .map_err(|e| LfprocError::reader(source_ref, e))?;
            self.total_bytes += series.payload_bytes();
            self.recency.insert(tick, source_ref.to_string());
            self.entries
                .insert(source_ref.to_string(), Slot { series, tick });
            self.evict()?;
        }

        self.entries
            .get(source_ref)
            .map(|slot| &slot.series)
            .ok_or_else(|| {
                LfprocError::CacheInvariant(format!("'{source_ref}' missing right after load"))
            })
    }

    fn bump_tick(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    fn evict(&mut self) -> Result<()> {
        while self.total_bytes > self.limit_bytes && self.entries.len() > 1 {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            if let Some(slot) = self.entries.remove(&oldest) {
                self.total_bytes -= slot.series.payload_bytes();
                self.stats.evictions += 1;
                log::debug!("cache evict: {oldest}");
            }
        }

        debug_assert_eq!(
            self.total_bytes,
            self.entries
                .values()
                .map(|s| s.series.payload_bytes())
                .sum::<usize>()
        );
        if self.recency.len() != self.entries.len()
            || (self.total_bytes > self.limit_bytes && self.entries.len() > 1)
        {
            return Err(LfprocError::CacheInvariant(format!(
                "{} entries, {} recency slots, {} of {} bytes",
                self.entries.len(),
                self.recency.len(),
                self.total_bytes,
                self.limit_bytes
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SegmentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentCache")
            .field("entries", &self.entries.len())
            .field("total_bytes", &self.total_bytes)
            .field("limit_bytes", &self.limit_bytes)
            .field("stats", &self.stats)
            .finish()
    }
}
