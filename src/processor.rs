// LFProc - Low-frequency windowed processing for sensor archives
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Windowed low-pass processing
//!
//! Streams an arbitrarily long span of source data through a low-pass filter
//! and onto a coarser output grid, one chunk at a time.
//!
//! # Chunk layout
//!
//! ```text
//!  grid:   0        eb             patch-eb  patch
//!          |--------|-----------------|--------|
//!          | buffer |     emitted     | buffer |
//!
//!  next:                     data_end-2eb   data_end
//!                              |--------|--------|-----------------|--------|
//!                              retained tail      emitted ...
//! ```
//!
//! Consecutive raw reads overlap by `2 * edge_buff_size` grid steps, and each
//! filtered chunk is trimmed by `edge_buff_size` on both sides. Every emitted
//! sample therefore had filter context on both sides, and successive windows
//! meet without duplicate or missing grid points.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::assembler;
use crate::cache::CacheStats;
use crate::catalog::TimeCatalog;
use crate::config::ProcessorConfig;
use crate::error::{ConfigError, DataGapError, LfprocError, Result};
use crate::format::NativeCodec;
use crate::output::{OutputDir, WindowCodec};
use crate::reader::SegmentReader;
use crate::series::TimeSeries;
use crate::store::SegmentStore;
use crate::time::{TimeGrid, TimeRange, Timestamp};

/// Stage of a processing run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    FirstWindow,
    SteadyState,
    FinalPartial,
    Done,
}

/// One written window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowRecord {
    pub path: PathBuf,
    pub time_min: Timestamp,
    pub time_max: Timestamp,
    pub samples: usize,
}

/// Outcome of [`WindowedProcessor::process_time_range`]
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Points in the output grid
    pub grid_len: usize,
    /// Patch size actually used (shrunk for short ranges)
    pub patch_size: usize,
    /// Windows in write order
    pub windows: Vec<WindowRecord>,
    /// Cache counters at the end of the run
    pub cache: CacheStats,
}

impl RunSummary {
    /// Output samples written across all windows
    pub fn total_samples(&self) -> usize {
        self.windows.iter().map(|w| w.samples).sum()
    }

    /// First to last emitted timestamp
    pub fn covered(&self) -> Option<TimeRange> {
        let first = self.windows.first()?;
        let last = self.windows.last()?;
        Some(TimeRange::new(first.time_min, last.time_max))
    }
}

/// Low-pass and downsample an archive into fixed-size output windows
pub struct WindowedProcessor {
    store: SegmentStore,
    config: ProcessorConfig,
    output: Option<OutputDir>,
    codec: Box<dyn WindowCodec>,
}

impl WindowedProcessor {
    /// Processor writing native `.lfd` windows with default parameters
    pub fn new(catalog: TimeCatalog, reader: Box<dyn SegmentReader>) -> Self {
        Self {
            store: SegmentStore::new(catalog, reader),
            config: ProcessorConfig::default(),
            output: None,
            codec: Box::new(NativeCodec),
        }
    }

    /// Replace the window writer
    pub fn with_codec(mut self, codec: Box<dyn WindowCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Replace all parameters at once
    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    /// Directory receiving the windows, created if missing.
    ///
    /// With `delete_existing`, a previous directory is removed first.
    pub fn set_output_folder(
        &mut self,
        path: impl AsRef<Path>,
        delete_existing: bool,
    ) -> Result<()> {
        self.output = Some(OutputDir::prepare(path.as_ref(), delete_existing)?);
        Ok(())
    }

    pub fn output_folder(&self) -> Option<&Path> {
        self.output.as_ref().map(OutputDir::path)
    }

    /// Update parameters by name; unknown names are returned
    pub fn update_parameters<I, K>(&mut self, pairs: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        Ok(self.config.update(pairs)?)
    }

    /// Update parameters from a JSON object
    pub fn update_parameters_json(&mut self, text: &str) -> Result<Vec<String>> {
        Ok(self.config.update_from_json(text)?)
    }

    pub fn parameters(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Cache budget in gigabytes
    pub fn set_cache_limit_gb(&mut self, gb: f64) {
        self.store.set_cache_limit_gb(gb);
    }

    pub fn store(&self) -> &SegmentStore {
        &self.store
    }

    /// Process `[bgtime, edtime)` and write one file per chunk.
    ///
    /// Windows already written stay on disk if a later chunk fails.
    pub fn process_time_range(
        &mut self,
        bgtime: Timestamp,
        edtime: Timestamp,
    ) -> Result<RunSummary> {
        let output = self.output.as_ref().ok_or(ConfigError::OutputDirUnset)?;
        self.config.validate()?;

        let mut run = Run {
            store: &mut self.store,
            codec: self.codec.as_ref(),
            output,
            config: &self.config,
            grid: TimeGrid::new(bgtime, edtime, self.config.output_interval_micros()),
            patch: self.config.process_patch_size,
            edge: self.config.edge_buff_size,
            data_end: 0,
            retained: None,
            windows: Vec::new(),
        };

        let mut phase = Phase::Init;
        while phase != Phase::Done {
            phase = run.advance(phase, bgtime, edtime)?;
        }

        let summary = RunSummary {
            grid_len: run.grid.len(),
            patch_size: run.patch,
            windows: run.windows,
            cache: self.store.cache_stats(),
        };
        log::info!(
            "{} window(s), {} samples written for {bgtime} .. {edtime}",
            summary.windows.len(),
            summary.total_samples()
        );
        Ok(summary)
    }

    /// Run [`process_time_range`](Self::process_time_range) over every span of
    /// continuous catalog coverage.
    ///
    /// Spans too short to yield a window are skipped with a warning.
    pub fn process_contiguous_segments(
        &mut self,
        gap_tolerance_us: Option<i64>,
    ) -> Result<Vec<RunSummary>> {
        let segments = self.store.catalog().contiguous_segments(gap_tolerance_us);
        let mut summaries = Vec::with_capacity(segments.len());
        for seg in segments {
            match self.process_time_range(seg.start, seg.end) {
                Ok(summary) => summaries.push(summary),
                Err(LfprocError::Config(ConfigError::RangeTooShort { .. })) => {
                    log::warn!("coverage {seg} too short for one window, skipped");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(summaries)
    }
}

impl std::fmt::Debug for WindowedProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowedProcessor")
            .field("store", &self.store)
            .field("config", &self.config)
            .field("output", &self.output)
            .field("extension", &self.codec.extension())
            .finish()
    }
}

/// State of one processing run
struct Run<'a> {
    store: &'a mut SegmentStore,
    codec: &'a dyn WindowCodec,
    output: &'a OutputDir,
    config: &'a ProcessorConfig,
    grid: TimeGrid,
    patch: usize,
    edge: usize,
    data_end: usize,
    retained: Option<TimeSeries>,
    windows: Vec<WindowRecord>,
}

impl Run<'_> {
    fn advance(&mut self, phase: Phase, bgtime: Timestamp, edtime: Timestamp) -> Result<Phase> {
        let next = match phase {
            Phase::Init => {
                let len = self.grid.len();
                if len < self.patch + 1 {
                    self.patch = len.saturating_sub(1);
                    log::debug!("grid of {len} points, patch shrunk to {}", self.patch);
                }
                if self.patch <= 2 * self.edge {
                    return Err(ConfigError::RangeTooShort {
                        start: bgtime,
                        end: edtime,
                        grid_points: len,
                        needed: 2 * self.edge + 1,
                    }
                    .into());
                }
                Phase::FirstWindow
            }
            Phase::FirstWindow => {
                let (from, to) = (self.grid.at(0), self.grid.at(self.patch));
                let pieces = self.store.fetch(from, to)?;
                let merged = self.assemble(pieces, from, to)?;
                self.emit(&merged, self.edge, self.patch - self.edge)?;
                self.retained = Some(merged);
                self.data_end = self.patch;
                Phase::SteadyState
            }
            Phase::SteadyState => {
                let step = self.patch - 2 * self.edge;
                let new_data_end = self.data_end + step;
                if new_data_end < self.grid.len() {
                    self.extend(new_data_end, new_data_end - self.edge)?;
                    Phase::SteadyState
                } else {
                    Phase::FinalPartial
                }
            }
            Phase::FinalPartial => {
                let len = self.grid.len();
                if len - self.data_end > 1 {
                    self.extend(len - 1, len)?;
                }
                Phase::Done
            }
            Phase::Done => Phase::Done,
        };
        Ok(next)
    }

    /// Read up to `new_data_end`, join it to the retained tail and emit
    /// grid points `data_end - edge .. emit_to`
    fn extend(&mut self, new_data_end: usize, emit_to: usize) -> Result<()> {
        let to = self.grid.at(new_data_end);
        let mut pieces = self.store.fetch(self.grid.at(self.data_end), to)?;
        let keep_from = self.grid.at(self.data_end - 2 * self.edge);
        if let Some(tail) = self
            .retained
            .take()
            .and_then(|r| r.select_time(Some(keep_from), None))
        {
            pieces.push(tail);
        }
        let merged = self.assemble(pieces, keep_from, to)?;
        self.emit(&merged, self.data_end - self.edge, emit_to)?;
        self.retained = Some(merged);
        self.data_end = new_data_end;
        Ok(())
    }

    /// Merge `pieces` and check that the result spans `[from, to]`.
    ///
    /// Ends may fall short by one raw sample interval plus the gap tolerance,
    /// since raw samples rarely land exactly on grid points.
    fn assemble(
        &self,
        pieces: Vec<TimeSeries>,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<TimeSeries> {
        let tolerance_us = self.config.gap_tolerance_micros();
        let mut segments: Vec<TimeRange> = pieces.iter().map(TimeSeries::span).collect();
        segments.sort_by_key(|r| r.start);

        let merged = assembler::merge(pieces, tolerance_us)?;
        let slack = merged.sample_interval_micros() + tolerance_us;
        if merged.time_min().micros_since(from) > slack
            || to.micros_since(merged.time_max()) > slack
        {
            log::debug!("{} does not reach {from} .. {to}", merged.span());
            return Err(DataGapError {
                segments,
                groups: vec![merged.span()],
                tolerance_us,
            }
            .into());
        }
        Ok(merged)
    }

    /// Filter `raw`, resample it onto grid points `from..to` and write it
    fn emit(&mut self, raw: &TimeSeries, from: usize, to: usize) -> Result<()> {
        let targets = self.grid.slice(from, to);
        let window = raw
            .low_pass(self.config.cutoff_hz())?
            .resample(&targets, self.config.resample_method)?
            .with_sample_interval(self.grid.step_micros());

        let path = self.output.window_path(&window, self.codec.extension());
        self.codec.write(&window, &path)?;
        log::debug!(
            "window {} .. {} ({} samples) -> {}",
            window.time_min(),
            window.time_max(),
            window.n_samples(),
            path.display()
        );
        self.windows.push(WindowRecord {
            path,
            time_min: window.time_min(),
            time_max: window.time_max(),
            samples: window.n_samples(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::reader::FnReader;
    use crate::time::MICROS_PER_SEC;
    use serde_json::json;

    /// One 60 s file, 10 samples per second
    fn single_file_processor() -> WindowedProcessor {
        let start = Timestamp::from_secs(0);
        let catalog = TimeCatalog::new(vec![CatalogEntry::new(
            "only",
            start,
            Timestamp::from_micros(59_900_000),
        )])
        .unwrap();
        let reader = FnReader::new(move |_: &str| {
            let data = (0..600).map(|i| (i as f32 * 0.01).sin()).collect();
            Ok(TimeSeries::from_regular(start, MICROS_PER_SEC / 10, 1, data)?)
        });
        WindowedProcessor::new(catalog, Box::new(reader))
    }

    #[test]
    fn test_output_folder_required() {
        let mut proc = single_file_processor();
        let err = proc
            .process_time_range(Timestamp::from_secs(0), Timestamp::from_secs(30))
            .unwrap_err();
        assert!(matches!(err, LfprocError::Config(ConfigError::OutputDirUnset)));
    }

    #[test]
    fn test_windows_follow_grid() {
        let dir = tempfile::tempdir().unwrap();
        let mut proc = single_file_processor();
        proc.set_output_folder(dir.path(), false).unwrap();
        proc.update_parameters([
            ("process_patch_size", json!(20)),
            ("edge_buff_size", json!(2)),
        ])
        .unwrap();

        let summary = proc
            .process_time_range(Timestamp::from_secs(0), Timestamp::from_secs(50))
            .unwrap();
        assert_eq!(summary.grid_len, 50);
        assert_eq!(summary.patch_size, 20);
        assert_eq!(summary.windows[0].time_min, Timestamp::from_secs(2));
        assert_eq!(summary.windows[0].time_max, Timestamp::from_secs(17));
        assert_eq!(summary.windows[1].time_min, Timestamp::from_secs(18));
        assert_eq!(summary.covered().unwrap().end, Timestamp::from_secs(49));
        assert_eq!(summary.total_samples(), 48);
        for w in &summary.windows {
            assert!(w.path.exists());
        }
    }

    #[test]
    fn test_too_short_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut proc = single_file_processor();
        proc.set_output_folder(dir.path(), false).unwrap();
        let err = proc
            .process_time_range(Timestamp::from_secs(0), Timestamp::from_secs(15))
            .unwrap_err();
        assert!(matches!(
            err,
            LfprocError::Config(ConfigError::RangeTooShort { grid_points: 15, needed: 21, .. })
        ));
    }

    #[test]
    fn test_missing_coverage_is_data_gap() {
        let dir = tempfile::tempdir().unwrap();
        let mut proc = single_file_processor();
        proc.set_output_folder(dir.path(), false).unwrap();
        let err = proc
            .process_time_range(Timestamp::from_secs(1000), Timestamp::from_secs(1200))
            .unwrap_err();
        assert!(matches!(err, LfprocError::DataGap(_)));
    }

    #[test]
    fn test_unknown_parameter_reported() {
        let mut proc = single_file_processor();
        let unknown = proc
            .update_parameters_json(r#"{"edge_buff_size": 3, "verbose": true}"#)
            .unwrap();
        assert_eq!(unknown, vec!["verbose".to_string()]);
        assert_eq!(proc.parameters().edge_buff_size, 3);
    }
}
