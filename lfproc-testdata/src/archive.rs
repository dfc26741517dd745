// LFProc Testdata - Synthetic archives
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Synthetic file-fragmented archives.
//!
//! An archive is a run of equally long source files on one regular sample
//! grid. Files listed as missing are left out of the catalog and cannot be
//! read, which produces coverage gaps.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lfproc::time::micros_to_secs;
use lfproc::{
    encode_series, CatalogEntry, TimeCatalog, TimeRange, TimeSeries, Timestamp,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TestdataError};
use crate::signal::SignalConfig;

/// Catalog table written next to the source files
pub const CATALOG_FILE: &str = "catalog.csv";

/// Manifest written next to the source files
pub const MANIFEST_FILE: &str = "manifest.json";

/// Archive configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Timestamp of the first sample.
    pub start: Timestamp,
    /// Samples per source file.
    pub samples_per_file: usize,
    /// Number of source files.
    pub num_files: usize,
    /// Raw sample interval in microseconds.
    pub sample_interval_us: i64,
    /// Number of channels.
    pub channels: usize,
    /// Spacing of the channel axis.
    pub channel_spacing: f64,
    /// File indices left out of the archive.
    pub missing_files: Vec<usize>,
    /// Random seed for noise.
    pub seed: u64,
    /// Channel signal.
    pub signal: SignalConfig,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            start: Timestamp::from_secs(1_420_070_400), // 2015-01-01 00:00:00 UTC
            samples_per_file: 300,                      // 30 s at 10 Hz
            num_files: 20,
            sample_interval_us: 100_000,
            channels: 8,
            channel_spacing: 1.0,
            missing_files: Vec::new(),
            seed: 42,
            signal: SignalConfig::default(),
        }
    }
}

impl ArchiveConfig {
    /// Create a new archive config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first sample time.
    pub fn with_start(mut self, start: Timestamp) -> Self {
        self.start = start;
        self
    }

    /// Set the file length in seconds (rounded to whole samples).
    pub fn with_file_duration_secs(mut self, secs: f64) -> Self {
        let interval = micros_to_secs(self.sample_interval_us);
        self.samples_per_file = (secs / interval).round().max(1.0) as usize;
        self
    }

    /// Set the raw sample interval.
    pub fn with_sample_interval_us(mut self, interval_us: i64) -> Self {
        self.sample_interval_us = interval_us;
        self
    }

    /// Set number of files.
    pub fn with_num_files(mut self, n: usize) -> Self {
        self.num_files = n;
        self
    }

    /// Set number of channels.
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    /// Leave out the given files.
    pub fn with_missing_files(mut self, files: Vec<usize>) -> Self {
        self.missing_files = files;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Replace the channel signal.
    pub fn with_signal(mut self, signal: SignalConfig) -> Self {
        self.signal = signal;
        self
    }

    /// Length of one file in microseconds.
    pub fn file_duration_us(&self) -> i64 {
        self.samples_per_file as i64 * self.sample_interval_us
    }

    fn validate(&self) -> Result<()> {
        if self.sample_interval_us <= 0 {
            return Err(TestdataError::InvalidConfig(
                "sample_interval_us must be positive".to_string(),
            ));
        }
        if self.samples_per_file < 2 || self.channels == 0 || self.num_files == 0 {
            return Err(TestdataError::InvalidConfig(format!(
                "need at least 2 samples, 1 channel and 1 file (got {}, {}, {})",
                self.samples_per_file, self.channels, self.num_files
            )));
        }
        Ok(())
    }
}

/// Description of a written archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveManifest {
    /// Configuration the archive was generated from.
    pub config: ArchiveConfig,
    /// Files present on disk.
    pub files: usize,
    /// First sample time.
    pub time_min: DateTime<Utc>,
    /// Last sample time.
    pub time_max: DateTime<Utc>,
    /// Catalog table path.
    pub catalog: PathBuf,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
}

/// A synthetic archive, rendered on demand.
#[derive(Debug, Clone)]
pub struct SyntheticArchive {
    config: ArchiveConfig,
}

impl SyntheticArchive {
    pub fn new(config: ArchiveConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Source reference of file `index`
    pub fn file_name(index: usize) -> String {
        format!("synth_{index:05}.lfd")
    }

    /// File index for a source reference, if it names a present file
    pub fn file_index(&self, source_ref: &str) -> Option<usize> {
        let name = Path::new(source_ref).file_name()?.to_str()?;
        let index: usize = name.strip_prefix("synth_")?.strip_suffix(".lfd")?.parse().ok()?;
        (index < self.config.num_files && !self.config.missing_files.contains(&index))
            .then_some(index)
    }

    /// Indices of the files present in the archive
    pub fn present_files(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.config.num_files).filter(|i| !self.config.missing_files.contains(i))
    }

    /// Span of file `index`, first to last sample
    pub fn file_span(&self, index: usize) -> TimeRange {
        let start = self
            .config
            .start
            .offset(index as i64 * self.config.file_duration_us());
        let last_row = self.config.samples_per_file as i64 - 1;
        let end = start.offset(last_row * self.config.sample_interval_us);
        TimeRange::new(start, end)
    }

    /// Rows `first..first + rows` of file `index`
    pub fn render_rows(&self, index: usize, first: usize, rows: usize) -> Result<TimeSeries> {
        let cfg = &self.config;
        let global_row = (index * cfg.samples_per_file + first) as u64;
        let data = cfg.signal.render(
            cfg.seed,
            global_row,
            rows,
            cfg.channels,
            micros_to_secs(cfg.sample_interval_us),
        );
        let start = self.file_span(index).start.offset(first as i64 * cfg.sample_interval_us);
        let series = TimeSeries::from_regular(start, cfg.sample_interval_us, cfg.channels, data)?
            .with_distance_interval(cfg.channel_spacing);
        Ok(series)
    }

    /// Whole file `index`
    pub fn file_series(&self, index: usize) -> Result<TimeSeries> {
        self.render_rows(index, 0, self.config.samples_per_file)
    }

    /// Catalog of the present files
    pub fn catalog(&self) -> Result<TimeCatalog> {
        let entries = self
            .present_files()
            .map(|i| {
                let span = self.file_span(i);
                CatalogEntry::new(Self::file_name(i), span.start, span.end)
            })
            .collect();
        Ok(TimeCatalog::new(entries)?)
    }

    /// Write source files, `catalog.csv` and `manifest.json` into `dir`
    pub fn write(&self, dir: &Path) -> Result<ArchiveManifest> {
        std::fs::create_dir_all(dir)?;
        let mut files = 0;
        for i in self.present_files() {
            let bytes = encode_series(&self.file_series(i)?);
            std::fs::write(dir.join(Self::file_name(i)), bytes)?;
            files += 1;
        }

        let catalog = self.catalog()?;
        let catalog_path = dir.join(CATALOG_FILE);
        catalog.to_csv_path(&catalog_path)?;

        let span = catalog
            .time_span()
            .ok_or_else(|| TestdataError::InvalidConfig("every file is missing".to_string()))?;
        let manifest = ArchiveManifest {
            config: self.config.clone(),
            files,
            time_min: to_datetime(span.start)?,
            time_max: to_datetime(span.end)?,
            catalog: catalog_path,
            generated_at: Utc::now(),
        };
        std::fs::write(dir.join(MANIFEST_FILE), serde_json::to_string_pretty(&manifest)?)?;
        Ok(manifest)
    }
}

fn to_datetime(t: Timestamp) -> Result<DateTime<Utc>> {
    t.to_datetime()
        .ok_or_else(|| TestdataError::InvalidConfig(format!("{t} outside calendar range")))
}
