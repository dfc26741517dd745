// LFProc CLI - Subcommands
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Subcommand implementations.
//!
//! Results go to stdout; progress goes through tracing.

use std::path::{Path, PathBuf};

use lfproc::time::secs_to_micros;
use lfproc::{
    gather_results, NativeCodec, NativeFileReader, RunSummary, TimeCatalog, Timestamp,
    WindowedProcessor,
};
use lfproc_testdata::{ArchiveConfig, SyntheticArchive};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::CliError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug)]
pub struct SynthArgs {
    pub out: PathBuf,
    pub files: usize,
    pub channels: usize,
    pub file_secs: f64,
    pub sample_interval_us: i64,
    pub missing: Vec<usize>,
    pub seed: u64,
}

#[derive(Debug)]
pub struct ProcessArgs {
    pub catalog: PathBuf,
    pub root: Option<PathBuf>,
    pub out: PathBuf,
    pub range: Option<(String, String)>,
    pub all_segments: bool,
    pub config: Option<PathBuf>,
    pub delete_existing: bool,
    pub cache_gb: Option<f64>,
    pub json: bool,
}

/// One processed range, as printed
#[derive(Debug, Serialize)]
struct RunReport {
    start: Option<String>,
    end: Option<String>,
    grid_len: usize,
    patch_size: usize,
    windows: usize,
    samples: usize,
    cache_hits: u64,
    cache_misses: u64,
    cache_evictions: u64,
}

impl From<&RunSummary> for RunReport {
    fn from(s: &RunSummary) -> Self {
        let covered = s.covered();
        Self {
            start: covered.map(|r| r.start.to_string()),
            end: covered.map(|r| r.end.to_string()),
            grid_len: s.grid_len,
            patch_size: s.patch_size,
            windows: s.windows.len(),
            samples: s.total_samples(),
            cache_hits: s.cache.hits,
            cache_misses: s.cache.misses,
            cache_evictions: s.cache.evictions,
        }
    }
}

/// Gathered output, as printed
#[derive(Debug, Serialize)]
struct GatherReport {
    start: String,
    end: String,
    samples: usize,
    channels: usize,
    sample_interval_us: i64,
}

pub fn synth(args: &SynthArgs) -> Result<()> {
    let config = ArchiveConfig::new()
        .with_sample_interval_us(args.sample_interval_us)
        .with_file_duration_secs(args.file_secs)
        .with_num_files(args.files)
        .with_channels(args.channels)
        .with_missing_files(args.missing.clone())
        .with_seed(args.seed);

    let archive = SyntheticArchive::new(config)?;
    let manifest = archive.write(&args.out)?;
    info!(
        "Wrote {} files to {} ({} .. {})",
        manifest.files,
        args.out.display(),
        manifest.time_min,
        manifest.time_max
    );
    println!("{}", manifest.catalog.display());
    Ok(())
}

pub fn gaps(catalog_path: &Path, tolerance_secs: Option<f64>) -> Result<()> {
    let catalog = TimeCatalog::from_csv_path(catalog_path)?;
    let tolerance = tolerance_secs.map(secs_to_micros);
    let segments = catalog.contiguous_segments(tolerance);
    info!(
        "{} files form {} contiguous segments",
        catalog.len(),
        segments.len()
    );
    for segment in &segments {
        println!("{}\t{}", segment.start, segment.end);
    }
    Ok(())
}

pub fn process(args: &ProcessArgs) -> Result<()> {
    let catalog = TimeCatalog::from_csv_path(&args.catalog)?;
    let root = match &args.root {
        Some(root) => root.clone(),
        None => args
            .catalog
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    info!("{} catalog entries, sources under {}", catalog.len(), root.display());

    let mut processor =
        WindowedProcessor::new(catalog, Box::new(NativeFileReader::with_root(root)));

    if let Some(path) = &args.config {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.display().to_string(),
            source,
        })?;
        for key in processor.update_parameters_json(&text)? {
            warn!("Ignoring unknown parameter '{}' in {}", key, path.display());
        }
    }
    if let Some(gb) = args.cache_gb {
        processor.set_cache_limit_gb(gb);
    }
    processor.set_output_folder(&args.out, args.delete_existing)?;

    let summaries = match (&args.range, args.all_segments) {
        (Some((start, end)), false) => {
            let bg = Timestamp::parse(start)?;
            let ed = Timestamp::parse(end)?;
            vec![processor.process_time_range(bg, ed)?]
        }
        (None, true) => processor.process_contiguous_segments(None)?,
        _ => {
            return Err(CliError::Usage(
                "give either --start/--end or --all-segments".to_string(),
            ))
        }
    };

    let reports: Vec<RunReport> = summaries.iter().map(RunReport::from).collect();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for r in &reports {
            println!(
                "{}\t{}\t{} windows\t{} samples",
                r.start.as_deref().unwrap_or("-"),
                r.end.as_deref().unwrap_or("-"),
                r.windows,
                r.samples
            );
        }
    }
    Ok(())
}

pub fn gather(dir: &Path, json: bool) -> Result<()> {
    let series = gather_results(dir, &NativeCodec)?;
    let report = GatherReport {
        start: series.time_min().to_string(),
        end: series.time_max().to_string(),
        samples: series.n_samples(),
        channels: series.n_channels(),
        sample_interval_us: series.sample_interval_micros(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} .. {}\t{} samples x {} channels\tdt {} us",
            report.start, report.end, report.samples, report.channels, report.sample_interval_us
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synth_into(dir: &Path, missing: Vec<usize>) -> PathBuf {
        let args = SynthArgs {
            out: dir.to_path_buf(),
            files: 6,
            channels: 2,
            file_secs: 30.0,
            sample_interval_us: 100_000,
            missing,
            seed: 3,
        };
        synth(&args).unwrap();
        dir.join(lfproc_testdata::CATALOG_FILE)
    }

    fn process_args(catalog: PathBuf, out: PathBuf) -> ProcessArgs {
        ProcessArgs {
            catalog,
            root: None,
            out,
            range: None,
            all_segments: true,
            config: None,
            delete_existing: true,
            cache_gb: None,
            json: false,
        }
    }

    #[test]
    fn test_synth_process_gather() {
        let archive = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let catalog = synth_into(archive.path(), vec![]);

        process(&process_args(catalog, out.path().join("lf"))).unwrap();
        let series = gather_results(&out.path().join("lf"), &NativeCodec).unwrap();
        assert_eq!(series.n_channels(), 2);
        assert_eq!(series.sample_interval_micros(), 1_000_000);
    }

    #[test]
    fn test_process_reads_config_file() {
        let archive = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let catalog = synth_into(archive.path(), vec![]);
        let config = archive.path().join("params.json");
        std::fs::write(&config, r#"{"output_sample_interval": 2.0, "process_patch_size": 40}"#)
            .unwrap();

        let mut args = process_args(catalog, out.path().join("lf"));
        args.config = Some(config);
        process(&args).unwrap();
        let series = gather_results(&out.path().join("lf"), &NativeCodec).unwrap();
        assert_eq!(series.sample_interval_micros(), 2_000_000);
    }

    #[test]
    fn test_process_needs_range_or_segments() {
        let archive = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let catalog = synth_into(archive.path(), vec![]);

        let mut args = process_args(catalog, out.path().join("lf"));
        args.all_segments = false;
        assert!(matches!(process(&args), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_gaps_on_missing_catalog() {
        assert!(gaps(Path::new("/nonexistent/catalog.csv"), None).is_err());
    }
}
