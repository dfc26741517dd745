// LFProc CLI - Command-line front end for LFProc
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # LFProc CLI
//!
//! Low-pass and downsample file-fragmented sensor archives from the shell.
//!
//! ## Usage
//!
//! ```bash
//! # Generate a synthetic archive with one missing file
//! lfproc synth --out archive --files 40 --missing 17
//!
//! # Show the contiguous stretches of the archive
//! lfproc gaps --catalog archive/catalog.csv
//!
//! # Process every contiguous stretch into 1 s windows
//! lfproc process --catalog archive/catalog.csv --out lowfreq --all-segments
//!
//! # Stitch the windows back together
//! lfproc gather --dir lowfreq
//! ```

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// LFProc low-frequency processing
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a synthetic archive with a catalog table
    Synth {
        /// Destination directory
        #[arg(short, long)]
        out: PathBuf,

        /// Number of source files
        #[arg(long, default_value = "20")]
        files: usize,

        /// Channels per file
        #[arg(long, default_value = "8")]
        channels: usize,

        /// File length in seconds
        #[arg(long, default_value = "30.0")]
        file_secs: f64,

        /// Raw sample interval in microseconds
        #[arg(long, default_value = "100000")]
        sample_interval_us: i64,

        /// File indices to leave out
        #[arg(long, value_delimiter = ',')]
        missing: Vec<usize>,

        /// Noise seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// List contiguous stretches of a catalog
    Gaps {
        /// Catalog CSV (file,start_time,end_time)
        #[arg(short, long)]
        catalog: PathBuf,

        /// Gap tolerance in seconds (adaptive when omitted)
        #[arg(long)]
        tolerance: Option<f64>,
    },

    /// Low-pass and downsample into output windows
    Process {
        /// Catalog CSV (file,start_time,end_time)
        #[arg(short, long)]
        catalog: PathBuf,

        /// Directory source references are relative to (defaults to the catalog's)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Range start (RFC 3339 or YYYY-MM-DDTHH:MM:SS)
        #[arg(long, requires = "end", conflicts_with = "all_segments")]
        start: Option<String>,

        /// Range end
        #[arg(long, requires = "start")]
        end: Option<String>,

        /// Process every contiguous stretch of the catalog
        #[arg(long)]
        all_segments: bool,

        /// JSON file with processing parameters
        #[arg(long)]
        config: Option<PathBuf>,

        /// Remove the output directory before writing
        #[arg(long)]
        delete_existing: bool,

        /// Cache limit in GB
        #[arg(long)]
        cache_gb: Option<f64>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Stitch output windows into one series
    Gather {
        /// Directory of output windows
        #[arg(short, long)]
        dir: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing; `log` records from the library are forwarded too
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("LFProc v{}", lfproc::VERSION);

    let outcome = match args.command {
        Command::Synth {
            out,
            files,
            channels,
            file_secs,
            sample_interval_us,
            missing,
            seed,
        } => commands::synth(&commands::SynthArgs {
            out,
            files,
            channels,
            file_secs,
            sample_interval_us,
            missing,
            seed,
        }),
        Command::Gaps { catalog, tolerance } => commands::gaps(&catalog, tolerance),
        Command::Process {
            catalog,
            root,
            out,
            start,
            end,
            all_segments,
            config,
            delete_existing,
            cache_gb,
            json,
        } => commands::process(&commands::ProcessArgs {
            catalog,
            root,
            out,
            range: start.zip(end),
            all_segments,
            config,
            delete_existing,
            cache_gb,
            json,
        }),
        Command::Gather { dir, json } => commands::gather(&dir, json),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
