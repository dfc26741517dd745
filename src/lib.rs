//! # LFProc - Low-frequency windowed processing for sensor archives
//!
//! Streams long, file-fragmented, multi-channel recordings (for example
//! distributed acoustic sensing) through a low-pass filter and onto a coarser
//! time grid, using bounded memory.
//!
//! ## Key Features
//!
//! - **Catalog-driven reads**: only source files overlapping a chunk are touched
//! - **Bounded cache**: recently read files are kept under a byte budget (LRU)
//! - **Seamless windows**: overlapping reads and edge trimming give gapless,
//!   duplicate-free output across chunk boundaries
//! - **Gap awareness**: missing coverage is reported, never silently bridged
//!
//! ## Quick Start
//!
//! ```rust
//! use lfproc::{
//!     CatalogEntry, FnReader, TimeCatalog, TimeSeries, Timestamp, WindowedProcessor,
//! };
//!
//! // One 2-minute source file sampled at 10 Hz
//! let t0 = Timestamp::from_secs(1_420_070_400);
//! let entry = CatalogEntry::new("run_0001", t0, t0.offset(119_900_000));
//! let catalog = TimeCatalog::new(vec![entry])?;
//! let reader = FnReader::new(move |_: &str| {
//!     let data = (0..1200).map(|i| (i as f32 * 0.05).sin()).collect();
//!     Ok(TimeSeries::from_regular(t0, 100_000, 1, data)?)
//! });
//!
//! let out = tempfile::tempdir()?;
//! let mut processor = WindowedProcessor::new(catalog, Box::new(reader));
//! processor.set_output_folder(out.path(), true)?;
//!
//! let summary = processor.process_time_range(t0, t0.offset(110_000_000))?;
//! assert_eq!(summary.windows[0].time_min, t0.offset(10_000_000));
//!
//! let merged = lfproc::gather_results(out.path(), &lfproc::NativeCodec)?;
//! assert_eq!(merged.sample_interval_micros(), 1_000_000);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Source file registry and overlap queries
//! - [`gaps`]: Contiguous coverage detection
//! - [`cache`]: Size-bounded LRU of loaded files
//! - [`store`]: Catalog plus cache range fetches
//! - [`assembler`]: Joining pieces into one continuous series
//! - [`processor`]: The windowed low-pass driver
//! - [`gather`]: Reassembly of written windows
//! - [`format`]: Native `.lfd` window file format

// Modules
pub mod assembler;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod gaps;
pub mod gather;
pub mod output;
pub mod processor;
pub mod reader;
pub mod series;
pub mod store;
pub mod time;

// Re-exports for convenient access
pub use assembler::{coalesce, merge, MergeOutcome};
pub use cache::{CacheStats, SegmentCache};
pub use catalog::{CatalogEntry, SourceRef, TimeCatalog};
pub use config::ProcessorConfig;
pub use error::{
    CatalogError, ConfigError, DataGapError, FormatError, LfprocError, ReaderError, Result,
    SeriesError,
};
pub use filter::LowPass;
pub use format::{decode_series, encode_series, NativeCodec};
pub use gaps::contiguous_segments;
pub use gather::gather_results;
pub use output::{list_window_files, window_filename, OutputDir, WindowCodec};
pub use processor::{RunSummary, WindowRecord, WindowedProcessor};
pub use reader::{FnReader, NativeFileReader, RangeFnReader, SegmentReader};
pub use series::{ResampleMethod, SeriesAttrs, TimeSeries};
pub use store::SegmentStore;
pub use time::{TimeGrid, TimeRange, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
