// LFProc Testdata - Synthetic sensor archive generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # LFProc Testdata
//!
//! Synthetic multi-channel archives for exercising LFProc.
//!
//! - **Signal patterns**: tones, trends, pulses and Gaussian noise
//! - **Fragmented storage**: fixed-length source files plus a catalog table
//! - **Coverage gaps**: selected files can be left out
//! - **On-the-fly reading**: [`SyntheticReader`] renders files without disk I/O
//!
//! ## Quick Start
//!
//! ```rust
//! use lfproc_testdata::{ArchiveConfig, SyntheticArchive, SyntheticReader};
//!
//! let archive = SyntheticArchive::new(
//!     ArchiveConfig::new()
//!         .with_num_files(6)
//!         .with_channels(4)
//!         .with_file_duration_secs(30.0)
//!         .with_seed(7),
//! )?;
//! let catalog = archive.catalog()?;
//! let reader = SyntheticReader::new(archive);
//! assert_eq!(catalog.len(), 6);
//! # Ok::<(), lfproc_testdata::TestdataError>(())
//! ```

pub mod archive;
pub mod error;
pub mod reader;
pub mod signal;

// Re-exports for convenience
pub use archive::{ArchiveConfig, ArchiveManifest, SyntheticArchive, CATALOG_FILE, MANIFEST_FILE};
pub use error::{Result, TestdataError};
pub use reader::SyntheticReader;
pub use signal::{SignalConfig, SignalPattern};
