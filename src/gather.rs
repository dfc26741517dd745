// LFProc - Low-frequency windowed processing for sensor archives
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Reassembly of written windows
//!
//! Loads every window in an output directory and joins them back into one
//! series. Windows of a successful run meet exactly, so no gap is tolerated.

use std::path::Path;

use crate::assembler;
use crate::error::Result;
use crate::output::{list_window_files, WindowCodec};
use crate::series::TimeSeries;

/// Merge all windows found in `dir`
pub fn gather_results(dir: &Path, codec: &dyn WindowCodec) -> Result<TimeSeries> {
    let files = list_window_files(dir, codec.extension())?;
    log::info!("gathering {} window(s) from {}", files.len(), dir.display());
    let windows = files
        .iter()
        .map(|path| codec.read(path))
        .collect::<Result<Vec<_>>>()?;
    assembler::merge(windows, 0)
}
