// LFProc - Low-frequency windowed processing for sensor archives
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Output directory handling and window file naming
//!
//! Windows are written one file per chunk as
//! `LFDAS_<time_min>_<time_max><ext>`, with both timestamps rendered by
//! [`Timestamp::format_ms`].

use std::path::{Path, PathBuf};

use crate::error::{LfprocError, Result};
use crate::series::TimeSeries;
use crate::time::Timestamp;

/// Prefix of every window file name
pub const WINDOW_PREFIX: &str = "LFDAS_";

/// Strategy for persisting windows
pub trait WindowCodec {
    /// File extension including the leading dot
    fn extension(&self) -> &str;

    /// Write one window to `path`
    fn write(&self, series: &TimeSeries, path: &Path) -> Result<()>;

    /// Read a window previously written by [`write`](Self::write)
    fn read(&self, path: &Path) -> Result<TimeSeries>;
}

/// File name for a window spanning `time_min..time_max`
pub fn window_filename(time_min: Timestamp, time_max: Timestamp, extension: &str) -> String {
    format!(
        "{}{}_{}{}",
        WINDOW_PREFIX,
        time_min.format_ms(),
        time_max.format_ms(),
        extension
    )
}

/// A prepared output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDir {
    path: PathBuf,
}

impl OutputDir {
    /// Make sure `path` exists as a directory.
    ///
    /// With `delete_existing`, any previous directory and its contents are
    /// removed first.
    pub fn prepare(path: impl Into<PathBuf>, delete_existing: bool) -> Result<Self> {
        let path = path.into();
        if delete_existing && path.is_dir() {
            std::fs::remove_dir_all(&path).map_err(|e| LfprocError::io(&path, e))?;
            log::info!("original {} deleted", path.display());
        }
        if !path.is_dir() {
            std::fs::create_dir_all(&path).map_err(|e| LfprocError::io(&path, e))?;
            log::info!("{} created", path.display());
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full path of the file holding `series`
    pub fn window_path(&self, series: &TimeSeries, extension: &str) -> PathBuf {
        self.path
            .join(window_filename(series.time_min(), series.time_max(), extension))
    }
}

/// Window files in `dir` with the given extension, sorted by name
pub fn list_window_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| LfprocError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| LfprocError::io(dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.starts_with(WINDOW_PREFIX) && name.ends_with(extension) && entry.path().is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_filename() {
        let a = Timestamp::parse("2015-01-01T00:00:10").unwrap();
        let b = Timestamp::parse("2015-01-01T00:01:29.5").unwrap();
        assert_eq!(
            window_filename(a, b, ".lfd"),
            "LFDAS_2015-01-01T000010.000_2015-01-01T000129.500.lfd"
        );
    }

    #[test]
    fn test_prepare_creates_and_resets() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("lf");

        let dir = OutputDir::prepare(&out, false).unwrap();
        assert!(dir.path().is_dir());

        std::fs::write(out.join("LFDAS_old.lfd"), b"x").unwrap();
        OutputDir::prepare(&out, false).unwrap();
        assert!(out.join("LFDAS_old.lfd").exists());

        OutputDir::prepare(&out, true).unwrap();
        assert!(out.is_dir());
        assert!(!out.join("LFDAS_old.lfd").exists());
    }

    #[test]
    fn test_list_window_files_filters_and_sorts() {
        let root = tempfile::tempdir().unwrap();
        for name in ["LFDAS_b.lfd", "LFDAS_a.lfd", "notes.txt", "LFDAS_c.p", "other.lfd"] {
            std::fs::write(root.path().join(name), b"").unwrap();
        }
        let files = list_window_files(root.path(), ".lfd").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["LFDAS_a.lfd", "LFDAS_b.lfd"]);
    }
}
