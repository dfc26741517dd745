//! In-memory archive shared by the integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::f64::consts::PI;
use std::rc::Rc;

use lfproc::*;

/// 2015-01-01T00:00:00Z
pub const T0: Timestamp = Timestamp::from_secs(1_420_070_400);

/// Raw sample interval: 10 Hz
pub const RAW_DT_US: i64 = 100_000;

/// Seconds per source file
pub const FILE_SECS: i64 = 30;

pub const CHANNELS: usize = 3;

/// Slow component that survives the low-pass
pub fn slow(t: Timestamp, ch: usize) -> f64 {
    let secs = t.micros_since(T0) as f64 / 1e6;
    (2.0 * PI * 0.02 * secs).sin() + ch as f64
}

/// Raw signal: slow component plus a 3 Hz tone
pub fn raw(t: Timestamp, ch: usize) -> f64 {
    let secs = t.micros_since(T0) as f64 / 1e6;
    slow(t, ch) + 0.5 * (2.0 * PI * 3.0 * secs).sin()
}

pub fn file_name(index: usize) -> String {
    format!("file_{index:04}")
}

fn file_index(source_ref: &str) -> usize {
    source_ref["file_".len()..].parse().unwrap()
}

/// Contents of source file `index`
pub fn file_series(index: usize) -> TimeSeries {
    let start = T0.offset(index as i64 * FILE_SECS * 1_000_000);
    let n = (FILE_SECS * 1_000_000 / RAW_DT_US) as usize;
    let mut data = Vec::with_capacity(n * CHANNELS);
    for i in 0..n {
        let t = start.offset(i as i64 * RAW_DT_US);
        data.extend((0..CHANNELS).map(|ch| raw(t, ch) as f32));
    }
    TimeSeries::from_regular(start, RAW_DT_US, CHANNELS, data).unwrap()
}

/// Catalog of `n_files` consecutive files, leaving out `missing`
pub fn catalog(n_files: usize, missing: &[usize]) -> TimeCatalog {
    let entries = (0..n_files)
        .filter(|i| !missing.contains(i))
        .map(|i| {
            let s = file_series(i);
            CatalogEntry::new(file_name(i), s.time_min(), s.time_max())
        })
        .collect();
    TimeCatalog::new(entries).unwrap()
}

/// Archive of `n_files` files where file `i` starts `shift_us(i)` late
pub fn shifted_archive(
    n_files: usize,
    shift_us: fn(usize) -> i64,
) -> (TimeCatalog, Box<dyn SegmentReader>) {
    let shifted = move |index: usize| {
        let s = file_series(index);
        let start = s.time_min().offset(shift_us(index));
        TimeSeries::from_regular(start, RAW_DT_US, CHANNELS, s.data().to_vec()).unwrap()
    };
    let entries = (0..n_files)
        .map(|i| {
            let s = shifted(i);
            CatalogEntry::new(file_name(i), s.time_min(), s.time_max())
        })
        .collect();
    let reader = FnReader::new(move |source_ref: &str| Ok(shifted(file_index(source_ref))));
    (TimeCatalog::new(entries).unwrap(), Box::new(reader))
}

/// Full reader that records every read and fails on `broken` files
pub fn recording_reader(
    reads: Rc<RefCell<Vec<String>>>,
    broken: HashSet<String>,
) -> Box<dyn SegmentReader> {
    Box::new(FnReader::new(move |source_ref: &str| {
        reads.borrow_mut().push(source_ref.to_string());
        if broken.contains(source_ref) {
            return Err(format!("{source_ref}: truncated trace header").into());
        }
        Ok(file_series(file_index(source_ref)))
    }))
}

pub fn reader() -> Box<dyn SegmentReader> {
    recording_reader(Rc::new(RefCell::new(Vec::new())), HashSet::new())
}

/// Reader that serves only the requested span
pub fn partial_reader() -> Box<dyn SegmentReader> {
    Box::new(RangeFnReader::new(
        |source_ref: &str, span: Option<(Timestamp, Timestamp)>| {
            let full = file_series(file_index(source_ref));
            Ok(match span {
                Some((a, b)) => full.select_time(Some(a), Some(b)),
                None => Some(full),
            })
        },
    ))
}

pub fn secs(s: i64) -> Timestamp {
    T0.offset(s * 1_000_000)
}

/// Timestamps of every window in `dir`, in file order
pub fn written_times(dir: &std::path::Path) -> Vec<Timestamp> {
    list_window_files(dir, ".lfd")
        .unwrap()
        .iter()
        .flat_map(|p| NativeCodec.read(p).unwrap().times().to_vec())
        .collect()
}
