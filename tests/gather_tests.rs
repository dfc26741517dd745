//! Integration tests for reloading written windows

mod common;

use common::*;
use lfproc::*;
use serde_json::json;

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_gather_reconstructs_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut proc = WindowedProcessor::new(catalog(20, &[]), reader());
    proc.set_output_folder(dir.path(), true).unwrap();
    let summary = proc.process_time_range(secs(0), secs(590)).unwrap();

    let merged = gather_results(dir.path(), &NativeCodec).unwrap();
    assert_eq!(merged.time_min(), secs(10));
    assert_eq!(merged.time_max(), summary.windows.last().unwrap().time_max);
    assert_eq!(merged.n_samples(), summary.total_samples());
    assert_eq!(merged.n_channels(), CHANNELS);
    assert!(merged
        .times()
        .windows(2)
        .all(|w| w[1].micros_since(w[0]) == 1_000_000));
}

#[test]
fn test_gather_preserves_values() {
    let dir = tempfile::tempdir().unwrap();
    let mut proc = WindowedProcessor::new(catalog(6, &[]), reader());
    proc.set_output_folder(dir.path(), true).unwrap();
    let summary = proc.process_time_range(secs(0), secs(170)).unwrap();

    let merged = gather_results(dir.path(), &NativeCodec).unwrap();
    let mut offset = 0;
    for record in &summary.windows {
        let window = NativeCodec.read(&record.path).unwrap();
        let c = window.n_channels();
        let slice = &merged.data()[offset * c..(offset + window.n_samples()) * c];
        assert_eq!(slice, window.data());
        offset += window.n_samples();
    }
}

#[test]
fn test_gather_after_rerun_with_delete() {
    let dir = tempfile::tempdir().unwrap();
    let mut proc = WindowedProcessor::new(catalog(10, &[]), reader());
    proc.set_output_folder(dir.path(), true).unwrap();
    proc.process_time_range(secs(0), secs(290)).unwrap();

    // A second, shorter run into a fresh directory replaces the first
    proc.set_output_folder(dir.path(), true).unwrap();
    proc.update_parameters([("edge_buff_size", json!(5))])
        .unwrap();
    proc.process_time_range(secs(0), secs(120)).unwrap();

    let merged = gather_results(dir.path(), &NativeCodec).unwrap();
    assert_eq!(merged.time_min(), secs(5));
    assert_eq!(merged.time_max(), secs(119));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_gather_detects_removed_window() {
    let dir = tempfile::tempdir().unwrap();
    let mut proc = WindowedProcessor::new(catalog(12, &[]), reader());
    proc.set_output_folder(dir.path(), true).unwrap();
    let summary = proc.process_time_range(secs(0), secs(340)).unwrap();
    std::fs::remove_file(&summary.windows[1].path).unwrap();

    let err = gather_results(dir.path(), &NativeCodec).unwrap_err();
    let LfprocError::DataGap(gap) = err else {
        panic!("expected a data gap, got {err}");
    };
    assert_eq!(gap.groups.len(), 2);
    assert_eq!(gap.groups[0].end, summary.windows[0].time_max);
}

#[test]
fn test_gather_rejects_corrupt_window() {
    let dir = tempfile::tempdir().unwrap();
    let mut proc = WindowedProcessor::new(catalog(6, &[]), reader());
    proc.set_output_folder(dir.path(), true).unwrap();
    let summary = proc.process_time_range(secs(0), secs(170)).unwrap();

    let path = &summary.windows[0].path;
    let mut bytes = std::fs::read(path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x55;
    std::fs::write(path, bytes).unwrap();

    let err = gather_results(dir.path(), &NativeCodec).unwrap_err();
    assert!(matches!(
        err,
        LfprocError::Format(FormatError::InvalidChecksum { .. })
    ));
}
