//! Coverage gap detection over catalog entries
//!
//! Splits a sorted list of source files into spans of continuous coverage. Each
//! span can be processed on its own, since the windowed processor refuses to
//! bridge missing data.

use crate::catalog::CatalogEntry;
use crate::time::{TimeRange, Timestamp};

/// Multiplier applied to the median gap when no tolerance is given
pub const MEDIAN_GAP_FACTOR: f64 = 1.5;

/// Gap before each entry after the first: its `start_time` minus the latest
/// `end_time` among the entries before it
pub fn entry_gaps(entries: &[CatalogEntry]) -> Vec<i64> {
    covered_ends(entries)
        .zip(entries.iter().skip(1))
        .map(|(end, next)| next.start_time.micros_since(end))
        .collect()
}

/// Running maximum of `end_time`, one value per entry
fn covered_ends(entries: &[CatalogEntry]) -> impl Iterator<Item = Timestamp> + '_ {
    entries.iter().scan(None::<Timestamp>, |latest, e| {
        let end = latest.map_or(e.end_time, |t| t.max(e.end_time));
        *latest = Some(end);
        Some(end)
    })
}

/// Median of a list of gaps (mean of the middle pair for even lengths)
pub fn median_gap(gaps: &[i64]) -> Option<f64> {
    if gaps.is_empty() {
        return None;
    }
    let mut sorted = gaps.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[mid] as f64
    })
}

/// Tolerance used when the caller gives none: 1.5x the median gap
pub fn adaptive_tolerance(gaps: &[i64]) -> f64 {
    median_gap(gaps).map_or(0.0, |m| m * MEDIAN_GAP_FACTOR)
}

/// Spans of continuous coverage over entries sorted by start time.
///
/// A gap larger than the tolerance (microseconds) starts a new span. Without an
/// explicit tolerance, [`adaptive_tolerance`] is used. The first entry's start
/// opens the first span. Spans close at the latest end seen so far, so a file
/// that contains shorter ones keeps its full extent.
pub fn contiguous_segments(entries: &[CatalogEntry], tolerance_us: Option<i64>) -> Vec<TimeRange> {
    let Some(first) = entries.first() else {
        return Vec::new();
    };
    let gaps = entry_gaps(entries);
    // Overlapping files produce negative gaps; they never count as missing data.
    let tolerance = tolerance_us
        .map_or_else(|| adaptive_tolerance(&gaps), |t| t as f64)
        .max(0.0);

    let ends: Vec<Timestamp> = covered_ends(entries).collect();
    let mut segments = Vec::new();
    let mut seg_start: Timestamp = first.start_time;
    for (i, gap) in gaps.iter().enumerate() {
        if *gap as f64 > tolerance {
            segments.push(TimeRange::new(seg_start, ends[i]));
            seg_start = entries[i + 1].start_time;
        }
    }
    if let Some(end) = ends.last() {
        segments.push(TimeRange::new(seg_start, *end));
    }

    log::debug!(
        "{} entries form {} contiguous segment(s), tolerance {:.0}us",
        entries.len(),
        segments.len(),
        tolerance
    );
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(spans: &[(i64, i64)]) -> Vec<CatalogEntry> {
        spans
            .iter()
            .enumerate()
            .map(|(i, (s, e))| {
                CatalogEntry::new(
                    format!("f{i}"),
                    Timestamp::from_micros(*s),
                    Timestamp::from_micros(*e),
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_and_single() {
        assert!(contiguous_segments(&[], None).is_empty());
        let one = files(&[(0, 100)]);
        let segs = contiguous_segments(&one, None);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].start, Timestamp::from_micros(0));
        assert_eq!(segs[0].end, Timestamp::from_micros(100));
    }

    #[test]
    fn test_regular_files_form_one_segment() {
        // 30 s files whose last sample is 500 us before the next file starts
        let spans: Vec<_> = (0..10)
            .map(|i| (i * 30_000_000, (i + 1) * 30_000_000 - 500))
            .collect();
        let segs = contiguous_segments(&files(&spans), None);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].end, Timestamp::from_micros(300_000_000 - 500));
    }

    #[test]
    fn test_adaptive_split_on_missing_file() {
        let mut spans: Vec<_> = (0..10)
            .map(|i| (i * 30_000_000, (i + 1) * 30_000_000 - 500))
            .collect();
        spans.remove(4);
        let segs = contiguous_segments(&files(&spans), None);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].end, Timestamp::from_micros(120_000_000 - 500));
        assert_eq!(segs[1].start, Timestamp::from_micros(150_000_000));
    }

    #[test]
    fn test_explicit_tolerance() {
        let entries = files(&[(0, 10), (15, 20), (40, 50)]);
        assert_eq!(contiguous_segments(&entries, Some(5)).len(), 2);
        assert_eq!(contiguous_segments(&entries, Some(20)).len(), 1);
        assert_eq!(contiguous_segments(&entries, Some(0)).len(), 3);
    }

    #[test]
    fn test_median() {
        assert_eq!(median_gap(&[]), None);
        assert_eq!(median_gap(&[5, 1, 3]), Some(3.0));
        assert_eq!(median_gap(&[4, 1, 3, 2]), Some(2.5));
        assert_eq!(adaptive_tolerance(&[2, 2, 2]), 3.0);
    }

    #[test]
    fn test_contained_file_keeps_outer_end() {
        let entries = files(&[(0, 100), (10, 20), (200, 300)]);
        assert_eq!(entry_gaps(&entries), vec![-90, 100]);

        let segs = contiguous_segments(&entries, None);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].start, Timestamp::from_micros(0));
        assert_eq!(segs[0].end, Timestamp::from_micros(100));
        assert_eq!(segs[1].start, Timestamp::from_micros(200));
        assert_eq!(segs[1].end, Timestamp::from_micros(300));
    }

    #[test]
    fn test_contained_last_file() {
        let segs = contiguous_segments(&files(&[(0, 100), (50, 60)]), Some(0));
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].end, Timestamp::from_micros(100));
    }

    #[test]
    fn test_overlapping_files_never_split() {
        let entries = files(&[(0, 100), (50, 150), (140, 300)]);
        let segs = contiguous_segments(&entries, None);
        assert_eq!(segs.len(), 1);
    }
}
