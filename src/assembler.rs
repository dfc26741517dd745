// LFProc - Low-frequency windowed processing for sensor archives
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Segment assembly
//!
//! Joins pieces read from neighbouring source files into one continuous series.
//! Pieces are sorted by start time, then each piece joins the current group when
//!
//! ```text
//!   next.time_min - (group.time_max + d_time) <= tolerance + d_time / 2
//! ```
//!
//! Start times up to half a sample late still join, so microsecond jitter from
//! truncated file headers is not a gap. One whole missing sample is. Where
//! pieces overlap, the earlier piece's samples are kept.

use crate::error::{DataGapError, LfprocError, Result, SeriesError};
use crate::series::TimeSeries;
use crate::time::TimeRange;

/// Result of coalescing a set of segments
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// Everything joined into one series
    Merged(TimeSeries),
    /// Coverage breaks into several groups
    Disjoint {
        /// Spans of the inputs, sorted by start
        segments: Vec<TimeRange>,
        /// Spans of each disjoint group
        groups: Vec<TimeRange>,
    },
}

/// Coalesce `segments` with a gap tolerance in microseconds.
///
/// Returns `Ok(None)` for empty input. Fails only when segments disagree on
/// channel count.
pub fn coalesce(
    mut segments: Vec<TimeSeries>,
    tolerance_us: i64,
) -> std::result::Result<Option<MergeOutcome>, SeriesError> {
    if segments.is_empty() {
        return Ok(None);
    }
    segments.sort_by_key(|s| s.time_min());
    let spans: Vec<TimeRange> = segments.iter().map(TimeSeries::span).collect();

    let mut groups: Vec<TimeSeries> = Vec::new();
    for seg in segments {
        match groups.last_mut() {
            Some(group) if joins(group, &seg, tolerance_us) => {
                group.append_after(&seg)?;
            }
            _ => groups.push(seg),
        }
    }

    if groups.len() == 1 {
        return Ok(groups.pop().map(MergeOutcome::Merged));
    }
    Ok(Some(MergeOutcome::Disjoint {
        segments: spans,
        groups: groups.iter().map(TimeSeries::span).collect(),
    }))
}

fn joins(group: &TimeSeries, next: &TimeSeries, tolerance_us: i64) -> bool {
    let d_time = group.sample_interval_micros();
    let expected_next = group.time_max().offset(d_time);
    next.time_min().micros_since(expected_next) <= tolerance_us + d_time / 2
}

/// Merge `segments` into a single series or fail with the gap layout
pub fn merge(segments: Vec<TimeSeries>, tolerance_us: i64) -> Result<TimeSeries> {
    match coalesce(segments, tolerance_us)? {
        Some(MergeOutcome::Merged(series)) => Ok(series),
        Some(MergeOutcome::Disjoint { segments, groups }) => Err(LfprocError::DataGap(DataGapError {
            segments,
            groups,
            tolerance_us,
        })),
        None => Err(DataGapError::no_coverage(tolerance_us).into()),
    }
}
