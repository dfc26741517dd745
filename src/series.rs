// LFProc - Low-frequency windowed processing for sensor archives
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Multi-channel time series
//!
//! A [`TimeSeries`] holds samples on a strictly increasing time axis and a
//! spatial (channel) axis. Values are stored time-major: the row for one
//! timestamp is contiguous, so selecting and appending time spans is a slice copy.

use serde::{Deserialize, Serialize};

use crate::error::SeriesError;
use crate::filter::LowPass;
use crate::time::{TimeRange, Timestamp, MICROS_PER_SEC};

/// How samples are placed onto an explicit time grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMethod {
    /// Take the sample closest in time (earlier sample on ties)
    #[default]
    Nearest,
    /// Linear interpolation between the bracketing samples
    Linear,
}

/// Descriptive metadata carried with every series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesAttrs {
    /// First timestamp
    pub time_min: Timestamp,
    /// Last timestamp
    pub time_max: Timestamp,
    /// Nominal sample interval in microseconds
    pub d_time_us: i64,
    /// Spacing of the spatial axis
    pub d_distance: f64,
}

/// Samples indexed by time and channel
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    times: Vec<Timestamp>,
    distance: Vec<f64>,
    data: Vec<f32>,
    attrs: SeriesAttrs,
}

impl TimeSeries {
    /// Create a series from explicit axes.
    ///
    /// `data` is time-major (`data[t * channels + ch]`). The time axis must be
    /// non-empty and strictly increasing.
    pub fn new(
        times: Vec<Timestamp>,
        distance: Vec<f64>,
        data: Vec<f32>,
        d_time_us: i64,
    ) -> Result<Self, SeriesError> {
        let (Some(&time_min), Some(&time_max)) = (times.first(), times.last()) else {
            return Err(SeriesError::Empty);
        };
        if distance.is_empty() {
            return Err(SeriesError::Empty);
        }
        let expected = times.len() * distance.len();
        if data.len() != expected {
            return Err(SeriesError::ShapeMismatch {
                samples: times.len(),
                channels: distance.len(),
                expected,
                actual: data.len(),
            });
        }
        if let Some(index) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SeriesError::NonMonotonicTime { index: index + 1 });
        }

        let d_distance = if distance.len() > 1 {
            distance[1] - distance[0]
        } else {
            1.0
        };

        Ok(Self {
            times,
            distance,
            data,
            attrs: SeriesAttrs {
                time_min,
                time_max,
                d_time_us,
                d_distance,
            },
        })
    }

    /// Create a regularly sampled series with channels at distances `0, 1, 2, ...`
    pub fn from_regular(
        start: Timestamp,
        d_time_us: i64,
        channels: usize,
        data: Vec<f32>,
    ) -> Result<Self, SeriesError> {
        if channels == 0 {
            return Err(SeriesError::Empty);
        }
        let samples = data.len() / channels;
        let times = (0..samples)
            .map(|i| start.offset(d_time_us * i as i64))
            .collect();
        let distance = (0..channels).map(|c| c as f64).collect();
        Self::new(times, distance, data, d_time_us)
    }

    pub fn times(&self) -> &[Timestamp] {
        &self.times
    }

    pub fn distance(&self) -> &[f64] {
        &self.distance
    }

    /// Raw values, time-major
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn attrs(&self) -> &SeriesAttrs {
        &self.attrs
    }

    pub fn n_samples(&self) -> usize {
        self.times.len()
    }

    pub fn n_channels(&self) -> usize {
        self.distance.len()
    }

    pub fn time_min(&self) -> Timestamp {
        self.attrs.time_min
    }

    pub fn time_max(&self) -> Timestamp {
        self.attrs.time_max
    }

    /// Covered span `[time_min, time_max]`
    pub fn span(&self) -> TimeRange {
        TimeRange::new(self.attrs.time_min, self.attrs.time_max)
    }

    /// Nominal sample interval in microseconds
    pub fn sample_interval_micros(&self) -> i64 {
        self.attrs.d_time_us
    }

    /// All channel values at time index `index`
    pub fn row(&self, index: usize) -> &[f32] {
        let c = self.n_channels();
        &self.data[index * c..(index + 1) * c]
    }

    /// One channel as a contiguous vector
    pub fn channel(&self, ch: usize) -> Vec<f32> {
        self.data
            .chunks_exact(self.n_channels())
            .map(|row| row[ch])
            .collect()
    }

    /// Memory held by the sample payload
    pub fn payload_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    /// Replace the nominal sample interval
    pub fn with_sample_interval(mut self, d_time_us: i64) -> Self {
        self.attrs.d_time_us = d_time_us;
        self
    }

    /// Replace the spatial spacing
    pub fn with_distance_interval(mut self, d_distance: f64) -> Self {
        self.attrs.d_distance = d_distance;
        self
    }

    /// Samples within `[start, end]` (either bound open when `None`).
    ///
    /// Returns `None` if no sample falls inside.
    pub fn select_time(&self, start: Option<Timestamp>, end: Option<Timestamp>) -> Option<Self> {
        let lo = start.map_or(0, |s| self.times.partition_point(|t| *t < s));
        let hi = end.map_or(self.times.len(), |e| self.times.partition_point(|t| *t <= e));
        if lo >= hi {
            return None;
        }
        if lo == 0 && hi == self.times.len() {
            return Some(self.clone());
        }

        let c = self.n_channels();
        let times = self.times[lo..hi].to_vec();
        Some(Self {
            attrs: SeriesAttrs {
                time_min: times[0],
                time_max: times[times.len() - 1],
                ..self.attrs
            },
            times,
            distance: self.distance.clone(),
            data: self.data[lo * c..hi * c].to_vec(),
        })
    }

    /// Zero-phase Butterworth low-pass on every channel
    pub fn low_pass(&self, cutoff_hz: f64) -> Result<Self, SeriesError> {
        if self.attrs.d_time_us <= 0 {
            return Err(SeriesError::InvalidFilter(format!(
                "series has no usable sample interval ({}us)",
                self.attrs.d_time_us
            )));
        }
        let sample_rate_hz = MICROS_PER_SEC as f64 / self.attrs.d_time_us as f64;
        let Some(filter) = LowPass::butterworth(cutoff_hz, sample_rate_hz)? else {
            log::debug!(
                "cutoff {:.4} Hz at or above Nyquist of {:.4} Hz, skipping filter",
                cutoff_hz,
                sample_rate_hz / 2.0
            );
            return Ok(self.clone());
        };

        let c = self.n_channels();
        let mut out = self.clone();
        let mut buf = vec![0.0f64; self.n_samples()];
        for ch in 0..c {
            for (slot, row) in buf.iter_mut().zip(self.data.chunks_exact(c)) {
                *slot = row[ch] as f64;
            }
            filter.apply(&mut buf);
            for (row, v) in out.data.chunks_exact_mut(c).zip(&buf) {
                row[ch] = *v as f32;
            }
        }
        Ok(out)
    }

    /// Values at the given timestamps.
    ///
    /// Targets outside the covered span take the nearest edge sample. The result
    /// keeps this series' sample interval; callers tag the new one with
    /// [`with_sample_interval`](Self::with_sample_interval).
    pub fn resample(
        &self,
        targets: &[Timestamp],
        method: ResampleMethod,
    ) -> Result<Self, SeriesError> {
        if targets.is_empty() {
            return Err(SeriesError::EmptyGrid);
        }
        let c = self.n_channels();
        let last = self.times.len() - 1;
        let mut data = Vec::with_capacity(targets.len() * c);

        for &t in targets {
            let idx = self.times.partition_point(|s| *s < t);
            if idx == 0 {
                data.extend_from_slice(self.row(0));
                continue;
            }
            if idx > last {
                data.extend_from_slice(self.row(last));
                continue;
            }
            let (left, right) = (self.times[idx - 1], self.times[idx]);
            match method {
                ResampleMethod::Nearest => {
                    let pick = if t.micros_since(left) <= right.micros_since(t) {
                        idx - 1
                    } else {
                        idx
                    };
                    data.extend_from_slice(self.row(pick));
                }
                ResampleMethod::Linear => {
                    let w = t.micros_since(left) as f64 / right.micros_since(left) as f64;
                    let (a, b) = (self.row(idx - 1), self.row(idx));
                    data.extend(
                        a.iter()
                            .zip(b)
                            .map(|(x, y)| (*x as f64 + (*y as f64 - *x as f64) * w) as f32),
                    );
                }
            }
        }

        let out = Self::new(
            targets.to_vec(),
            self.distance.clone(),
            data,
            self.attrs.d_time_us,
        )?;
        Ok(out.with_distance_interval(self.attrs.d_distance))
    }

    /// Append the samples of `other` that lie strictly after this series' end.
    ///
    /// Returns how many samples were appended. Samples of `other` at or before
    /// `time_max` are dropped, so on overlap the existing samples win.
    pub(crate) fn append_after(&mut self, other: &TimeSeries) -> Result<usize, SeriesError> {
        if other.n_channels() != self.n_channels() {
            return Err(SeriesError::ChannelMismatch {
                expected: self.n_channels(),
                actual: other.n_channels(),
            });
        }
        let from = other.times.partition_point(|t| *t <= self.attrs.time_max);
        let added = other.times.len() - from;
        if added == 0 {
            return Ok(0);
        }
        let c = self.n_channels();
        self.times.extend_from_slice(&other.times[from..]);
        self.data.extend_from_slice(&other.data[from * c..]);
        self.attrs.time_max = other.attrs.time_max;
        Ok(added)
    }
}
