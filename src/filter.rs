//! Zero-phase Butterworth low-pass filter
//!
//! The filter is a cascade of second-order sections run forward and then
//! backward over the signal, so the output has no phase shift. Each pass is
//! started from its steady-state response to the first sample and the signal is
//! padded with an odd reflection, which keeps transients at the ends small.

use crate::error::SeriesError;
use std::f64::consts::PI;

/// Order of the analog prototype
pub const BUTTERWORTH_ORDER: usize = 4;

/// One second-order section, coefficients normalized so that a0 == 1
#[derive(Debug, Clone, Copy, PartialEq)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    /// Low-pass section with quality factor `q`, prewarped at the cutoff
    fn lowpass(cutoff_hz: f64, sample_rate_hz: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate_hz;
        let cw = w0.cos();
        let alpha = w0.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;
        Self {
            b0: (1.0 - cw) / 2.0 / a0,
            b1: (1.0 - cw) / a0,
            b2: (1.0 - cw) / 2.0 / a0,
            a1: -2.0 * cw / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }

    /// Filter state that makes a constant input `x0` pass without transient
    fn steady_state(&self, x0: f64) -> (f64, f64) {
        let y0 = self.dc_gain() * x0;
        (y0 - self.b0 * x0, self.b2 * x0 - self.a2 * y0)
    }

    /// Transposed direct form II, in place
    fn run(&self, signal: &mut [f64]) {
        let Some(&first) = signal.first() else {
            return;
        };
        let (mut z1, mut z2) = self.steady_state(first);
        for x in signal.iter_mut() {
            let input = *x;
            let y = self.b0 * input + z1;
            z1 = self.b1 * input - self.a1 * y + z2;
            z2 = self.b2 * input - self.a2 * y;
            *x = y;
        }
    }
}

/// Butterworth low-pass applied forward and backward
#[derive(Debug, Clone, PartialEq)]
pub struct LowPass {
    sections: Vec<Biquad>,
    cutoff_hz: f64,
}

impl LowPass {
    /// Design the filter.
    ///
    /// Returns `Ok(None)` when the cutoff is at or above the Nyquist frequency:
    /// there is nothing to remove and the signal should pass unchanged.
    pub fn butterworth(cutoff_hz: f64, sample_rate_hz: f64) -> Result<Option<Self>, SeriesError> {
        if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
            return Err(SeriesError::InvalidFilter(format!(
                "sample rate must be positive, got {sample_rate_hz}"
            )));
        }
        if !(cutoff_hz.is_finite() && cutoff_hz > 0.0) {
            return Err(SeriesError::InvalidFilter(format!(
                "cutoff must be positive, got {cutoff_hz}"
            )));
        }
        if cutoff_hz >= sample_rate_hz / 2.0 {
            return Ok(None);
        }

        let sections = (1..=BUTTERWORTH_ORDER / 2)
            .map(|k| {
                let angle = PI * (2 * k - 1) as f64 / (2 * BUTTERWORTH_ORDER) as f64;
                let q = 1.0 / (2.0 * angle.sin());
                Biquad::lowpass(cutoff_hz, sample_rate_hz, q)
            })
            .collect();

        Ok(Some(Self {
            sections,
            cutoff_hz,
        }))
    }

    /// Cutoff frequency in Hz
    pub fn cutoff_hz(&self) -> f64 {
        self.cutoff_hz
    }

    /// Samples of odd reflection added at each end
    fn pad_len(&self, n: usize) -> usize {
        (3 * (2 * self.sections.len() + 1)).min(n.saturating_sub(1))
    }

    /// Filter a signal in place with zero phase
    pub fn apply(&self, signal: &mut [f64]) {
        let n = signal.len();
        if n < 2 {
            return;
        }
        let pad = self.pad_len(n);
        let first = signal[0];
        let last = signal[n - 1];

        let mut ext = Vec::with_capacity(n + 2 * pad);
        ext.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
        ext.extend_from_slice(signal);
        ext.extend((1..=pad).map(|i| 2.0 * last - signal[n - 1 - i]));

        for section in &self.sections {
            section.run(&mut ext);
        }
        ext.reverse();
        for section in &self.sections {
            section.run(&mut ext);
        }
        ext.reverse();

        signal.copy_from_slice(&ext[pad..pad + n]);
    }
}
