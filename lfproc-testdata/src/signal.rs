// LFProc Testdata - Signal patterns
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Signal patterns for synthetic channels.
//!
//! Every channel carries the same sum of components plus a per-channel offset
//! and Gaussian noise. Noise is drawn from a seeded generator per block of
//! rows, so any row range can be regenerated on its own with identical values.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Rows sharing one noise generator
pub const NOISE_BLOCK_ROWS: u64 = 1024;

/// One deterministic signal component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignalPattern {
    /// Constant value.
    Constant { value: f64 },

    /// Sinusoid.
    ///
    /// `value = amplitude * sin(2*PI*freq_hz*t + phase)`
    Tone {
        amplitude: f64,
        freq_hz: f64,
        phase: f64,
    },

    /// Linear trend, `slope_per_sec * t`.
    Linear { slope_per_sec: f64 },

    /// Gaussian pulse centered at `center_secs`.
    Pulse {
        amplitude: f64,
        center_secs: f64,
        width_secs: f64,
    },
}

impl SignalPattern {
    /// Value at `t` seconds since the archive start
    pub fn value_at(&self, t: f64) -> f64 {
        match self {
            SignalPattern::Constant { value } => *value,
            SignalPattern::Tone {
                amplitude,
                freq_hz,
                phase,
            } => amplitude * (2.0 * PI * freq_hz * t + phase).sin(),
            SignalPattern::Linear { slope_per_sec } => slope_per_sec * t,
            SignalPattern::Pulse {
                amplitude,
                center_secs,
                width_secs,
            } => {
                let z = (t - center_secs) / width_secs;
                amplitude * (-0.5 * z * z).exp()
            }
        }
    }
}

/// Channel signal: components, offsets and noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Components summed on every channel.
    pub components: Vec<SignalPattern>,
    /// Added to channel `c` as `c * channel_offset`.
    pub channel_offset: f64,
    /// Standard deviation of added noise.
    pub noise_std: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            components: vec![
                SignalPattern::Tone {
                    amplitude: 1.0,
                    freq_hz: 0.02,
                    phase: 0.0,
                },
                SignalPattern::Tone {
                    amplitude: 0.5,
                    freq_hz: 3.0,
                    phase: 0.0,
                },
            ],
            channel_offset: 1.0,
            noise_std: 0.05,
        }
    }
}

impl SignalConfig {
    /// Noise-free value of `channel` at `t` seconds
    pub fn clean_value(&self, t: f64, channel: usize) -> f64 {
        self.components.iter().map(|p| p.value_at(t)).sum::<f64>()
            + channel as f64 * self.channel_offset
    }

    /// Rows `first_row..first_row + rows` of a regularly sampled signal,
    /// time-major.
    pub fn render(
        &self,
        seed: u64,
        first_row: u64,
        rows: usize,
        channels: usize,
        sample_interval_secs: f64,
    ) -> Vec<f32> {
        let mut out = Vec::with_capacity(rows * channels);
        let noise = Normal::new(0.0, self.noise_std.max(0.0)).ok();
        let end_row = first_row + rows as u64;

        let mut row = first_row;
        while row < end_row {
            let block = row / NOISE_BLOCK_ROWS;
            let block_end = ((block + 1) * NOISE_BLOCK_ROWS).min(end_row);
            let mut rng = StdRng::seed_from_u64(seed ^ block.wrapping_mul(0x9E37_79B9_7F4A_7C15));

            // Advance to the first requested row inside the block
            if let Some(dist) = &noise {
                let skip = (row - block * NOISE_BLOCK_ROWS) as usize * channels;
                for _ in 0..skip {
                    let _: f64 = dist.sample(&mut rng);
                }
            }

            for r in row..block_end {
                let t = r as f64 * sample_interval_secs;
                for ch in 0..channels {
                    let n = noise.as_ref().map_or(0.0, |d| d.sample(&mut rng));
                    out.push((self.clean_value(t, ch) + n) as f32);
                }
            }
            row = block_end;
        }
        out
    }
}
