// LFProc - Low-frequency windowed processing for sensor archives
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Windowed processor configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::series::ResampleMethod;
use crate::time::secs_to_micros;

/// Parameters of a windowed processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Output sample interval in seconds.
    pub output_sample_interval: f64,

    /// Output grid points per processed chunk, edge buffers included.
    pub process_patch_size: usize,

    /// Grid points trimmed at each end of a filtered chunk.
    pub edge_buff_size: usize,

    /// Largest discontinuity (seconds) bridged when joining source files.
    pub data_gap_tolerance: f64,

    /// Low-pass cutoff as a fraction of the output Nyquist frequency.
    pub cutoff_ratio: f64,

    /// Placement of filtered samples onto the output grid.
    pub resample_method: ResampleMethod,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            output_sample_interval: 1.0,
            process_patch_size: 100,
            edge_buff_size: 10,
            data_gap_tolerance: 0.0,
            cutoff_ratio: 0.9,
            resample_method: ResampleMethod::Nearest,
        }
    }
}

impl ProcessorConfig {
    /// Keys accepted by [`update`](Self::update)
    pub const KEYS: [&'static str; 6] = [
        "output_sample_interval",
        "process_patch_size",
        "edge_buff_size",
        "data_gap_tolerance",
        "cutoff_ratio",
        "resample_method",
    ];

    pub fn with_output_sample_interval(mut self, secs: f64) -> Self {
        self.output_sample_interval = secs;
        self
    }

    pub fn with_patch_size(mut self, points: usize) -> Self {
        self.process_patch_size = points;
        self
    }

    pub fn with_edge_buffer(mut self, points: usize) -> Self {
        self.edge_buff_size = points;
        self
    }

    pub fn with_gap_tolerance(mut self, secs: f64) -> Self {
        self.data_gap_tolerance = secs;
        self
    }

    pub fn with_cutoff_ratio(mut self, ratio: f64) -> Self {
        self.cutoff_ratio = ratio;
        self
    }

    pub fn with_resample_method(mut self, method: ResampleMethod) -> Self {
        self.resample_method = method;
        self
    }

    /// Output grid step in microseconds
    pub fn output_interval_micros(&self) -> i64 {
        secs_to_micros(self.output_sample_interval)
    }

    /// Gap tolerance in microseconds
    pub fn gap_tolerance_micros(&self) -> i64 {
        secs_to_micros(self.data_gap_tolerance)
    }

    /// Low-pass cutoff in Hz: `cutoff_ratio / (2 * dt)`
    pub fn cutoff_hz(&self) -> f64 {
        self.cutoff_ratio / (2.0 * self.output_sample_interval)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.output_sample_interval.is_finite() || self.output_interval_micros() <= 0 {
            return Err(invalid(
                "output_sample_interval",
                format!("must be at least 1us, got {}", self.output_sample_interval),
            ));
        }
        if self.process_patch_size <= 2 * self.edge_buff_size {
            return Err(invalid(
                "process_patch_size",
                format!(
                    "{} leaves nothing between two edge buffers of {}",
                    self.process_patch_size, self.edge_buff_size
                ),
            ));
        }
        if !self.data_gap_tolerance.is_finite() || self.data_gap_tolerance < 0.0 {
            return Err(invalid(
                "data_gap_tolerance",
                format!("must be a non-negative number, got {}", self.data_gap_tolerance),
            ));
        }
        if !(self.cutoff_ratio > 0.0 && self.cutoff_ratio <= 1.0) {
            return Err(invalid(
                "cutoff_ratio",
                format!("must lie in (0, 1], got {}", self.cutoff_ratio),
            ));
        }
        Ok(())
    }

    /// Apply key/value updates.
    ///
    /// Unknown keys are logged and returned; the update itself is all or nothing.
    pub fn update<I, K>(&mut self, pairs: I) -> Result<Vec<String>, ConfigError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut next = self.clone();
        let mut unknown = Vec::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            match key {
                "output_sample_interval" => next.output_sample_interval = typed(key, value)?,
                "process_patch_size" => next.process_patch_size = typed(key, value)?,
                "edge_buff_size" => next.edge_buff_size = typed(key, value)?,
                "data_gap_tolerance" => next.data_gap_tolerance = typed(key, value)?,
                "cutoff_ratio" => next.cutoff_ratio = typed(key, value)?,
                "resample_method" => next.resample_method = typed(key, value)?,
                _ => {
                    log::warn!("{key} is not a processor parameter, ignored");
                    unknown.push(key.to_string());
                }
            }
        }
        next.validate()?;
        *self = next;
        Ok(unknown)
    }

    /// Apply updates from a JSON object
    pub fn update_from_json(&mut self, text: &str) -> Result<Vec<String>, ConfigError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(ConfigError::Malformed(
                "expected a JSON object of parameters".to_string(),
            ));
        };
        self.update(map)
    }
}

fn invalid(key: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason,
    }
}

fn typed<T: serde::de::DeserializeOwned>(key: &str, value: Value) -> Result<T, ConfigError> {
    serde_json::from_value(value).map_err(|e| invalid(key, e.to_string()))
}
