// LFProc - Low-frequency windowed processing for sensor archives
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Native window file format
//!
//! Every processed window is stored as a self-describing `.lfd` file so that a
//! later process can reload it without loss of metadata.
//!
//! # File Format
//!
//! Little-endian binary encoding:
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │ Header (64 bytes)                   │
//! │   magic "LFDW"          4           │
//! │   format version (u32)  4           │
//! │   checksum (u32)        4           │
//! │   reserved              4           │
//! │   n_samples (u64)       8           │
//! │   n_channels (u64)      8           │
//! │   time_min (i64 us)     8           │
//! │   time_max (i64 us)     8           │
//! │   d_time (i64 us)       8           │
//! │   d_distance (f64)      8           │
//! ├─────────────────────────────────────┤
//! │ Time axis      i64 x n_samples      │
//! ├─────────────────────────────────────┤
//! │ Distance axis  f64 x n_channels     │
//! ├─────────────────────────────────────┤
//! │ Samples        f32 x n x c          │
//! └─────────────────────────────────────┘
//! ```
//!
//! The checksum is CRC-32 (ISO-HDLC) over every byte after the checksum field.

use std::path::Path;

use crc::{Crc, CRC_32_ISO_HDLC};

use crate::error::{FormatError, LfprocError, Result};
use crate::output::WindowCodec;
use crate::series::TimeSeries;
use crate::time::Timestamp;

/// Magic bytes for window files
pub const WINDOW_MAGIC: [u8; 4] = *b"LFDW";

/// Current window file format version
pub const WINDOW_FORMAT_VERSION: u32 = 1;

/// Header size in bytes
pub const WINDOW_HEADER_SIZE: usize = 64;

/// File extension used by [`NativeCodec`]
pub const WINDOW_EXTENSION: &str = ".lfd";

const CHECKSUM_OFFSET: usize = 8;
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Serialize a series to bytes
pub fn encode_series(series: &TimeSeries) -> Vec<u8> {
    let n = series.n_samples();
    let c = series.n_channels();
    let attrs = series.attrs();
    let mut bytes = Vec::with_capacity(WINDOW_HEADER_SIZE + n * 8 + c * 8 + n * c * 4);

    // === HEADER ===
    bytes.extend_from_slice(&WINDOW_MAGIC);
    bytes.extend_from_slice(&WINDOW_FORMAT_VERSION.to_le_bytes());
    // Checksum placeholder, filled at the end
    bytes.extend_from_slice(&[0u8; 4]);
    bytes.extend_from_slice(&[0u8; 4]);
    bytes.extend_from_slice(&(n as u64).to_le_bytes());
    bytes.extend_from_slice(&(c as u64).to_le_bytes());
    bytes.extend_from_slice(&attrs.time_min.as_micros().to_le_bytes());
    bytes.extend_from_slice(&attrs.time_max.as_micros().to_le_bytes());
    bytes.extend_from_slice(&attrs.d_time_us.to_le_bytes());
    bytes.extend_from_slice(&attrs.d_distance.to_le_bytes());
    debug_assert_eq!(bytes.len(), WINDOW_HEADER_SIZE);

    // === AXES ===
    for t in series.times() {
        bytes.extend_from_slice(&t.as_micros().to_le_bytes());
    }
    for d in series.distance() {
        bytes.extend_from_slice(&d.to_le_bytes());
    }

    // === SAMPLES ===
    for v in series.data() {
        bytes.extend_from_slice(&v.to_le_bytes());
    }

    let checksum = CRC32.checksum(&bytes[CHECKSUM_OFFSET + 4..]);
    bytes[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].copy_from_slice(&checksum.to_le_bytes());
    bytes
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn read_8(data: &[u8], at: usize) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[at..at + 8]);
    buf
}

/// Deserialize a series from bytes
pub fn decode_series(data: &[u8]) -> std::result::Result<TimeSeries, FormatError> {
    if data.len() < WINDOW_HEADER_SIZE {
        return Err(FormatError::BufferTooShort {
            needed: WINDOW_HEADER_SIZE,
            available: data.len(),
        });
    }
    if data[0..4] != WINDOW_MAGIC {
        return Err(FormatError::InvalidMagic);
    }
    let version = read_u32(data, 4);
    if version != WINDOW_FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }

    let stored_checksum = read_u32(data, CHECKSUM_OFFSET);
    let computed_checksum = CRC32.checksum(&data[CHECKSUM_OFFSET + 4..]);
    if stored_checksum != computed_checksum {
        return Err(FormatError::InvalidChecksum {
            expected: stored_checksum,
            actual: computed_checksum,
        });
    }

    let n = u64::from_le_bytes(read_8(data, 16)) as usize;
    let c = u64::from_le_bytes(read_8(data, 24)) as usize;
    let time_min = Timestamp::from_micros(i64::from_le_bytes(read_8(data, 32)));
    let time_max = Timestamp::from_micros(i64::from_le_bytes(read_8(data, 40)));
    let d_time_us = i64::from_le_bytes(read_8(data, 48));
    let d_distance = f64::from_le_bytes(read_8(data, 56));

    let needed = n
        .checked_mul(c)
        .and_then(|nc| nc.checked_mul(4))
        .and_then(|payload| payload.checked_add(n.checked_mul(8)?))
        .and_then(|sum| sum.checked_add(c.checked_mul(8)? + WINDOW_HEADER_SIZE))
        .ok_or_else(|| FormatError::Malformed(format!("implausible shape {n} x {c}")))?;
    if data.len() != needed {
        return Err(FormatError::BufferTooShort {
            needed,
            available: data.len(),
        });
    }

    let mut offset = WINDOW_HEADER_SIZE;
    let times = (0..n)
        .map(|i| Timestamp::from_micros(i64::from_le_bytes(read_8(data, offset + i * 8))))
        .collect();
    offset += n * 8;
    let distance = (0..c)
        .map(|i| f64::from_le_bytes(read_8(data, offset + i * 8)))
        .collect();
    offset += c * 8;
    let values = data[offset..]
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    let series = TimeSeries::new(times, distance, values, d_time_us)
        .map_err(|e| FormatError::Malformed(e.to_string()))?
        .with_distance_interval(d_distance);

    if series.time_min() != time_min || series.time_max() != time_max {
        return Err(FormatError::Malformed(format!(
            "header span {time_min}..{time_max} disagrees with time axis {}..{}",
            series.time_min(),
            series.time_max()
        )));
    }
    Ok(series)
}

/// Codec for the native `.lfd` window format
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCodec;

impl WindowCodec for NativeCodec {
    fn extension(&self) -> &str {
        WINDOW_EXTENSION
    }

    fn write(&self, series: &TimeSeries, path: &Path) -> Result<()> {
        std::fs::write(path, encode_series(series)).map_err(|e| LfprocError::io(path, e))
    }

    fn read(&self, path: &Path) -> Result<TimeSeries> {
        let bytes = std::fs::read(path).map_err(|e| LfprocError::io(path, e))?;
        Ok(decode_series(&bytes)?)
    }
}
