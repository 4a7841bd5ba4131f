//! Frame parser
//!
//! Turns one raw chunk into zero or one reading. The device prints ASCII
//! numbers interleaved with units and delimiters (`"23.51 Celsius, "`), so
//! everything except digits and the decimal point is discarded before the
//! number is parsed. Chunks are not aligned with reports; anything that does
//! not clean up into a single finite number is rejected, never fatal.

use contracts::{RawChunk, TemperatureReading};
use tracing::{debug, warn};

use crate::error::FrameError;

/// Keep only ASCII digits and '.'
pub fn clean_numeric(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Parse raw bytes into a reading, reporting why a chunk was rejected.
pub fn parse_frame(data: &[u8], sequence: u64) -> Result<TemperatureReading, FrameError> {
    let text = String::from_utf8_lossy(data);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(FrameError::Empty);
    }

    let cleaned = clean_numeric(trimmed);
    if cleaned.is_empty() {
        return Err(FrameError::Malformed {
            raw: trimmed.to_string(),
        });
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(TemperatureReading::now(value, sequence)),
        _ => Err(FrameError::InvalidNumber {
            raw: trimmed.to_string(),
            cleaned,
        }),
    }
}

/// Parse a chunk, logging rejections.
pub fn parse(chunk: &RawChunk) -> Option<TemperatureReading> {
    match parse_frame(&chunk.data, chunk.sequence) {
        Ok(reading) => Some(reading),
        Err(e) => {
            report_rejection(&e, chunk.sequence);
            None
        }
    }
}

/// Log a rejected chunk at the level its kind deserves
pub fn report_rejection(error: &FrameError, sequence: u64) {
    match error {
        FrameError::Empty => {
            debug!(sequence, "Received empty data, skipping");
        }
        FrameError::Malformed { raw } => {
            warn!(sequence, raw = %raw, "Malformed data, unable to parse temperature");
        }
        FrameError::InvalidNumber { raw, cleaned } => {
            warn!(
                sequence,
                raw = %raw,
                cleaned = %cleaned,
                "Failed to parse temperature"
            );
        }
    }
}
