//! RawChunk / TemperatureReading - Ingestion data model

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of raw bytes read from the device in a single read call.
///
/// Not guaranteed to align with one sensor report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    /// Arrival order within the reader session
    pub sequence: u64,

    /// Bytes as returned by the device
    pub data: Bytes,
}

impl RawChunk {
    /// Create a chunk from a read buffer slice
    pub fn new(sequence: u64, data: impl Into<Bytes>) -> Self {
        Self {
            sequence,
            data: data.into(),
        }
    }

    /// Number of bytes in the chunk
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the chunk carries no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A decoded temperature value with its capture time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    /// Temperature in the unit reported by the sensor (Celsius for TMP36 firmware)
    pub value: f64,

    /// Wall clock at parse time
    pub captured_at: DateTime<Utc>,

    /// Sequence number of the chunk this reading was parsed from
    pub sequence: u64,
}

impl TemperatureReading {
    /// Create a reading stamped with the current time
    pub fn now(value: f64, sequence: u64) -> Self {
        Self {
            value,
            captured_at: Utc::now(),
            sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_len() {
        let chunk = RawChunk::new(3, &b"21.5"[..]);
        assert_eq!(chunk.len(), 4);
        assert!(!chunk.is_empty());
        assert!(RawChunk::new(0, Bytes::new()).is_empty());
    }

    #[test]
    fn test_reading_serializes_rfc3339() {
        let reading = TemperatureReading::now(22.7, 1);
        let json = serde_json::to_value(reading).unwrap();
        assert_eq!(json["value"], 22.7);
        assert_eq!(json["sequence"], 1);
        assert!(json["captured_at"].as_str().unwrap().contains('T'));
    }
}
