//! Ingestion metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::error::FrameError;

/// Ingestion metrics
///
/// Shared between the reader thread and whoever reports on the run.
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Non-empty chunks read from the device
    pub chunks_received: AtomicU64,

    /// Bytes read from the device
    pub bytes_received: AtomicU64,

    /// Readings produced by the parser
    pub readings_parsed: AtomicU64,

    /// Chunks that were empty after trimming
    pub empty_frames: AtomicU64,

    /// Chunks without numeric content
    pub malformed_frames: AtomicU64,

    /// Chunks whose numeric content did not parse
    pub invalid_frames: AtomicU64,

    /// Readings evicted by the drop-oldest policy
    pub readings_dropped: AtomicU64,

    /// Current queue length
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a chunk read from the device
    pub fn record_chunk(&self, len: usize) {
        self.chunks_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Record a parsed reading
    pub fn record_parsed(&self) {
        self.readings_parsed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected chunk
    pub fn record_rejected(&self, error: &FrameError) {
        let counter = match error {
            FrameError::Empty => &self.empty_frames,
            FrameError::Malformed { .. } => &self.malformed_frames,
            FrameError::InvalidNumber { .. } => &self.invalid_frames,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record reading dropped
    pub fn record_dropped(&self) {
        self.readings_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Update queue length
    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            chunks_received: self.chunks_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            readings_parsed: self.readings_parsed.load(Ordering::Relaxed),
            empty_frames: self.empty_frames.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            invalid_frames: self.invalid_frames.load(Ordering::Relaxed),
            readings_dropped: self.readings_dropped.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub chunks_received: u64,
    pub bytes_received: u64,
    pub readings_parsed: u64,
    pub empty_frames: u64,
    pub malformed_frames: u64,
    pub invalid_frames: u64,
    pub readings_dropped: u64,
    pub queue_len: usize,
}

impl MetricsSnapshot {
    /// Total chunks that produced no reading
    pub fn frames_rejected(&self) -> u64 {
        self.empty_frames + self.malformed_frames + self.invalid_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_counted_by_kind() {
        let metrics = IngestionMetrics::new();
        metrics.record_rejected(&FrameError::Empty);
        metrics.record_rejected(&FrameError::Malformed {
            raw: "--".to_string(),
        });
        metrics.record_rejected(&FrameError::InvalidNumber {
            raw: "12.3.4".to_string(),
            cleaned: "12.3.4".to_string(),
        });
        metrics.record_rejected(&FrameError::Empty);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.empty_frames, 2);
        assert_eq!(snapshot.malformed_frames, 1);
        assert_eq!(snapshot.invalid_frames, 1);
        assert_eq!(snapshot.frames_rejected(), 4);
    }

    #[test]
    fn test_chunk_bytes_accumulate() {
        let metrics = IngestionMetrics::new();
        metrics.record_chunk(4);
        metrics.record_chunk(10);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.chunks_received, 2);
        assert_eq!(snapshot.bytes_received, 14);
    }
}
