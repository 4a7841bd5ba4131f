//! Run statistics

use std::fmt;
use std::time::Duration;

use ingestion::{MetricsSnapshot, ReaderExit};
use observability::ReadingSummary;

/// Statistics of one start/stop cycle
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Non-empty chunks read from the device
    pub chunks_received: u64,

    /// Bytes read from the device
    pub bytes_received: u64,

    /// Readings produced by the parser
    pub readings_parsed: u64,

    /// Chunks that were whitespace only
    pub empty_frames: u64,

    /// Chunks without numeric content
    pub malformed_frames: u64,

    /// Chunks whose numeric content did not parse
    pub invalid_frames: u64,

    /// Readings evicted by the drop-oldest policy
    pub readings_dropped: u64,

    /// Successful saves
    pub saves_succeeded: u64,

    /// Failed saves
    pub saves_failed: u64,

    /// Why the acquisition loop ended
    pub reader_exit: Option<ReaderExit>,

    /// Time between start and the end of stop
    pub duration: Duration,

    /// Temperatures handed to the sink
    pub temperature: ReadingSummary,
}

impl RunStats {
    pub(crate) fn from_parts(
        ingestion: MetricsSnapshot,
        sink: persistence::MetricsSnapshot,
        temperature: ReadingSummary,
        reader_exit: Option<ReaderExit>,
        duration: Duration,
    ) -> Self {
        Self {
            chunks_received: ingestion.chunks_received,
            bytes_received: ingestion.bytes_received,
            readings_parsed: ingestion.readings_parsed,
            empty_frames: ingestion.empty_frames,
            malformed_frames: ingestion.malformed_frames,
            invalid_frames: ingestion.invalid_frames,
            readings_dropped: ingestion.readings_dropped,
            saves_succeeded: sink.save_count,
            saves_failed: sink.failure_count,
            reader_exit,
            duration,
            temperature,
        }
    }

    /// Chunks that produced no reading
    pub fn frames_rejected(&self) -> u64 {
        self.empty_frames + self.malformed_frames + self.invalid_frames
    }

    /// Parsed readings per second
    pub fn readings_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.readings_parsed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Save failures as a percentage of save attempts
    pub fn failure_rate(&self) -> f64 {
        let total = self.saves_succeeded + self.saves_failed;
        if total > 0 {
            (self.saves_failed as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Run Statistics ===")?;
        writeln!(f, "Duration: {:.2}s", self.duration.as_secs_f64())?;
        writeln!(
            f,
            "Chunks received: {} ({} bytes)",
            self.chunks_received, self.bytes_received
        )?;
        writeln!(
            f,
            "Readings parsed: {} ({:.2}/s)",
            self.readings_parsed,
            self.readings_per_sec()
        )?;
        writeln!(
            f,
            "Frames rejected: {} (empty {}, malformed {}, invalid {})",
            self.frames_rejected(),
            self.empty_frames,
            self.malformed_frames,
            self.invalid_frames
        )?;
        writeln!(f, "Readings dropped: {}", self.readings_dropped)?;
        writeln!(
            f,
            "Saves: {} ok, {} failed ({:.2}%)",
            self.saves_succeeded,
            self.saves_failed,
            self.failure_rate()
        )?;
        if let Some(exit) = &self.reader_exit {
            writeln!(f, "Reader exit: {exit}")?;
        }
        write!(f, "{}", self.temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let stats = RunStats {
            readings_parsed: 10,
            saves_succeeded: 9,
            saves_failed: 1,
            duration: Duration::from_secs(2),
            ..Default::default()
        };
        assert!((stats.readings_per_sec() - 5.0).abs() < 1e-10);
        assert!((stats.failure_rate() - 10.0).abs() < 1e-10);
        assert_eq!(RunStats::default().failure_rate(), 0.0);
    }

    #[test]
    fn test_display() {
        let stats = RunStats {
            malformed_frames: 2,
            invalid_frames: 1,
            reader_exit: Some(ReaderExit::Disconnected),
            ..Default::default()
        };
        let output = stats.to_string();
        assert!(output.contains("Frames rejected: 3"));
        assert!(output.contains("Reader exit: disconnected"));
    }
}
