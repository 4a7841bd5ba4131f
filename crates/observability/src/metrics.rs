//! Pipeline metric recorders
//!
//! Thin wrappers over the `metrics` facade. Without an installed recorder
//! (tests, `--metrics-port` unset) every call is a no-op.

use contracts::TemperatureReading;
use metrics::{counter, gauge, histogram};

/// Record a non-empty chunk read from the device
pub fn record_chunk_received(bytes: usize) {
    counter!("thermo_ingest_chunks_received_total").increment(1);
    counter!("thermo_ingest_bytes_received_total").increment(bytes as u64);
}

/// Record a parsed reading
pub fn record_reading_parsed(value: f64) {
    counter!("thermo_ingest_readings_parsed_total").increment(1);
    gauge!("thermo_ingest_last_temperature").set(value);
    histogram!("thermo_ingest_temperature").record(value);
}

/// Record a chunk that produced no reading
pub fn record_frame_rejected(kind: &str) {
    counter!(
        "thermo_ingest_frames_rejected_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record a reading evicted from a full queue
pub fn record_reading_dropped() {
    counter!("thermo_ingest_readings_dropped_total").increment(1);
}

/// Record current queue depth
pub fn record_queue_depth(depth: usize) {
    gauge!("thermo_ingest_queue_depth").set(depth as f64);
}

/// Record a sink save attempt
pub fn record_reading_saved(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "thermo_ingest_readings_saved_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// In-memory temperature statistics for the end-of-run summary
#[derive(Debug, Clone, Default)]
pub struct ReadingStatsAggregator {
    /// Readings seen
    pub total_readings: u64,

    /// Temperature values
    pub values: RunningStats,

    /// Sequence of the last reading
    pub last_sequence: Option<u64>,
}

impl ReadingStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one reading into the statistics
    pub fn update(&mut self, reading: &TemperatureReading) {
        self.total_readings += 1;
        self.values.push(reading.value);
        self.last_sequence = Some(reading.sequence);
    }

    pub fn summary(&self) -> ReadingSummary {
        ReadingSummary {
            total_readings: self.total_readings,
            temperature: StatsSummary::from(&self.values),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Temperature summary
#[derive(Debug, Clone, Default)]
pub struct ReadingSummary {
    pub total_readings: u64,
    pub temperature: StatsSummary,
}

impl std::fmt::Display for ReadingSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Readings: {}", self.total_readings)?;
        write!(f, "Temperature: {}", self.temperature)
    }
}

/// Min/max/mean/std summary
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.2}, max={:.2}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
