//! Per-run and aggregated measurement data models

use crate::types::{AppError, Confidence, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one complete measurement attempt
///
/// Throughput values are in Mbps, latency values in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Download throughput (Mbps)
    pub download: f64,
    /// Upload throughput (Mbps)
    pub upload: f64,
    /// Round-trip latency (ms)
    pub ping: f64,
    /// Latency variation (ms)
    pub jitter: f64,
}

impl RunResult {
    /// Create a run result, rejecting negative or non-finite values
    pub fn new(download: f64, upload: f64, ping: f64, jitter: f64) -> Result<Self> {
        let result = Self { download, upload, ping, jitter };
        result.validate()?;
        Ok(result)
    }

    /// Check that every metric is a finite, non-negative number
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.metrics() {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::measurement(format!(
                    "Provider reported an invalid {} value: {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Metric values paired with their names, in reporting order
    pub fn metrics(&self) -> [(&'static str, f64); 4] {
        [
            ("download", self.download),
            ("upload", self.upload),
            ("ping", self.ping),
            ("jitter", self.jitter),
        ]
    }
}

/// Single representative measurement reduced from a completed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Mean download throughput (Mbps, one decimal)
    pub download: f64,
    /// Mean upload throughput (Mbps, one decimal)
    pub upload: f64,
    /// Mean round-trip latency (ms, whole number)
    pub ping: f64,
    /// Mean latency variation (ms, one decimal)
    pub jitter: f64,
    /// Number of runs that were averaged
    pub sample_count: usize,
    /// Confidence tier derived from `sample_count`
    pub confidence: Confidence,
    /// When the aggregate was computed
    pub timestamp: DateTime<Utc>,
}

impl AggregateResult {
    /// Format download speed for display
    pub fn format_download(&self) -> String {
        format!("{:.1} Mbps", self.download)
    }

    /// Format upload speed for display
    pub fn format_upload(&self) -> String {
        format!("{:.1} Mbps", self.upload)
    }

    /// Format ping for display
    pub fn format_ping(&self) -> String {
        format!("{:.0} ms", self.ping)
    }

    /// Format jitter for display
    pub fn format_jitter(&self) -> String {
        format!("{:.1} ms", self.jitter)
    }
}

/// Min / median / max of one metric across the runs of a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSpread {
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

impl MetricSpread {
    /// Distance between the extremes
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Per-metric spread of the raw runs, shown next to the averaged result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSpread {
    pub download: MetricSpread,
    pub upload: MetricSpread,
    pub ping: MetricSpread,
    pub jitter: MetricSpread,
}
