//! Measurement history per location
//!
//! Completed aggregates are appended to a JSON file so a location's reported
//! speeds and their confidence can grow with the number of tests taken there.
//! A missing file is an empty history.

use crate::{
    models::AggregateResult,
    stats::{percentile, round_to_tenth},
    types::Confidence,
    AppError, Result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// History file format version
const HISTORY_VERSION: u32 = 1;

/// One completed session attributed to a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMeasurement {
    pub location: String,
    pub download: f64,
    pub upload: f64,
    pub ping: f64,
    pub jitter: f64,
    /// Runs averaged into this measurement
    pub sample_count: usize,
    pub recorded_at: DateTime<Utc>,
}

impl StoredMeasurement {
    fn from_aggregate(location: &str, result: &AggregateResult) -> Self {
        Self {
            location: location.trim().to_string(),
            download: result.download,
            upload: result.upload,
            ping: result.ping,
            jitter: result.jitter,
            sample_count: result.sample_count,
            recorded_at: result.timestamp,
        }
    }

    fn matches(&self, location: &str) -> bool {
        self.location.eq_ignore_ascii_case(location.trim())
    }
}

/// On-disk layout
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryData {
    version: u32,
    measurements: Vec<StoredMeasurement>,
}

impl Default for HistoryData {
    fn default() -> Self {
        Self {
            version: HISTORY_VERSION,
            measurements: Vec::new(),
        }
    }
}

/// What the history says about one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSummary {
    pub location: String,
    /// Number of stored tests
    pub test_count: usize,
    /// Confidence in the historical averages, classified by `test_count`
    pub confidence: Confidence,
    pub mean_download: Option<f64>,
    pub mean_upload: Option<f64>,
    pub mean_ping: Option<f64>,
    /// 10th percentile of stored download speeds
    pub download_p10: Option<f64>,
    /// 90th percentile of stored download speeds
    pub download_p90: Option<f64>,
    pub last_tested: Option<DateTime<Utc>>,
}

/// JSON-file backed store of completed measurements
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default history location following the XDG data directory convention
    pub fn default_path() -> PathBuf {
        let data_dir = if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
            PathBuf::from(xdg_data)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".local").join("share")
        } else {
            return PathBuf::from("speed_history.json");
        };

        data_dir.join("cafe-speed-tester").join("history.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a completed aggregate for `location`
    pub fn record(&self, location: &str, result: &AggregateResult) -> Result<StoredMeasurement> {
        if location.trim().is_empty() {
            return Err(AppError::validation("Location name cannot be empty"));
        }

        let mut data = self.load()?;
        let measurement = StoredMeasurement::from_aggregate(location, result);
        data.measurements.push(measurement.clone());
        self.save(&data)?;

        Ok(measurement)
    }

    /// Every stored measurement for `location`, oldest first
    pub fn measurements(&self, location: &str) -> Result<Vec<StoredMeasurement>> {
        Ok(self.load()?
            .measurements
            .into_iter()
            .filter(|m| m.matches(location))
            .collect())
    }

    /// Number of stored tests for `location`
    pub fn test_count(&self, location: &str) -> Result<usize> {
        Ok(self.load()?.measurements.iter().filter(|m| m.matches(location)).count())
    }

    /// Historical averages for `location`
    pub fn location_summary(&self, location: &str) -> Result<LocationSummary> {
        let measurements = self.measurements(location)?;
        let test_count = measurements.len();

        let downloads: Vec<f64> = measurements.iter().map(|m| m.download).collect();

        Ok(LocationSummary {
            location: location.trim().to_string(),
            test_count,
            confidence: Confidence::from_sample_count(test_count),
            mean_download: mean_of(&measurements, |m| m.download).map(round_to_tenth),
            mean_upload: mean_of(&measurements, |m| m.upload).map(round_to_tenth),
            mean_ping: mean_of(&measurements, |m| m.ping).map(f64::round),
            download_p10: percentile(&downloads, 10.0).map(round_to_tenth),
            download_p90: percentile(&downloads, 90.0).map(round_to_tenth),
            last_tested: measurements.iter().map(|m| m.recorded_at).max(),
        })
    }

    fn load(&self) -> Result<HistoryData> {
        if !self.path.exists() {
            return Ok(HistoryData::default());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| AppError::io(format!("Failed to read history file '{}': {}", self.path.display(), e)))?;

        if content.trim().is_empty() {
            return Ok(HistoryData::default());
        }

        let data: HistoryData = serde_json::from_str(&content)
            .map_err(|e| AppError::parse(format!("Failed to parse history file '{}': {}", self.path.display(), e)))?;

        if data.version != HISTORY_VERSION {
            return Err(AppError::validation(format!(
                "History file '{}' has unsupported version {}",
                self.path.display(),
                data.version
            )));
        }

        Ok(data)
    }

    fn save(&self, data: &HistoryData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    AppError::io(format!("Failed to create history directory '{}': {}", parent.display(), e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(data)?;

        // Replace atomically
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .map_err(|e| AppError::io(format!("Failed to write history file '{}': {}", tmp_path.display(), e)))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| AppError::io(format!("Failed to replace history file '{}': {}", self.path.display(), e)))?;

        Ok(())
    }
}

fn mean_of(measurements: &[StoredMeasurement], metric: impl Fn(&StoredMeasurement) -> f64) -> Option<f64> {
    if measurements.is_empty() {
        return None;
    }
    Some(measurements.iter().map(metric).sum::<f64>() / measurements.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn aggregate(download: f64, upload: f64, ping: f64) -> AggregateResult {
        AggregateResult {
            download,
            upload,
            ping,
            jitter: 2.0,
            sample_count: 3,
            confidence: Confidence::Low,
            timestamp: Utc::now(),
        }
    }

    fn store_in(dir: &TempDir) -> HistoryStore {
        HistoryStore::new(dir.path().join("nested").join("history.json"))
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.test_count("Blue Bottle").unwrap(), 0);

        let summary = store.location_summary("Blue Bottle").unwrap();
        assert_eq!(summary.test_count, 0);
        assert_eq!(summary.confidence, Confidence::Low);
        assert_eq!(summary.mean_download, None);
        assert_eq!(summary.last_tested, None);
    }

    #[test]
    fn test_record_and_count_per_location() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.record("Blue Bottle", &aggregate(40.0, 10.0, 20.0)).unwrap();
        store.record("blue bottle ", &aggregate(60.0, 12.0, 30.0)).unwrap();
        store.record("Ritual", &aggregate(15.0, 3.0, 80.0)).unwrap();

        assert!(store.path().exists());
        assert_eq!(store.test_count("Blue Bottle").unwrap(), 2);
        assert_eq!(store.test_count("Ritual").unwrap(), 1);
        assert_eq!(store.test_count("Sightglass").unwrap(), 0);
    }

    #[test]
    fn test_location_summary_averages() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.record("Ritual", &aggregate(40.0, 10.0, 20.0)).unwrap();
        store.record("Ritual", &aggregate(60.0, 12.0, 31.0)).unwrap();

        let summary = store.location_summary("Ritual").unwrap();
        assert_eq!(summary.test_count, 2);
        assert_eq!(summary.mean_download, Some(50.0));
        assert_eq!(summary.mean_upload, Some(11.0));
        assert_eq!(summary.mean_ping, Some(26.0));
        assert_eq!(summary.download_p10, Some(42.0));
        assert_eq!(summary.download_p90, Some(58.0));
        assert!(summary.last_tested.is_some());
    }

    #[test]
    fn test_historical_confidence_grows_with_test_count() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        for _ in 0..9 {
            store.record("Ritual", &aggregate(30.0, 8.0, 25.0)).unwrap();
        }
        assert_eq!(store.location_summary("Ritual").unwrap().confidence, Confidence::Low);

        store.record("Ritual", &aggregate(30.0, 8.0, 25.0)).unwrap();
        assert_eq!(store.location_summary("Ritual").unwrap().confidence, Confidence::Medium);

        for _ in 0..10 {
            store.record("Ritual", &aggregate(30.0, 8.0, 25.0)).unwrap();
        }
        assert_eq!(store.location_summary("Ritual").unwrap().confidence, Confidence::High);
    }

    #[test]
    fn test_record_rejects_blank_location() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let err = store.record("   ", &aggregate(30.0, 8.0, 25.0)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();

        let store = HistoryStore::new(&path);
        assert!(matches!(store.test_count("Ritual").unwrap_err(), AppError::Parse(_)));
    }

    #[test]
    fn test_history_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");

        HistoryStore::new(&path).record("Ritual", &aggregate(30.0, 8.0, 25.0)).unwrap();

        let reopened = HistoryStore::new(&path);
        let measurements = reopened.measurements("ritual").unwrap();
        assert_eq!(measurements.len(), 1);
        assert_eq!(measurements[0].location, "Ritual");
        assert_eq!(measurements[0].sample_count, 3);
    }
}
