//! Configuration data model and validation

use crate::defaults;
use crate::types::{AppError, ProviderKind, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of attempts per session
    #[serde(default = "default_total_runs")]
    pub total_runs: usize,

    /// Pause between consecutive attempts, in milliseconds
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Deadline for a single attempt, in seconds
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    /// Which measurement backend to use
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,

    /// Base URL of the HTTP speed-test endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bytes fetched during the download phase
    #[serde(default = "default_download_bytes")]
    pub download_bytes: u64,

    /// Bytes sent during the upload phase
    #[serde(default = "default_upload_bytes")]
    pub upload_bytes: usize,

    /// Round trips sampled for ping and jitter
    #[serde(default = "default_ping_samples")]
    pub ping_samples: usize,

    /// Delay between simulated progress steps, in milliseconds
    #[serde(default = "default_simulated_step_ms")]
    pub simulated_step_ms: u64,

    /// Fixed seed for the simulated generator
    #[serde(default)]
    pub seed: Option<u64>,

    /// Location the measurement is attributed to
    #[serde(default)]
    pub location: Option<String>,

    /// JSON file where completed results are stored per location
    #[serde(default)]
    pub history_file: Option<PathBuf>,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            total_runs: default_total_runs(),
            cooldown_ms: default_cooldown_ms(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            provider: default_provider(),
            endpoint: default_endpoint(),
            download_bytes: default_download_bytes(),
            upload_bytes: default_upload_bytes(),
            ping_samples: default_ping_samples(),
            simulated_step_ms: default_simulated_step_ms(),
            seed: None,
            location: None,
            history_file: None,
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Cooldown between attempts as Duration
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Per-attempt deadline as Duration
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    /// Simulated progress step as Duration
    pub fn simulated_step(&self) -> Duration {
        Duration::from_millis(self.simulated_step_ms)
    }

    /// Validate the configuration and return the first error found
    pub fn validate(&self) -> Result<()> {
        if self.total_runs == 0 {
            return Err(AppError::config("Run count must be greater than 0"));
        }

        if self.total_runs > defaults::MAX_RUNS {
            return Err(AppError::config(format!(
                "Run count cannot exceed {}",
                defaults::MAX_RUNS
            )));
        }

        if self.cooldown_ms > defaults::MAX_COOLDOWN_MS {
            return Err(AppError::config(format!(
                "Cooldown cannot exceed {} ms",
                defaults::MAX_COOLDOWN_MS
            )));
        }

        if self.attempt_timeout_secs == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.attempt_timeout_secs > defaults::MAX_TIMEOUT_SECS {
            return Err(AppError::config(format!(
                "Timeout cannot exceed {} seconds",
                defaults::MAX_TIMEOUT_SECS
            )));
        }

        if self.endpoint.is_empty() {
            return Err(AppError::config("Endpoint URL cannot be empty"));
        }

        match url::Url::parse(&self.endpoint) {
            Ok(parsed) => {
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!(
                        "Endpoint must use http or https: {}",
                        self.endpoint
                    )));
                }
            }
            Err(e) => {
                return Err(AppError::config(format!(
                    "Invalid endpoint URL '{}': {}",
                    self.endpoint, e
                )));
            }
        }

        if self.download_bytes == 0 || self.upload_bytes == 0 {
            return Err(AppError::config("Transfer sizes must be greater than 0"));
        }

        if !(2..=50).contains(&self.ping_samples) {
            return Err(AppError::config("Ping samples must be between 2 and 50"));
        }

        if let Some(location) = &self.location {
            if location.trim().is_empty() {
                return Err(AppError::config("Location cannot be blank"));
            }
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(runs) = std::env::var("SPEEDTEST_RUNS") {
            self.total_runs = runs.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid SPEEDTEST_RUNS value '{}': {}", runs, e)))?;
        }

        if let Ok(cooldown) = std::env::var("SPEEDTEST_COOLDOWN_MS") {
            self.cooldown_ms = cooldown.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid SPEEDTEST_COOLDOWN_MS value '{}': {}", cooldown, e)))?;
        }

        if let Ok(timeout) = std::env::var("SPEEDTEST_TIMEOUT_SECONDS") {
            self.attempt_timeout_secs = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid SPEEDTEST_TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Ok(provider) = std::env::var("SPEEDTEST_PROVIDER") {
            self.provider = provider.parse()?;
        }

        if let Ok(endpoint) = std::env::var("SPEEDTEST_ENDPOINT") {
            self.endpoint = endpoint.trim().to_string();
        }

        if let Ok(seed) = std::env::var("SPEEDTEST_SEED") {
            self.seed = Some(seed.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid SPEEDTEST_SEED value '{}': {}", seed, e)))?);
        }

        if let Ok(step) = std::env::var("SPEEDTEST_SIMULATED_STEP_MS") {
            self.simulated_step_ms = step.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid SPEEDTEST_SIMULATED_STEP_MS value '{}': {}", step, e)))?;
        }

        if let Ok(location) = std::env::var("SPEEDTEST_LOCATION") {
            let location = location.trim();
            if !location.is_empty() {
                self.location = Some(location.to_string());
            }
        }

        if let Ok(history_file) = std::env::var("SPEEDTEST_HISTORY_FILE") {
            let history_file = history_file.trim();
            if !history_file.is_empty() {
                self.history_file = Some(PathBuf::from(history_file));
            }
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_total_runs() -> usize {
    defaults::DEFAULT_TOTAL_RUNS
}

fn default_cooldown_ms() -> u64 {
    defaults::DEFAULT_COOLDOWN.as_millis() as u64
}

fn default_attempt_timeout_secs() -> u64 {
    defaults::DEFAULT_ATTEMPT_TIMEOUT.as_secs()
}

fn default_provider() -> ProviderKind {
    ProviderKind::Auto
}

fn default_endpoint() -> String {
    defaults::DEFAULT_ENDPOINT.to_string()
}

fn default_download_bytes() -> u64 {
    defaults::DEFAULT_DOWNLOAD_BYTES
}

fn default_upload_bytes() -> usize {
    defaults::DEFAULT_UPLOAD_BYTES
}

fn default_ping_samples() -> usize {
    defaults::DEFAULT_PING_SAMPLES
}

fn default_simulated_step_ms() -> u64 {
    defaults::DEFAULT_SIMULATED_STEP.as_millis() as u64
}

fn default_enable_color() -> bool {
    defaults::DEFAULT_ENABLE_COLOR
}
