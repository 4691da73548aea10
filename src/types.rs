//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// How trustworthy a reported average is, based purely on sample count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    /// Fewer than 10 samples
    Low,
    /// 10 to 19 samples
    Medium,
    /// 20 or more samples
    High,
}

impl Confidence {
    /// Minimum sample count for Medium confidence
    pub const MEDIUM_THRESHOLD: usize = 10;
    /// Minimum sample count for High confidence
    pub const HIGH_THRESHOLD: usize = 20;

    /// Classify a sample count.
    ///
    /// Used both for the run count of a live session and for the number of
    /// historical tests stored for a location.
    pub fn from_sample_count(sample_count: usize) -> Self {
        if sample_count >= Self::HIGH_THRESHOLD {
            Self::High
        } else if sample_count >= Self::MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Get display label
    pub fn label(&self) -> &'static str {
        match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle of a test session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// No session has been started yet
    Idle,
    /// Attempts are being driven
    Running,
    /// Every attempt resolved and the aggregate was produced
    Completed,
    /// An attempt failed or the session was cancelled
    Failed,
}

impl SessionStatus {
    /// Whether the session reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

/// Measurement phase within a single attempt, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Round-trip latency and its variation
    PingJitter,
    /// Download throughput
    Download,
    /// Upload throughput
    Upload,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 3] = [Phase::PingJitter, Phase::Download, Phase::Upload];

    pub fn label(&self) -> &'static str {
        match self {
            Phase::PingJitter => "ping",
            Phase::Download => "download",
            Phase::Upload => "upload",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which measurement backend a provider selection refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Probe the HTTP provider and fall back to simulation if it is unavailable
    Auto,
    /// Real HTTP speed-test endpoint
    Http,
    /// Bounded-random simulated generator
    Simulated,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Auto => "auto",
            ProviderKind::Http => "http",
            ProviderKind::Simulated => "simulated",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ProviderKind::Auto),
            "http" | "real" => Ok(ProviderKind::Http),
            "simulated" | "sim" => Ok(ProviderKind::Simulated),
            other => Err(AppError::config(format!(
                "Unknown provider '{}' (expected auto, http or simulated)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_thresholds() {
        assert_eq!(Confidence::from_sample_count(0), Confidence::Low);
        assert_eq!(Confidence::from_sample_count(9), Confidence::Low);
        assert_eq!(Confidence::from_sample_count(10), Confidence::Medium);
        assert_eq!(Confidence::from_sample_count(15), Confidence::Medium);
        assert_eq!(Confidence::from_sample_count(19), Confidence::Medium);
        assert_eq!(Confidence::from_sample_count(20), Confidence::High);
        assert_eq!(Confidence::from_sample_count(500), Confidence::High);
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
    }

    #[test]
    fn test_phase_order() {
        assert!(Phase::PingJitter < Phase::Download);
        assert!(Phase::Download < Phase::Upload);
        assert_eq!(Phase::ALL[0], Phase::PingJitter);
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("auto".parse::<ProviderKind>().unwrap(), ProviderKind::Auto);
        assert_eq!("HTTP".parse::<ProviderKind>().unwrap(), ProviderKind::Http);
        assert_eq!("sim".parse::<ProviderKind>().unwrap(), ProviderKind::Simulated);
        assert!("ookla".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_session_status_terminal() {
        assert!(!SessionStatus::Idle.is_terminal());
        assert!(!SessionStatus::Running.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
    }
}
