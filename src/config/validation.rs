//! Configuration validation utilities and rules

use crate::{error::Result, models::Config, types::Confidence, types::ProviderKind};

/// Configuration validator with advisory rules on top of `Config::validate`
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration with comprehensive checks
    ///
    /// Hard errors come from `Config::validate`; everything returned here is
    /// advisory and never stops a session.
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        config.validate()?;

        warnings.extend(Self::validate_endpoint(config));
        warnings.extend(Self::validate_session_settings(config));
        warnings.extend(Self::validate_provider_settings(config));

        Ok(warnings)
    }

    fn validate_endpoint(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.provider == ProviderKind::Simulated {
            return warnings;
        }

        let Ok(parsed) = url::Url::parse(&config.endpoint) else {
            return warnings;
        };

        if parsed.scheme() == "http" {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Endpoint '{}' uses HTTP instead of HTTPS, captive portals may intercept the traffic",
                    config.endpoint
                ),
            ));
        }

        match parsed.host() {
            Some(url::Host::Ipv4(ip)) if ip.is_private() || ip.is_loopback() => {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!(
                        "Endpoint '{}' is on a local network and will not reflect internet speed",
                        config.endpoint
                    ),
                ));
            }
            Some(url::Host::Domain("localhost")) => {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!(
                        "Endpoint '{}' is on a local network and will not reflect internet speed",
                        config.endpoint
                    ),
                ));
            }
            _ => {}
        }

        if parsed.query().is_some() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Endpoint '{}' includes query parameters, which are discarded", config.endpoint),
            ));
        }

        warnings
    }

    fn validate_session_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.total_runs < 3 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "{} run{} may not give a representative average (recommended: >= 3)",
                    config.total_runs,
                    if config.total_runs == 1 { "" } else { "s" }
                ),
            ));
        } else if config.total_runs >= Confidence::HIGH_THRESHOLD {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "{} runs will use roughly {} MB of data",
                    config.total_runs,
                    estimated_megabytes(config)
                ),
            ));
        }

        if config.attempt_timeout_secs < 10 && config.provider != ProviderKind::Simulated {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Timeout of {}s may be too short for slow café WiFi",
                    config.attempt_timeout_secs
                ),
            ));
        }

        warnings
    }

    fn validate_provider_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.provider == ProviderKind::Http {
            if config.cooldown_ms == 0 && config.total_runs > 1 {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    "Back-to-back runs without cooldown can understate throughput on shared networks"
                        .to_string(),
                ));
            }

            if config.seed.is_some() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    "Seed only affects the simulated provider and is ignored".to_string(),
                ));
            }
        }

        if config.provider == ProviderKind::Simulated && config.location.is_some() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "Simulated results will be recorded in the location history".to_string(),
            ));
        }

        warnings
    }
}

fn estimated_megabytes(config: &Config) -> u64 {
    let per_run = config.download_bytes + config.upload_bytes as u64;
    per_run * config.total_runs as u64 / 1_000_000
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    /// Get color for terminal display
    pub fn color(&self) -> &'static str {
        match self {
            Self::Info => "blue",
            Self::Warning => "yellow",
            Self::Error => "red",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        if use_color {
            use colored::Colorize;
            format!("[{}] {}", self.level.as_str().color(self.level.color()), self.message)
        } else {
            format!("[{}] {}", self.level.as_str(), self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
