//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::types::ProviderKind;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        if Path::new(".env").exists() {
            dotenv::from_filename(".env")
                .map_err(|e| AppError::config(format!("Failed to load .env file: {}", e)))?;

            if debug {
                eprintln!("Loaded configuration from .env file");
            }
        } else if debug {
            eprintln!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Café Speed Tester Configuration
#
# Values specified here are used as defaults and can be overridden
# by command-line arguments.

# Number of measurement runs per session (1-50)
# SPEEDTEST_RUNS=3

# Pause between runs in milliseconds (0-10000)
# SPEEDTEST_COOLDOWN_MS=500

# Deadline for a single run in seconds (1-600)
# SPEEDTEST_TIMEOUT_SECONDS=60

# Measurement provider: auto, http or simulated
# SPEEDTEST_PROVIDER=auto

# Base URL of the HTTP speed-test endpoint
# SPEEDTEST_ENDPOINT=https://speed.cloudflare.com

# Seed for the simulated provider
# SPEEDTEST_SEED=42

# Delay between simulated progress steps in milliseconds
# SPEEDTEST_SIMULATED_STEP_MS=100

# Location results are recorded under
# SPEEDTEST_LOCATION=Ritual Coffee

# History file for per-location results
# SPEEDTEST_HISTORY_FILE=~/.local/share/cafe-speed-tester/history.json

# Enable colored output (true/false)
# ENABLE_COLOR=true

# Example configurations for different scenarios:
#
# Offline demo with reproducible numbers:
# SPEEDTEST_PROVIDER=simulated
# SPEEDTEST_SEED=7
#
# Building confidence quickly at one café:
# SPEEDTEST_RUNS=10
# SPEEDTEST_COOLDOWN_MS=250
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        let content = Self::create_example_env_content();
        std::fs::write(path, content)
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))?;

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "SPEEDTEST_RUNS" => {
                let runs: usize = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid SPEEDTEST_RUNS value '{}': {}", value, e)))?;
                if runs == 0 || runs > crate::defaults::MAX_RUNS {
                    return Err(AppError::config(format!(
                        "SPEEDTEST_RUNS must be between 1 and {}, got: {}",
                        crate::defaults::MAX_RUNS,
                        runs
                    )));
                }
            }
            "SPEEDTEST_COOLDOWN_MS" => {
                let cooldown: u64 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid SPEEDTEST_COOLDOWN_MS value '{}': {}", value, e)))?;
                if cooldown > crate::defaults::MAX_COOLDOWN_MS {
                    return Err(AppError::config(format!(
                        "SPEEDTEST_COOLDOWN_MS cannot exceed {}, got: {}",
                        crate::defaults::MAX_COOLDOWN_MS,
                        cooldown
                    )));
                }
            }
            "SPEEDTEST_TIMEOUT_SECONDS" => {
                let timeout: u64 = value.parse().map_err(|e| {
                    AppError::config(format!("Invalid SPEEDTEST_TIMEOUT_SECONDS value '{}': {}", value, e))
                })?;
                if timeout == 0 || timeout > crate::defaults::MAX_TIMEOUT_SECS {
                    return Err(AppError::config(format!(
                        "SPEEDTEST_TIMEOUT_SECONDS must be between 1 and {}, got: {}",
                        crate::defaults::MAX_TIMEOUT_SECS,
                        timeout
                    )));
                }
            }
            "SPEEDTEST_PROVIDER" => {
                value.parse::<ProviderKind>()?;
            }
            "SPEEDTEST_ENDPOINT" => {
                let parsed = url::Url::parse(value)
                    .map_err(|e| AppError::config(format!("Invalid SPEEDTEST_ENDPOINT '{}': {}", value, e)))?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!("Endpoint must use http or https: {}", value)));
                }
            }
            "SPEEDTEST_SEED" | "SPEEDTEST_SIMULATED_STEP_MS" => {
                value
                    .parse::<u64>()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            "ENABLE_COLOR" => {
                value
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("SPEEDTEST_RUNS", "Number of runs per session (1-50)", "3"),
            ("SPEEDTEST_COOLDOWN_MS", "Pause between runs in ms (0-10000)", "500"),
            ("SPEEDTEST_TIMEOUT_SECONDS", "Deadline for one run in seconds (1-600)", "60"),
            ("SPEEDTEST_PROVIDER", "Measurement provider (auto, http, simulated)", "auto"),
            ("SPEEDTEST_ENDPOINT", "Base URL of the HTTP speed-test endpoint", "https://speed.cloudflare.com"),
            ("SPEEDTEST_SEED", "Seed for the simulated provider", "42"),
            ("SPEEDTEST_SIMULATED_STEP_MS", "Delay between simulated progress steps in ms", "100"),
            ("SPEEDTEST_LOCATION", "Location results are recorded under", "Ritual Coffee"),
            ("SPEEDTEST_HISTORY_FILE", "History file for per-location results", "/tmp/history.json"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<28} {}\n", var, description));
            help.push_str(&format!("  {:<28} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        for (var_name, _, _) in Self::get_supported_env_vars() {
            if let Ok(value) = std::env::var(var_name) {
                if let Err(e) = Self::validate_env_var(var_name, &value) {
                    warnings.push(format!("Warning: {}", e));
                }
            }
        }

        Ok(warnings)
    }

    /// Check if .env file exists and validate its contents
    pub fn check_env_file() -> Result<Option<Vec<String>>> {
        Self::check_env_file_at(Path::new(".env"))
    }

    /// Validate the key/value lines of an env file without loading it
    pub fn check_env_file_at(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut warnings = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                if let Err(e) = Self::validate_env_var(key.trim(), value.trim()) {
                    warnings.push(format!("Line '{}': {}", line, e));
                }
            }
        }

        Ok(Some(warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_example_content_lists_every_variable() {
        let content = EnvManager::create_example_env_content();

        for (name, _, _) in EnvManager::get_supported_env_vars() {
            assert!(content.contains(&format!("{}=", name)), "missing {}", name);
        }
    }

    #[test]
    fn test_save_example_file() {
        let temp_file = NamedTempFile::new().unwrap();
        EnvManager::save_example_env_file(temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("Café Speed Tester Configuration"));
    }

    #[test]
    fn test_validate_env_var() {
        assert!(EnvManager::validate_env_var("SPEEDTEST_RUNS", "5").is_ok());
        assert!(EnvManager::validate_env_var("SPEEDTEST_COOLDOWN_MS", "0").is_ok());
        assert!(EnvManager::validate_env_var("SPEEDTEST_TIMEOUT_SECONDS", "30").is_ok());
        assert!(EnvManager::validate_env_var("SPEEDTEST_PROVIDER", "simulated").is_ok());
        assert!(EnvManager::validate_env_var("SPEEDTEST_ENDPOINT", "http://127.0.0.1:8080").is_ok());
        assert!(EnvManager::validate_env_var("SPEEDTEST_SEED", "7").is_ok());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "false").is_ok());
        assert!(EnvManager::validate_env_var("SOMETHING_ELSE", "whatever").is_ok());

        assert!(EnvManager::validate_env_var("SPEEDTEST_RUNS", "0").is_err());
        assert!(EnvManager::validate_env_var("SPEEDTEST_RUNS", "51").is_err());
        assert!(EnvManager::validate_env_var("SPEEDTEST_COOLDOWN_MS", "10001").is_err());
        assert!(EnvManager::validate_env_var("SPEEDTEST_TIMEOUT_SECONDS", "0").is_err());
        assert!(EnvManager::validate_env_var("SPEEDTEST_PROVIDER", "ookla").is_err());
        assert!(EnvManager::validate_env_var("SPEEDTEST_ENDPOINT", "ftp://example.com").is_err());
        assert!(EnvManager::validate_env_var("SPEEDTEST_SEED", "-1").is_err());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "maybe").is_err());
    }

    #[test]
    fn test_display_env_help() {
        let help = EnvManager::display_env_help();

        assert!(help.contains("Supported Environment Variables:"));
        assert!(help.contains("SPEEDTEST_RUNS"));
        assert!(help.contains("SPEEDTEST_PROVIDER"));
        assert!(help.contains("Configuration Priority"));
    }

    #[test]
    fn test_check_env_file_reports_bad_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "SPEEDTEST_RUNS=3").unwrap();
        writeln!(file, "SPEEDTEST_PROVIDER=carrier-pigeon").unwrap();
        writeln!(file).unwrap();

        let warnings = EnvManager::check_env_file_at(file.path()).unwrap().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("carrier-pigeon"));
    }

    #[test]
    fn test_check_env_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = EnvManager::check_env_file_at(&dir.path().join(".env")).unwrap();
        assert!(result.is_none());
    }
}
