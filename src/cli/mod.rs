//! Command-line interface module with topic help

pub mod help;

pub use help::HelpSystem;

use crate::types::ProviderKind;
use clap::Parser;
use std::path::PathBuf;

/// Café Speed Tester - multi-run WiFi speed measurement with confidence scoring
#[derive(Parser, Debug, Clone)]
#[command(name = "cst")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Number of measurement runs per session
    #[arg(short = 'n', long, value_parser = parse_runs)]
    pub runs: Option<usize>,

    /// Pause between runs in milliseconds
    #[arg(long, value_name = "MS")]
    pub cooldown_ms: Option<u64>,

    /// Deadline for a single run, in seconds
    #[arg(short, long, value_name = "SECS", value_parser = parse_timeout)]
    pub timeout: Option<u64>,

    /// Measurement provider (auto, http, simulated)
    #[arg(short, long, value_parser = parse_provider)]
    pub provider: Option<ProviderKind>,

    /// Base URL of the HTTP speed-test endpoint
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Seed for the simulated provider
    #[arg(long)]
    pub seed: Option<u64>,

    /// Location the result is recorded under
    #[arg(short, long, value_name = "NAME")]
    pub location: Option<String>,

    /// History file used to store results per location
    #[arg(long, value_name = "PATH")]
    pub history_file: Option<PathBuf>,

    /// Print a shareable one-paragraph summary
    #[arg(long)]
    pub share: bool,

    /// Print the session report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Only print the confidence level for a historical test count
    #[arg(long, value_name = "COUNT")]
    pub confidence_for: Option<usize>,

    /// Show help for specific topic (config, providers, confidence, examples, output)
    #[arg(long, value_name = "TOPIC")]
    pub help_topic: Option<String>,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.json && self.share {
            return Err("Cannot combine --json with --share".to_string());
        }

        if let Some(location) = &self.location {
            if location.trim().is_empty() {
                return Err("--location cannot be blank".to_string());
            }
        }

        if let Some(endpoint) = &self.endpoint {
            url::Url::parse(endpoint).map_err(|e| format!("Invalid --endpoint '{}': {}", endpoint, e))?;
        }

        Ok(())
    }

    pub fn should_show_topic_help(&self) -> bool {
        self.help_topic.is_some()
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color || self.json {
            false
        } else {
            supports_color()
        }
    }

    /// Display help for the specified topic or main help
    pub fn display_help(&self) -> String {
        let help_system = HelpSystem::new();
        let use_colors = self.use_colors();

        if let Some(topic) = &self.help_topic {
            help_system.display_topic_help(topic, use_colors).unwrap_or_else(|| {
                format!(
                    "Unknown help topic: '{}'\n\nAvailable topics: {}\n\n{}",
                    topic,
                    HelpSystem::topics().join(", "),
                    help_system.display_main_help(use_colors)
                )
            })
        } else {
            help_system.display_main_help(use_colors)
        }
    }

    /// Get configuration summary for display
    pub fn get_config_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("Command-line overrides:\n");
        if let Some(runs) = self.runs {
            summary.push_str(&format!("  Runs: {}\n", runs));
        }
        if let Some(cooldown) = self.cooldown_ms {
            summary.push_str(&format!("  Cooldown: {}ms\n", cooldown));
        }
        if let Some(timeout) = self.timeout {
            summary.push_str(&format!("  Timeout: {}s\n", timeout));
        }
        if let Some(provider) = self.provider {
            summary.push_str(&format!("  Provider: {}\n", provider));
        }
        if let Some(endpoint) = &self.endpoint {
            summary.push_str(&format!("  Endpoint: {}\n", endpoint));
        }
        if let Some(location) = &self.location {
            summary.push_str(&format!("  Location: {}\n", location));
        }
        summary.push_str(&format!("  Colored output: {}\n", self.use_colors()));
        summary.push_str(&format!("  Verbose mode: {}\n", self.verbose));
        summary.push_str(&format!("  Debug mode: {}\n", self.debug));

        summary
    }
}

fn parse_runs(s: &str) -> Result<usize, String> {
    let runs: usize = s.parse().map_err(|_| format!("Invalid run count: {}", s))?;
    if runs == 0 {
        Err("Run count must be greater than 0".to_string())
    } else if runs > crate::defaults::MAX_RUNS {
        Err(format!("Run count cannot exceed {}", crate::defaults::MAX_RUNS))
    } else {
        Ok(runs)
    }
}

/// Parse duration from seconds string
fn parse_timeout(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > crate::defaults::MAX_TIMEOUT_SECS {
                Err(format!("Duration cannot exceed {} seconds", crate::defaults::MAX_TIMEOUT_SECS))
            } else {
                Ok(secs)
            }
        })
}

fn parse_provider(s: &str) -> Result<ProviderKind, String> {
    s.parse::<ProviderKind>().map_err(|e| e.to_string())
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}
