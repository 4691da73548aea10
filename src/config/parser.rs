//! Configuration parsing from CLI arguments and environment variables

use crate::{cli::Cli, config::env::EnvManager, error::Result, models::Config};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    ///
    /// Layers are applied lowest priority first: defaults, the `.env` file,
    /// process environment, then command-line flags.
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file(self.cli.debug)?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(runs) = cli.runs {
            config.total_runs = runs;
        }
        if let Some(cooldown_ms) = cli.cooldown_ms {
            config.cooldown_ms = cooldown_ms;
        }
        if let Some(timeout) = cli.timeout {
            config.attempt_timeout_secs = timeout;
        }
        if let Some(provider) = cli.provider {
            config.provider = provider;
        }
        if let Some(endpoint) = &cli.endpoint {
            config.endpoint = endpoint.clone();
        }
        if cli.seed.is_some() {
            config.seed = cli.seed;
        }
        if let Some(location) = &cli.location {
            config.location = Some(location.trim().to_string());
        }
        if let Some(history_file) = &cli.history_file {
            config.history_file = Some(history_file.clone());
        }

        if cli.color {
            config.enable_color = true;
        } else if cli.no_color || cli.json {
            config.enable_color = false;
        } else if config.enable_color {
            config.enable_color = cli.use_colors();
        }

        // CLI-only flags
        config.verbose = cli.verbose;
        config.debug = cli.debug;

        if config.debug {
            eprintln!("Applied CLI overrides to configuration");
            eprintln!(
                "Final config: runs={}, cooldown={}ms, timeout={}s, provider={}",
                config.total_runs, config.cooldown_ms, config.attempt_timeout_secs, config.provider
            );
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Runs: {}", config.total_runs));
    summary.push(format!("Cooldown: {}ms", config.cooldown_ms));
    summary.push(format!("Timeout: {}s", config.attempt_timeout_secs));
    summary.push(format!("Provider: {}", config.provider));
    summary.push(format!("Endpoint: {}", config.endpoint));
    if let Some(seed) = config.seed {
        summary.push(format!("Seed: {}", seed));
    }
    summary.push(format!(
        "Location: {}",
        config.location.as_deref().unwrap_or("(none)")
    ));
    if let Some(history_file) = &config.history_file {
        summary.push(format!("History file: {}", history_file.display()));
    }
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
