//! Main application orchestration and execution

use crate::{
    cli::Cli,
    config::{display_config_summary, load_config, validate_config, Config},
    error::{AppError, Result},
    history::{HistoryStore, LocationSummary},
    logging::Logger,
    models::AggregateResult,
    output::{format_share_text, OutputCoordinator, SessionReport},
    provider::{MeasurementAdapter, MeasurementProvider},
    publisher::{ResultPublisher, RunProgress, SessionObserver},
    sequencer::{RunSequencer, SequencerConfig, SessionOutcome, CANCELLED_REASON},
    types::Confidence,
};
use std::sync::Arc;

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    /// Create a new application instance with CLI configuration
    pub fn new(cli: Cli) -> Result<Self> {
        cli.validate().map_err(AppError::validation)?;
        Ok(Self { cli })
    }

    /// Run the application
    pub async fn run(self) -> Result<()> {
        if self.cli.should_show_topic_help() {
            println!("{}", self.cli.display_help());
            return Ok(());
        }

        if let Some(count) = self.cli.confidence_for {
            println!("{}", confidence_line(count, self.cli.json)?);
            return Ok(());
        }

        let config = load_config(self.cli.clone())?;

        if config.debug {
            eprintln!(
                "{} v{} ({}, built {} for {})",
                crate::PKG_NAME,
                crate::VERSION,
                crate::GIT_COMMIT,
                crate::BUILD_TIME,
                crate::TARGET_TRIPLE
            );
            eprintln!("\nConfiguration Summary:");
            eprintln!("{}\n", display_config_summary(&config));
        }

        let warnings = validate_config(&config)?;
        if !warnings.is_empty() && !self.cli.json {
            eprintln!("Configuration Warnings:");
            for warning in &warnings {
                eprintln!("  {}", warning.format(config.enable_color));
            }
            eprintln!();
        }

        let logger = Logger::with_config(crate::PKG_NAME.to_string(), &config);
        let coordinator = Arc::new(OutputCoordinator::from_preferences(config.enable_color, config.verbose));

        let provider = Arc::new(MeasurementAdapter::connect(&config, &logger).await?);
        let provider_kind = provider.kind();

        let publisher = ResultPublisher::new(logger.named("publisher")).with_observer(Arc::new(ConsoleProgress {
            coordinator: coordinator.clone(),
        }));

        let sequencer = Arc::new(RunSequencer::new(
            provider,
            Arc::new(publisher),
            SequencerConfig::from(&config),
            logger.named("sequencer"),
        ));

        if !self.cli.json {
            eprintln!(
                "Running {} speed test{} ({})...",
                config.total_runs,
                if config.total_runs == 1 { "" } else { "s" },
                provider_kind
            );
        }

        let interrupt = {
            let sequencer = sequencer.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    sequencer.cancel();
                }
            })
        };
        let outcome = sequencer.run_session().await;
        interrupt.abort();

        match outcome? {
            SessionOutcome::Completed { result, runs } => {
                // A history problem must not cost the user the measurement
                let (history, history_error) = match record_history(&config, &result) {
                    Ok(history) => (history, None),
                    Err(error) => (None, Some(error)),
                };
                let report = SessionReport::new(result, runs, provider_kind, config.location.clone())?;

                if self.cli.json {
                    println!("{}", report.to_json()?);
                } else {
                    println!("{}", coordinator.display_report(&report, history.as_ref())?);
                    if self.cli.share {
                        println!("\n{}", format_share_text(&report.aggregate, config.location.as_deref()));
                    }
                }

                if let Some(error) = history_error {
                    logger.warn("Result was not saved to location history")
                        .field("error", error.to_string())
                        .error_info(&error)
                        .log()
                        .await;
                }

                Ok(())
            }
            SessionOutcome::Failed { reason } if reason == CANCELLED_REASON => {
                Err(AppError::cancelled("interrupted before all runs finished"))
            }
            SessionOutcome::Failed { reason } => Err(AppError::session_failed(reason)),
            SessionOutcome::Ignored => Err(AppError::internal("A session was already running")),
        }
    }
}

/// Chain a bug-report hint onto the current panic hook.
///
/// The hook only reports and never exits, so a panic raised inside a session
/// observer unwinds back to the publisher, which logs it and keeps going.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        previous(info);
        eprintln!("If cst stopped here, please report this issue with the command you ran.");
    }));
}

/// Store the aggregate under the configured location and summarize its history
fn record_history(config: &Config, aggregate: &AggregateResult) -> Result<Option<LocationSummary>> {
    let Some(location) = config.location.as_deref() else {
        return Ok(None);
    };

    let store = HistoryStore::new(config.history_file.clone().unwrap_or_else(HistoryStore::default_path));
    store.record(location, aggregate)?;
    store.location_summary(location).map(Some)
}

fn confidence_line(count: usize, json: bool) -> Result<String> {
    let confidence = Confidence::from_sample_count(count);
    if json {
        Ok(serde_json::to_string(&serde_json::json!({
            "test_count": count,
            "confidence": confidence,
        }))?)
    } else {
        Ok(format!(
            "{} test{}: {} confidence",
            count,
            if count == 1 { "" } else { "s" },
            confidence
        ))
    }
}

/// Prints one line per resolved run on stderr
struct ConsoleProgress {
    coordinator: Arc<OutputCoordinator>,
}

impl SessionObserver for ConsoleProgress {
    fn on_progress(&self, progress: &RunProgress) -> Result<()> {
        eprintln!("{}", self.coordinator.display_run_progress(progress)?);
        Ok(())
    }
}
