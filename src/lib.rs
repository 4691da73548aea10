//! Café Speed Tester
//!
//! Multi-run network speed measurement with confidence scoring. A session
//! runs a fixed number of measurement attempts one after another, publishes
//! progress as each attempt resolves and reports the rounded mean together
//! with a confidence level derived from the sample count.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod models;
pub mod output;
pub mod provider;
pub mod publisher;
pub mod sequencer;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{AggregateResult, Config, RunResult};
pub use output::{ColoredFormatter, OutputCoordinator, OutputFormatter, OutputFormatterFactory, PlainFormatter};
pub use provider::{MeasurementAdapter, MeasurementProvider};
pub use publisher::{ResultPublisher, SessionObserver};
pub use sequencer::{RunSequencer, SessionOutcome};
pub use types::Confidence;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build metadata injected by build.rs
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const TARGET_TRIPLE: &str = env!("TARGET_TRIPLE");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_TOTAL_RUNS: usize = 3;
    pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(500);
    pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_ENDPOINT: &str = "https://speed.cloudflare.com";
    pub const DEFAULT_DOWNLOAD_BYTES: u64 = 10_000_000;
    pub const DEFAULT_UPLOAD_BYTES: usize = 2_000_000;
    pub const DEFAULT_PING_SAMPLES: usize = 5;
    pub const DEFAULT_SIMULATED_STEP: Duration = Duration::from_millis(100);
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    pub const MAX_RUNS: usize = 50;
    pub const MAX_COOLDOWN_MS: u64 = 10_000;
    pub const MAX_TIMEOUT_SECS: u64 = 600;
}
