//! Data models and structures for the speed measurement engine

pub mod config;
pub mod measurement;
pub mod session;

// Re-export main model types
pub use config::Config;
pub use measurement::{AggregateResult, MetricSpread, RunResult, RunSpread};
pub use session::{SessionSnapshot, TestSession};
