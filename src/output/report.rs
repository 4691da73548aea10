//! Machine-readable session report and human share text

use crate::{
    error::Result,
    models::{AggregateResult, RunResult, RunSpread},
    types::ProviderKind,
};
use serde::{Deserialize, Serialize};

/// Everything known about a completed session, as printed by `--json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub aggregate: AggregateResult,
    /// Individual runs in the order they completed
    pub runs: Vec<RunResult>,
    pub spread: RunSpread,
    pub provider: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl SessionReport {
    pub fn new(
        aggregate: AggregateResult,
        runs: Vec<RunResult>,
        provider: ProviderKind,
        location: Option<String>,
    ) -> Result<Self> {
        let spread = RunSpread::from_results(&runs)?;
        Ok(Self {
            aggregate,
            runs,
            spread,
            provider,
            location,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Format a throughput at the one-decimal precision of the aggregate
pub fn format_speed(mbps: f64) -> String {
    format!("{:.1} Mbps", mbps)
}

/// One-paragraph summary suitable for pasting into a chat or review
pub fn format_share_text(result: &AggregateResult, location: Option<&str>) -> String {
    let place = match location.map(str::trim).filter(|l| !l.is_empty()) {
        Some(location) => format!("at {}", location),
        None => "here".to_string(),
    };

    format!(
        "WiFi speed {}: {} down / {} up, {} ping, {} jitter. \
         Average of {} test{} ({} confidence), measured {}.",
        place,
        format_speed(result.download),
        format_speed(result.upload),
        result.format_ping(),
        result.format_jitter(),
        result.sample_count,
        if result.sample_count == 1 { "" } else { "s" },
        result.confidence.label().to_lowercase(),
        result.timestamp.format("%Y-%m-%d %H:%M UTC"),
    )
}
