//! Output formatting and display system
//!
//! This module provides a flexible output formatting system for session
//! results, supporting both colored and plain text output with table
//! formatting, plus the JSON report and share text.

mod colored;
mod formatter;
mod report;

pub use colored::{ColorScheme, ColoredFormatter, SpeedLevel};
pub use formatter::{Alignment, Column, FormattingOptions, OutputFormatter, PlainFormatter, RowData, TableFormat};
pub use report::{format_share_text, format_speed, SessionReport};

use crate::{error::Result, history::LocationSummary, publisher::RunProgress};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter + Send + Sync> {
        let options = FormattingOptions {
            enable_color,
            show_individual_results: verbose,
            table_borders: true,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }
}

/// Main output coordinator that handles all result display
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter + Send + Sync>,
    show_individual_results: bool,
}

impl OutputCoordinator {
    pub fn new(formatter: Box<dyn OutputFormatter + Send + Sync>, show_individual_results: bool) -> Self {
        Self {
            formatter,
            show_individual_results,
        }
    }

    /// Create a coordinator from color and verbosity preferences
    pub fn from_preferences(enable_color: bool, verbose: bool) -> Self {
        Self::new(OutputFormatterFactory::create_formatter(enable_color, verbose), verbose)
    }

    pub fn formatter(&self) -> &(dyn OutputFormatter + Send + Sync) {
        self.formatter.as_ref()
    }

    /// Human-readable rendering of a completed session
    pub fn display_report(&self, report: &SessionReport, history: Option<&LocationSummary>) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.formatter.format_header("Café Speed Test")?);
        output.push_str("\n\n");

        if let Some(location) = &report.location {
            output.push_str(&format!("Location: {}\n", location));
        }
        output.push_str(&format!("Provider: {}\n\n", report.provider));

        output.push_str(&self.formatter.format_aggregate(&report.aggregate)?);

        if self.show_individual_results && !report.runs.is_empty() {
            output.push_str("\n\n");
            output.push_str(&self.formatter.format_runs_table(&report.runs, &report.spread)?);
        }

        if let Some(summary) = history {
            output.push_str("\n\n");
            output.push_str(&self.formatter.format_location_summary(summary)?);
        }

        Ok(output)
    }

    /// One-line progress for a resolved run
    pub fn display_run_progress(&self, progress: &RunProgress) -> Result<String> {
        self.formatter.format_run_progress(progress)
    }
}
