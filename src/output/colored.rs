//! Colored formatter implementation with terminal color support
//!
//! Speeds and latencies are colored by how usable they are for remote work,
//! and confidence tiers get their own colors so a Low-confidence result is
//! visibly tentative.

use super::formatter::{
    create_table, runs_table_format, runs_table_rows, FormattingOptions, OutputFormatter, PlainFormatter,
};
use crate::{
    error::{AppError, Result},
    history::LocationSummary,
    models::{AggregateResult, RunResult, RunSpread},
    publisher::RunProgress,
    types::Confidence,
};
use colored::*;
use std::fmt::Write as _;

/// Usability classification for color coding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SpeedLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl SpeedLevel {
    /// Classify a download throughput in Mbps
    pub fn from_download(mbps: f64) -> Self {
        if mbps >= 100.0 {
            Self::Excellent
        } else if mbps >= 50.0 {
            Self::Good
        } else if mbps >= 25.0 {
            Self::Fair
        } else if mbps >= 10.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    /// Classify an upload throughput in Mbps
    pub fn from_upload(mbps: f64) -> Self {
        Self::from_download(mbps * 4.0)
    }

    /// Classify a round-trip latency in milliseconds
    pub fn from_ping(ms: f64) -> Self {
        if ms < 20.0 {
            Self::Excellent
        } else if ms < 40.0 {
            Self::Good
        } else if ms < 80.0 {
            Self::Fair
        } else if ms < 150.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    /// Get color for this level
    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Magenta,
            Self::VeryPoor => Color::Red,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            muted: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    plain_formatter: PlainFormatter,
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    /// Create a colored formatter with custom color scheme
    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self {
            plain_formatter: PlainFormatter::new(options.clone()),
            options,
            color_scheme,
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn confidence_color(&self, confidence: Confidence) -> Color {
        match confidence {
            Confidence::High => self.color_scheme.success,
            Confidence::Medium => self.color_scheme.info,
            Confidence::Low => self.color_scheme.warning,
        }
    }

    fn level_label(&self, level: SpeedLevel) -> ColoredString {
        self.colorize(&format!("({})", level.description()), self.color_scheme.muted)
    }
}

fn fmt_err(e: std::fmt::Error) -> AppError {
    AppError::internal(format!("Failed to format output: {}", e))
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let border = "═".repeat(title.chars().count() + 4);
        let mut output = String::new();

        writeln!(output, "{}", self.colorize(&border, self.color_scheme.header)).map_err(fmt_err)?;
        writeln!(output, "  {}  ", self.colorize(title, self.color_scheme.header).bold()).map_err(fmt_err)?;
        write!(output, "{}", self.colorize(&border, self.color_scheme.header)).map_err(fmt_err)?;

        Ok(output)
    }

    fn format_run_progress(&self, progress: &RunProgress) -> Result<String> {
        let latest = &progress.latest;
        Ok(format!(
            "{} {} {} down, {} up, {} ping {}",
            self.colorize("▸", self.color_scheme.info),
            self.colorize(
                &format!("Test {}/{} complete:", progress.completed_runs, progress.total_runs),
                self.color_scheme.info
            ),
            self.colorize(&format!("{:.1} Mbps", latest.download), SpeedLevel::from_download(latest.download).color()),
            self.colorize(&format!("{:.1} Mbps", latest.upload), SpeedLevel::from_upload(latest.upload).color()),
            self.colorize(&format!("{:.0} ms", latest.ping), SpeedLevel::from_ping(latest.ping).color()),
            self.colorize(
                &format!("(avg so far {:.1} Mbps down)", progress.partial_mean.download),
                self.color_scheme.muted
            ),
        ))
    }

    fn format_aggregate(&self, result: &AggregateResult) -> Result<String> {
        let download_level = SpeedLevel::from_download(result.download);
        let upload_level = SpeedLevel::from_upload(result.upload);
        let ping_level = SpeedLevel::from_ping(result.ping);
        let mut output = String::new();

        writeln!(output, "{}", self.colorize("Speed Test Results", self.color_scheme.header).bold()).map_err(fmt_err)?;
        writeln!(
            output,
            "  Download:   {} {}",
            self.colorize(&result.format_download(), download_level.color()).bold(),
            self.level_label(download_level)
        )
        .map_err(fmt_err)?;
        writeln!(
            output,
            "  Upload:     {} {}",
            self.colorize(&result.format_upload(), upload_level.color()).bold(),
            self.level_label(upload_level)
        )
        .map_err(fmt_err)?;
        writeln!(
            output,
            "  Ping:       {} {}",
            self.colorize(&result.format_ping(), ping_level.color()).bold(),
            self.level_label(ping_level)
        )
        .map_err(fmt_err)?;
        writeln!(output, "  Jitter:     {}", result.format_jitter()).map_err(fmt_err)?;
        write!(
            output,
            "  Confidence: {} {}",
            self.colorize(result.confidence.label(), self.confidence_color(result.confidence)).bold(),
            self.colorize(
                &format!(
                    "(average of {} test{})",
                    result.sample_count,
                    if result.sample_count == 1 { "" } else { "s" }
                ),
                self.color_scheme.muted
            )
        )
        .map_err(fmt_err)?;

        Ok(output)
    }

    fn format_runs_table(&self, runs: &[RunResult], spread: &RunSpread) -> Result<String> {
        let format = runs_table_format(self.options.table_borders);
        let table = create_table(&format, &runs_table_rows(runs, spread));

        if !self.options.enable_color {
            return Ok(table);
        }

        // Only the border lines are tinted; cell contents keep their padding intact
        let colored: Vec<String> = table
            .lines()
            .map(|line| {
                if line.starts_with('+') {
                    line.color(self.color_scheme.muted).to_string()
                } else {
                    line.to_string()
                }
            })
            .collect();
        Ok(colored.join("\n"))
    }

    fn format_location_summary(&self, summary: &LocationSummary) -> Result<String> {
        let plain = self.plain_formatter.format_location_summary(summary)?;
        if !self.options.enable_color {
            return Ok(plain);
        }

        let tinted = plain.replacen(
            &format!("confidence {}", summary.confidence),
            &format!(
                "confidence {}",
                summary.confidence.label().color(self.confidence_color(summary.confidence)).bold()
            ),
            1,
        );
        Ok(tinted)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("✗", self.color_scheme.error).bold(), self.colorize(error, self.color_scheme.error)))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("⚠", self.color_scheme.warning).bold(), self.colorize(warning, self.color_scheme.warning)))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("✓", self.color_scheme.success).bold(), self.colorize(message, self.color_scheme.success)))
    }
}
