//! Core formatting traits and implementations
//!
//! This module defines the output formatting interface and provides
//! a plain text implementation with table formatting capabilities.

use crate::{
    error::{AppError, Result},
    history::LocationSummary,
    models::{AggregateResult, MetricSpread, RunResult, RunSpread},
    publisher::RunProgress,
};
use std::fmt::Write as _;

/// Main trait for output formatting
pub trait OutputFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// One-line status for a resolved run
    fn format_run_progress(&self, progress: &RunProgress) -> Result<String>;

    /// Format the averaged session result
    fn format_aggregate(&self, result: &AggregateResult) -> Result<String>;

    /// Format per-run results with their spread
    fn format_runs_table(&self, runs: &[RunResult], spread: &RunSpread) -> Result<String>;

    /// Format what the history knows about a location
    fn format_location_summary(&self, summary: &LocationSummary) -> Result<String>;

    /// Format error messages
    fn format_error(&self, error: &str) -> Result<String>;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> Result<String>;

    /// Format success messages
    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Show individual runs after the aggregate
    pub show_individual_results: bool,
    /// Show table borders
    pub table_borders: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            show_individual_results: false,
            table_borders: true,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    /// Column definitions
    pub columns: Vec<Column>,
    /// Show borders around table
    pub show_borders: bool,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
}

impl Column {
    pub fn left(header: &str) -> Self {
        Self { header: header.to_string(), alignment: Alignment::Left }
    }

    pub fn right(header: &str) -> Self {
        Self { header: header.to_string(), alignment: Alignment::Right }
    }
}

/// Text alignment options
#[derive(Debug, Clone, Copy)]
pub enum Alignment {
    Left,
    Right,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

/// Columns of the per-run table
pub(crate) fn runs_table_format(show_borders: bool) -> TableFormat {
    TableFormat {
        columns: vec![
            Column::left("Run"),
            Column::right("Download"),
            Column::right("Upload"),
            Column::right("Ping"),
            Column::right("Jitter"),
        ],
        show_borders,
    }
}

/// Table rows: one per run, then the min / median / max of each metric
pub(crate) fn runs_table_rows(runs: &[RunResult], spread: &RunSpread) -> Vec<RowData> {
    let mut rows: Vec<RowData> = runs
        .iter()
        .enumerate()
        .map(|(i, run)| {
            vec![
                format!("#{}", i + 1),
                format!("{:.1} Mbps", run.download),
                format!("{:.1} Mbps", run.upload),
                format!("{:.0} ms", run.ping),
                format!("{:.1} ms", run.jitter),
            ]
        })
        .collect();

    let spread_row = |label: &str, pick: fn(&MetricSpread) -> f64| -> RowData {
        vec![
            label.to_string(),
            format!("{:.1} Mbps", pick(&spread.download)),
            format!("{:.1} Mbps", pick(&spread.upload)),
            format!("{:.0} ms", pick(&spread.ping)),
            format!("{:.1} ms", pick(&spread.jitter)),
        ]
    };
    rows.push(spread_row("min", |s| s.min));
    rows.push(spread_row("median", |s| s.median));
    rows.push(spread_row("max", |s| s.max));

    rows
}

/// Render a table; shared by every formatter
pub(crate) fn create_table(format: &TableFormat, rows: &[RowData]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let widths = calculate_column_widths(format, rows);
    let mut output = String::new();

    if format.show_borders {
        output.push_str(&create_horizontal_border(&widths));
        output.push('\n');
    }

    let headers: Vec<String> = format.columns.iter().map(|c| c.header.clone()).collect();
    output.push_str(&create_row(&headers, &widths, format));
    output.push('\n');

    if format.show_borders {
        output.push_str(&create_horizontal_border(&widths));
        output.push('\n');
    }

    for row in rows {
        output.push_str(&create_row(row, &widths, format));
        output.push('\n');
    }

    if format.show_borders {
        output.push_str(&create_horizontal_border(&widths));
    }

    output
}

/// Calculate optimal column widths
fn calculate_column_widths(format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
    let num_columns = format.columns.len().max(rows.iter().map(|r| r.len()).max().unwrap_or(0));

    (0..num_columns)
        .map(|col_idx| {
            let header_width = format.columns.get(col_idx).map(|c| c.header.len()).unwrap_or(0);
            rows.iter()
                .filter_map(|row| row.get(col_idx))
                .map(|cell| cell.chars().count())
                .fold(header_width, usize::max)
        })
        .collect()
}

fn create_row(data: &[String], widths: &[usize], format: &TableFormat) -> String {
    let mut row = String::new();

    if format.show_borders {
        row.push('|');
    }

    for (idx, (cell, &width)) in data.iter().zip(widths.iter()).enumerate() {
        let alignment = format.columns.get(idx).map(|c| c.alignment).unwrap_or(Alignment::Left);
        let padded_cell = align_text(cell, width, alignment);

        if format.show_borders {
            row.push(' ');
            row.push_str(&padded_cell);
            row.push_str(" |");
        } else {
            row.push_str(&padded_cell);
            row.push_str("  ");
        }
    }

    row.trim_end().to_string()
}

fn create_horizontal_border(widths: &[usize]) -> String {
    let mut border = String::new();

    if !widths.is_empty() {
        border.push('+');
        for &width in widths {
            border.push_str(&"-".repeat(width + 2));
            border.push('+');
        }
    }

    border
}

fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }

    let padding = " ".repeat(width - len);
    match alignment {
        Alignment::Left => format!("{}{}", text, padding),
        Alignment::Right => format!("{}{}", padding, text),
    }
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormattingOptions {
        &self.options
    }
}

fn fmt_err(e: std::fmt::Error) -> AppError {
    AppError::internal(format!("Failed to format output: {}", e))
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.len() + 4);

        writeln!(output, "{}", border).map_err(fmt_err)?;
        writeln!(output, "  {}  ", title).map_err(fmt_err)?;
        write!(output, "{}", border).map_err(fmt_err)?;

        Ok(output)
    }

    fn format_run_progress(&self, progress: &RunProgress) -> Result<String> {
        Ok(format!(
            "Test {}/{} complete: {:.1} Mbps down, {:.1} Mbps up, {:.0} ms ping (avg so far {:.1} Mbps down)",
            progress.completed_runs,
            progress.total_runs,
            progress.latest.download,
            progress.latest.upload,
            progress.latest.ping,
            progress.partial_mean.download,
        ))
    }

    fn format_aggregate(&self, result: &AggregateResult) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "Speed Test Results:").map_err(fmt_err)?;
        writeln!(output, "-------------------").map_err(fmt_err)?;
        writeln!(output, "Download:   {}", result.format_download()).map_err(fmt_err)?;
        writeln!(output, "Upload:     {}", result.format_upload()).map_err(fmt_err)?;
        writeln!(output, "Ping:       {}", result.format_ping()).map_err(fmt_err)?;
        writeln!(output, "Jitter:     {}", result.format_jitter()).map_err(fmt_err)?;
        write!(
            output,
            "Confidence: {} (average of {} test{})",
            result.confidence,
            result.sample_count,
            if result.sample_count == 1 { "" } else { "s" }
        )
        .map_err(fmt_err)?;

        Ok(output)
    }

    fn format_runs_table(&self, runs: &[RunResult], spread: &RunSpread) -> Result<String> {
        let format = runs_table_format(self.options.table_borders);
        Ok(create_table(&format, &runs_table_rows(runs, spread)))
    }

    fn format_location_summary(&self, summary: &LocationSummary) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "History for {}:", summary.location).map_err(fmt_err)?;
        write!(
            output,
            "  {} test{} recorded, confidence {}",
            summary.test_count,
            if summary.test_count == 1 { "" } else { "s" },
            summary.confidence
        )
        .map_err(fmt_err)?;

        if let (Some(download), Some(upload), Some(ping)) =
            (summary.mean_download, summary.mean_upload, summary.mean_ping)
        {
            write!(
                output,
                "\n  Typical: {:.1} Mbps down, {:.1} Mbps up, {:.0} ms ping",
                download, upload, ping
            )
            .map_err(fmt_err)?;
        }

        if let (Some(p10), Some(p90)) = (summary.download_p10, summary.download_p90) {
            write!(output, "\n  Download range (p10-p90): {:.1} - {:.1} Mbps", p10, p90).map_err(fmt_err)?;
        }

        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("SUCCESS: {}", message))
    }
}
