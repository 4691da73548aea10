//! Aggregation of per-run measurements into a single reported result

use crate::{
    error::{AppError, Result},
    models::measurement::{AggregateResult, MetricSpread, RunResult, RunSpread},
    types::Confidence,
};
use chrono::Utc;

/// Reduce a session's runs to their per-metric arithmetic mean.
///
/// Download, upload and jitter are rounded to one decimal place and ping to
/// the nearest whole millisecond. An empty slice is an error, never a zero result.
pub fn aggregate(results: &[RunResult]) -> Result<AggregateResult> {
    if results.is_empty() {
        return Err(AppError::EmptyResultSet);
    }

    let mean = raw_mean(results);
    let sample_count = results.len();

    Ok(AggregateResult {
        download: round_to_tenth(mean.download),
        upload: round_to_tenth(mean.upload),
        ping: mean.ping.round(),
        jitter: round_to_tenth(mean.jitter),
        sample_count,
        confidence: Confidence::from_sample_count(sample_count),
        timestamp: Utc::now(),
    })
}

/// Unrounded per-metric mean; callers guarantee `results` is non-empty
pub(crate) fn raw_mean(results: &[RunResult]) -> RunResult {
    let count = results.len() as f64;
    let sum = results.iter().fold(
        RunResult { download: 0.0, upload: 0.0, ping: 0.0, jitter: 0.0 },
        |acc, run| RunResult {
            download: acc.download + run.download,
            upload: acc.upload + run.upload,
            ping: acc.ping + run.ping,
            jitter: acc.jitter + run.jitter,
        },
    );

    RunResult {
        download: sum.download / count,
        upload: sum.upload / count,
        ping: sum.ping / count,
        jitter: sum.jitter / count,
    }
}

/// Running mean of the runs collected so far, rounded like the final aggregate
pub fn partial_mean(results: &[RunResult]) -> Option<RunResult> {
    if results.is_empty() {
        return None;
    }

    let mean = raw_mean(results);
    Some(RunResult {
        download: round_to_tenth(mean.download),
        upload: round_to_tenth(mean.upload),
        ping: mean.ping.round(),
        jitter: round_to_tenth(mean.jitter),
    })
}

impl RunSpread {
    /// Compute min / median / max per metric
    pub fn from_results(results: &[RunResult]) -> Result<Self> {
        if results.is_empty() {
            return Err(AppError::EmptyResultSet);
        }

        Ok(Self {
            download: spread_of(results.iter().map(|r| r.download)),
            upload: spread_of(results.iter().map(|r| r.upload)),
            ping: spread_of(results.iter().map(|r| r.ping)),
            jitter: spread_of(results.iter().map(|r| r.jitter)),
        })
    }
}

fn spread_of(values: impl Iterator<Item = f64>) -> MetricSpread {
    let mut sorted: Vec<f64> = values.collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let len = sorted.len();
    let median = if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    };

    MetricSpread {
        min: sorted[0],
        median,
        max: sorted[len - 1],
    }
}

/// Round to one decimal place
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Linear-interpolated percentile of an unsorted sample, `p` in `[0, 100]`
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

#[cfg(test)]
mod comprehensive_tests;
