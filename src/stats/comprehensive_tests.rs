//! Comprehensive tests for aggregation and confidence classification
//!
//! This module contains property-based tests and edge case testing
//! for the aggregator and its rounding policy.

use super::{aggregate, partial_mean, round_to_tenth};
use crate::{
    error::AppError,
    models::measurement::{RunResult, RunSpread},
    types::Confidence,
};
use proptest::collection::vec;
use proptest::prelude::*;

/// Property-based test generators
mod generators {
    use super::*;

    /// Generate a plausible run result
    pub fn run_result() -> impl Strategy<Value = RunResult> {
        (0.0f64..1000.0, 0.0f64..500.0, 0.0f64..2000.0, 0.0f64..200.0)
            .prop_map(|(download, upload, ping, jitter)| RunResult {
                download,
                upload,
                ping,
                jitter,
            })
    }

    /// Generate a non-empty session's worth of results
    pub fn run_results() -> impl Strategy<Value = Vec<RunResult>> {
        vec(run_result(), 1..60)
    }
}

fn mean_of(results: &[RunResult], metric: impl Fn(&RunResult) -> f64) -> f64 {
    results.iter().map(metric).sum::<f64>() / results.len() as f64
}

/// Test mathematical properties of aggregation
mod property_tests {
    use super::*;

    proptest! {
        /// Sample count always equals the number of inputs
        #[test]
        fn sample_count_matches_input(results in generators::run_results()) {
            let aggregate = aggregate(&results).unwrap();
            prop_assert_eq!(aggregate.sample_count, results.len());
            prop_assert_eq!(aggregate.confidence, Confidence::from_sample_count(results.len()));
        }

        /// Each metric is the arithmetic mean within rounding tolerance
        #[test]
        fn metrics_are_rounded_means(results in generators::run_results()) {
            let aggregate = aggregate(&results).unwrap();

            prop_assert!((aggregate.download - mean_of(&results, |r| r.download)).abs() <= 0.05 + 1e-9);
            prop_assert!((aggregate.upload - mean_of(&results, |r| r.upload)).abs() <= 0.05 + 1e-9);
            prop_assert!((aggregate.jitter - mean_of(&results, |r| r.jitter)).abs() <= 0.05 + 1e-9);
            prop_assert!((aggregate.ping - mean_of(&results, |r| r.ping)).abs() <= 0.5 + 1e-9);
        }

        /// Ping is reported as a whole number of milliseconds
        #[test]
        fn ping_is_integral(results in generators::run_results()) {
            let aggregate = aggregate(&results).unwrap();
            prop_assert_eq!(aggregate.ping.fract(), 0.0);
        }

        /// Aggregated values never fall outside the observed range (up to rounding)
        #[test]
        fn mean_within_spread(results in generators::run_results()) {
            let aggregate = aggregate(&results).unwrap();
            let spread = RunSpread::from_results(&results).unwrap();

            prop_assert!(aggregate.download >= spread.download.min - 0.05 - 1e-9);
            prop_assert!(aggregate.download <= spread.download.max + 0.05 + 1e-9);
            prop_assert!(spread.download.min <= spread.download.median);
            prop_assert!(spread.download.median <= spread.download.max);
        }

        /// The partial mean of the full set matches the final aggregate
        #[test]
        fn partial_mean_of_full_session_matches_aggregate(results in generators::run_results()) {
            let aggregate = aggregate(&results).unwrap();
            let partial = partial_mean(&results).unwrap();

            prop_assert_eq!(partial.download, aggregate.download);
            prop_assert_eq!(partial.upload, aggregate.upload);
            prop_assert_eq!(partial.ping, aggregate.ping);
            prop_assert_eq!(partial.jitter, aggregate.jitter);
        }

        /// Confidence never decreases as the sample count grows
        #[test]
        fn confidence_is_monotonic(a in 0usize..10_000, b in 0usize..10_000) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(Confidence::from_sample_count(low) <= Confidence::from_sample_count(high));
        }

        /// Rounding to a tenth moves a value by at most half a tenth
        #[test]
        fn rounding_error_bounded(value in 0.0f64..100_000.0) {
            prop_assert!((round_to_tenth(value) - value).abs() <= 0.05 + 1e-9);
        }
    }
}

/// Test edge cases and boundary conditions
mod edge_case_tests {
    use super::*;

    #[test]
    fn test_empty_result_set() {
        assert_eq!(aggregate(&[]), Err(AppError::EmptyResultSet));
    }

    #[test]
    fn test_all_zero_runs() {
        let results = vec![RunResult { download: 0.0, upload: 0.0, ping: 0.0, jitter: 0.0 }; 3];
        let aggregate = aggregate(&results).unwrap();

        assert_eq!(aggregate.download, 0.0);
        assert_eq!(aggregate.ping, 0.0);
        assert_eq!(aggregate.sample_count, 3);
    }

    #[test]
    fn test_identical_runs() {
        let results = vec![RunResult { download: 48.2, upload: 11.7, ping: 23.0, jitter: 4.1 }; 10];
        let aggregate = aggregate(&results).unwrap();

        assert!((aggregate.download - 48.2).abs() < 1e-9);
        assert!((aggregate.upload - 11.7).abs() < 1e-9);
        assert_eq!(aggregate.ping, 23.0);
        assert_eq!(aggregate.confidence, Confidence::Medium);
    }

    #[test]
    fn test_confidence_boundaries() {
        assert_eq!(Confidence::from_sample_count(Confidence::MEDIUM_THRESHOLD - 1), Confidence::Low);
        assert_eq!(Confidence::from_sample_count(Confidence::MEDIUM_THRESHOLD), Confidence::Medium);
        assert_eq!(Confidence::from_sample_count(Confidence::HIGH_THRESHOLD - 1), Confidence::Medium);
        assert_eq!(Confidence::from_sample_count(Confidence::HIGH_THRESHOLD), Confidence::High);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let forward = vec![
            RunResult { download: 20.0, upload: 5.0, ping: 30.0, jitter: 2.0 },
            RunResult { download: 24.0, upload: 6.0, ping: 28.0, jitter: 3.0 },
            RunResult { download: 22.0, upload: 4.0, ping: 32.0, jitter: 2.0 },
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = aggregate(&forward).unwrap();
        let b = aggregate(&reversed).unwrap();
        assert_eq!(a.download, b.download);
        assert_eq!(a.upload, b.upload);
        assert_eq!(a.ping, b.ping);
        assert_eq!(a.jitter, b.jitter);
    }
}
