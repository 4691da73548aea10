//! Simulated measurement provider
//!
//! Used when no real endpoint is reachable. Values are drawn uniformly from
//! plausible ranges for a café network and rounded the way real results are
//! displayed.

use super::{MeasurementProvider, ProgressSink};
use crate::{
    error::Result,
    models::RunResult,
    stats::round_to_tenth,
    types::{Phase, ProviderKind},
};
use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{ops::RangeInclusive, sync::Mutex, time::Duration};

pub const DOWNLOAD_RANGE: RangeInclusive<f64> = 20.0..=100.0;
pub const UPLOAD_RANGE: RangeInclusive<f64> = 4.0..=30.0;
pub const PING_RANGE: RangeInclusive<f64> = 10.0..=90.0;
pub const JITTER_RANGE: RangeInclusive<f64> = 1.0..=10.0;

/// Progress updates emitted per phase
const STEPS_PER_PHASE: u32 = 10;

/// Generates synthetic but well-formed run results
pub struct SimulatedProvider {
    rng: Mutex<StdRng>,
    step_delay: Duration,
}

impl SimulatedProvider {
    /// `seed` makes the sequence reproducible; `step_delay` paces progress updates
    pub fn new(seed: Option<u64>, step_delay: Duration) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            rng: Mutex::new(rng),
            step_delay,
        }
    }

    fn sample(&self) -> RunResult {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        RunResult {
            download: round_to_tenth(rng.gen_range(DOWNLOAD_RANGE)),
            upload: round_to_tenth(rng.gen_range(UPLOAD_RANGE)),
            ping: rng.gen_range(PING_RANGE).round(),
            jitter: round_to_tenth(rng.gen_range(JITTER_RANGE)),
        }
    }
}

#[async_trait]
impl MeasurementProvider for SimulatedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Simulated
    }

    async fn run_attempt(&self, progress: &ProgressSink<'_>) -> Result<RunResult> {
        for phase in Phase::ALL {
            progress.report(phase, 0.0);
            for step in 1..=STEPS_PER_PHASE {
                if !self.step_delay.is_zero() {
                    tokio::time::sleep(self.step_delay).await;
                }
                progress.report(phase, step as f64 / STEPS_PER_PHASE as f64);
            }
        }

        Ok(self.sample())
    }
}
