//! Measurement provider adapter
//!
//! A provider runs one opaque measurement attempt and yields a [`RunResult`].
//! Two implementations exist:
//! - [`HttpSpeedProvider`] talks to an HTTP speed-test endpoint
//! - [`SimulatedProvider`] synthesizes bounded random values
//!
//! [`MeasurementAdapter`] picks one of them once, at construction time, and the
//! rest of the system only ever sees the [`MeasurementProvider`] contract.

pub mod http;
pub mod simulated;

pub use http::HttpSpeedProvider;
pub use simulated::SimulatedProvider;

use crate::{
    error::Result,
    logging::Logger,
    models::{Config, RunResult},
    types::{Phase, ProviderKind},
};
use async_trait::async_trait;
use std::sync::Mutex;

/// One measurement backend
#[async_trait]
pub trait MeasurementProvider: Send + Sync {
    /// Which backend this is (never `Auto`)
    fn kind(&self) -> ProviderKind;

    /// Run a single attempt, reporting progress as it goes.
    ///
    /// Resolves with a complete result or fails; it never yields partial values.
    async fn run_attempt(&self, progress: &ProgressSink<'_>) -> Result<RunResult>;
}

/// Forwards phase progress to a callback while enforcing ordering.
///
/// Fractions are clamped to `[0, 1]`. An update that would move back to an
/// earlier phase, or lower the fraction within the current phase, is dropped.
pub struct ProgressSink<'a> {
    callback: Box<dyn Fn(Phase, f64) + Send + Sync + 'a>,
    last: Mutex<Option<(Phase, f64)>>,
}

impl<'a> ProgressSink<'a> {
    pub fn new(callback: impl Fn(Phase, f64) + Send + Sync + 'a) -> Self {
        Self {
            callback: Box::new(callback),
            last: Mutex::new(None),
        }
    }

    /// A sink that discards every update
    pub fn noop() -> ProgressSink<'static> {
        ProgressSink::new(|_, _| {})
    }

    /// Report progress; returns whether the update was forwarded
    pub fn report(&self, phase: Phase, fraction: f64) -> bool {
        if fraction.is_nan() {
            return false;
        }
        let fraction = fraction.clamp(0.0, 1.0);

        {
            let mut last = match self.last.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some((last_phase, last_fraction)) = *last {
                if phase < last_phase || (phase == last_phase && fraction < last_fraction) {
                    return false;
                }
            }
            *last = Some((phase, fraction));
        }

        (self.callback)(phase, fraction);
        true
    }

    /// Last forwarded update
    pub fn last(&self) -> Option<(Phase, f64)> {
        match self.last.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// The provider selected for this process
pub enum MeasurementAdapter {
    Real(HttpSpeedProvider),
    Simulated(SimulatedProvider),
}

impl MeasurementAdapter {
    /// Select and initialize a provider.
    ///
    /// `Http` requires the endpoint probe to succeed. `Auto` falls back to the
    /// simulated generator when the probe fails; the choice is final for the
    /// lifetime of the adapter.
    pub async fn connect(config: &Config, logger: &Logger) -> Result<Self> {
        match config.provider {
            ProviderKind::Simulated => Ok(Self::simulated(config)),
            ProviderKind::Http => {
                let provider = HttpSpeedProvider::new(config)?;
                provider.probe().await?;
                logger.info("Using HTTP speed-test provider")
                    .field("endpoint", provider.endpoint())
                    .log()
                    .await;
                Ok(Self::Real(provider))
            }
            ProviderKind::Auto => {
                let probed = match HttpSpeedProvider::new(config) {
                    Ok(provider) => provider.probe().await.map(|_| provider),
                    Err(e) => Err(e),
                };

                match probed {
                    Ok(provider) => {
                        logger.info("Using HTTP speed-test provider")
                            .field("endpoint", provider.endpoint())
                            .log()
                            .await;
                        Ok(Self::Real(provider))
                    }
                    Err(e) => {
                        logger.warn("Speed-test endpoint unavailable, falling back to simulated measurements")
                            .field("endpoint", &config.endpoint)
                            .error_info(&e)
                            .field("reason", e.to_string())
                            .log()
                            .await;
                        Ok(Self::simulated(config))
                    }
                }
            }
        }
    }

    fn simulated(config: &Config) -> Self {
        Self::Simulated(SimulatedProvider::new(config.seed, config.simulated_step()))
    }
}

#[async_trait]
impl MeasurementProvider for MeasurementAdapter {
    fn kind(&self) -> ProviderKind {
        match self {
            Self::Real(provider) => provider.kind(),
            Self::Simulated(provider) => provider.kind(),
        }
    }

    async fn run_attempt(&self, progress: &ProgressSink<'_>) -> Result<RunResult> {
        let result = match self {
            Self::Real(provider) => provider.run_attempt(progress).await?,
            Self::Simulated(provider) => provider.run_attempt(progress).await?,
        };
        result.validate()?;
        Ok(result)
    }
}
