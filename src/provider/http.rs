//! HTTP speed-test provider
//!
//! Works against Cloudflare-style endpoints: `__down?bytes=N` returns N bytes
//! and `__up` accepts an arbitrary POST body. Ping is sampled with zero-byte
//! downloads, so a single base URL is enough.

use super::{MeasurementProvider, ProgressSink};
use crate::{
    error::{AppError, Result},
    models::{Config, RunResult},
    types::{Phase, ProviderKind},
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Url};
use std::time::{Duration, Instant};

/// Deadline for the initialization probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Download progress is reported at most this often
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Speed-test provider backed by an HTTP endpoint
pub struct HttpSpeedProvider {
    client: Client,
    base_url: Url,
    download_bytes: u64,
    upload_bytes: usize,
    ping_samples: usize,
}

impl HttpSpeedProvider {
    /// Build a provider from configuration; performs no network I/O
    pub fn new(config: &Config) -> Result<Self> {
        let mut base_url = Url::parse(&config.endpoint)
            .map_err(|e| AppError::config(format!("Invalid endpoint URL '{}': {}", config.endpoint, e)))?;

        // Url::join replaces the last path segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(config.attempt_timeout())
            .user_agent(concat!("cafe-speed-tester/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::measurement(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            download_bytes: config.download_bytes,
            upload_bytes: config.upload_bytes,
            ping_samples: config.ping_samples.max(2),
        })
    }

    /// Base URL of the endpoint
    pub fn endpoint(&self) -> &str {
        self.base_url.as_str()
    }

    /// Verify the endpoint answers before any session relies on it
    pub async fn probe(&self) -> Result<()> {
        let url = self.download_url(0)?;
        let response = self.client
            .get(url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::measurement(format!(
                "Speed-test endpoint answered the probe with status {}",
                response.status()
            )));
        }

        Ok(())
    }

    fn download_url(&self, bytes: u64) -> Result<Url> {
        let mut url = self.base_url.join("__down")?;
        url.query_pairs_mut().append_pair("bytes", &bytes.to_string());
        Ok(url)
    }

    fn upload_url(&self) -> Result<Url> {
        Ok(self.base_url.join("__up")?)
    }

    /// Sample round trips; returns `(ping_ms, jitter_ms)`
    async fn measure_latency(&self, progress: &ProgressSink<'_>) -> Result<(f64, f64)> {
        let url = self.download_url(0)?;
        let mut samples = Vec::with_capacity(self.ping_samples);

        progress.report(Phase::PingJitter, 0.0);
        for i in 0..self.ping_samples {
            let start = Instant::now();
            let response = self.client.get(url.clone()).send().await?;
            if !response.status().is_success() {
                return Err(AppError::measurement(format!(
                    "Latency probe failed with status {}",
                    response.status()
                )));
            }
            response.bytes().await?;
            samples.push(start.elapsed().as_secs_f64() * 1000.0);

            progress.report(Phase::PingJitter, (i + 1) as f64 / self.ping_samples as f64);
        }

        Ok(latency_stats(&samples))
    }

    /// Stream the download payload; returns Mbps
    async fn measure_download(&self, progress: &ProgressSink<'_>) -> Result<f64> {
        let url = self.download_url(self.download_bytes)?;

        progress.report(Phase::Download, 0.0);
        let start = Instant::now();
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::measurement(format!(
                "Download failed with status {}",
                response.status()
            )));
        }

        let expected = response.content_length().unwrap_or(self.download_bytes).max(1);
        let mut received: u64 = 0;
        let mut last_update = Instant::now();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            received += chunk.len() as u64;

            if last_update.elapsed() >= PROGRESS_INTERVAL {
                progress.report(Phase::Download, received as f64 / expected as f64);
                last_update = Instant::now();
            }
        }

        let elapsed = start.elapsed();
        progress.report(Phase::Download, 1.0);
        throughput_mbps(received, elapsed)
    }

    /// Post the upload payload; returns Mbps
    async fn measure_upload(&self, progress: &ProgressSink<'_>) -> Result<f64> {
        let url = self.upload_url()?;
        let payload: Vec<u8> = (0..self.upload_bytes).map(|i| (i % 256) as u8).collect();

        progress.report(Phase::Upload, 0.0);
        let start = Instant::now();
        let response = self.client
            .post(url)
            .header("Content-Type", "application/octet-stream")
            .body(payload)
            .send()
            .await?;
        let elapsed = start.elapsed();

        if !response.status().is_success() {
            return Err(AppError::measurement(format!(
                "Upload failed with status {}",
                response.status()
            )));
        }

        progress.report(Phase::Upload, 1.0);
        throughput_mbps(self.upload_bytes as u64, elapsed)
    }
}

#[async_trait]
impl MeasurementProvider for HttpSpeedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Http
    }

    async fn run_attempt(&self, progress: &ProgressSink<'_>) -> Result<RunResult> {
        let (ping, jitter) = self.measure_latency(progress).await?;
        let download = self.measure_download(progress).await?;
        let upload = self.measure_upload(progress).await?;

        RunResult::new(download, upload, ping, jitter)
    }
}

/// Mean round trip and mean absolute difference between consecutive round trips
pub fn latency_stats(samples_ms: &[f64]) -> (f64, f64) {
    if samples_ms.is_empty() {
        return (0.0, 0.0);
    }

    let ping = samples_ms.iter().sum::<f64>() / samples_ms.len() as f64;
    let jitter = if samples_ms.len() < 2 {
        0.0
    } else {
        let diffs: f64 = samples_ms.windows(2).map(|pair| (pair[1] - pair[0]).abs()).sum();
        diffs / (samples_ms.len() - 1) as f64
    };

    (ping, jitter)
}

/// Convert a transfer into megabits per second
pub fn throughput_mbps(bytes: u64, elapsed: Duration) -> Result<f64> {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return Err(AppError::measurement("Transfer completed too fast to measure"));
    }
    Ok((bytes as f64 * 8.0) / (secs * 1_000_000.0))
}
