// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Latency probe.
//!
//! Times a single HTTP GET. The timing is taken around each call rather
//! than by hooks installed on a shared client, so probes issued by
//! concurrent trials never observe each other's timestamps.
//!
//! A probe's duration always runs from just before the request is
//! dispatched to just after the last body byte has been read. Every probe
//! in the system uses this definition.
//!
//! # Example
//!
//! ```ignore
//! use rbperf_adapters::probe::latency::LatencyProbe;
//!
//! let probe = LatencyProbe::new(Duration::from_secs(30))?;
//!
//! // Sentinel-aware duration
//! let elapsed = probe.probe("https://storage.googleapis.com/b/o?alt=media").await;
//!
//! // Or the full timed response
//! let response = probe.timed_get(url).await?;
//! println!("{} bytes in {:?}", response.body_bytes, response.elapsed);
//! ```

use futures::StreamExt;
use rbperf_core::Metric;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while probing.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Request could not be sent or no response arrived
    #[error("Request to {url} failed: {source}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Response status was not 2xx
    #[error("Request to {url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Status the server answered with.
        status: StatusCode,
    },

    /// Body stream broke before completion
    #[error("Reading response body from {url} failed: {source}")]
    Body {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP client construction failed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Result type for probe operations.
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Checkpointed wall-clock measurement of one request.
#[derive(Debug)]
pub struct ProbeMeasurement {
    start_time: Instant,
    checkpoints: Vec<(&'static str, Instant)>,
}

impl ProbeMeasurement {
    /// Start measuring now.
    pub fn start() -> Self {
        Self {
            start_time: Instant::now(),
            checkpoints: Vec::new(),
        }
    }

    /// Add a checkpoint.
    pub fn checkpoint(&mut self, label: &'static str) {
        self.checkpoints.push((label, Instant::now()));
    }

    /// Offset of a checkpoint from the start.
    pub fn get_checkpoint(&self, label: &str) -> Option<Duration> {
        self.checkpoints
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, instant)| instant.duration_since(self.start_time))
    }

    /// Elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// A fully drained response with its timing.
#[derive(Debug, Clone)]
pub struct TimedResponse {
    /// Requested URL
    pub url: String,
    /// Response status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Bytes read from the body
    pub body_bytes: u64,
    /// Dispatch until headers arrived
    pub time_to_headers: Duration,
    /// Dispatch until the body was drained
    pub elapsed: Duration,
}

impl TimedResponse {
    /// Total duration in milliseconds.
    pub fn elapsed_ms(&self) -> Metric {
        Metric::from_duration(self.elapsed)
    }

    /// A header's value as a string, if present and visible ASCII.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Times GET requests over its own HTTP client.
#[derive(Debug, Clone)]
pub struct LatencyProbe {
    http: reqwest::Client,
}

impl LatencyProbe {
    /// Create a probe whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ProbeError::Client)?;
        Ok(Self { http })
    }

    /// Issue one GET and drain the body, returning the timing alongside the
    /// response. Non-2xx statuses are errors. Never retries.
    pub async fn timed_get(&self, url: &str) -> Result<TimedResponse> {
        let mut measurement = ProbeMeasurement::start();

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ProbeError::Transport {
                url: url.to_string(),
                source,
            })?;
        measurement.checkpoint("headers");

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status {
                url: url.to_string(),
                status,
            });
        }

        let headers = response.headers().clone();
        let mut stream = response.bytes_stream();
        let mut body_bytes: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| ProbeError::Body {
                url: url.to_string(),
                source,
            })?;
            body_bytes += chunk.len() as u64;
        }
        let elapsed = measurement.elapsed();

        debug!(
            url,
            status = status.as_u16(),
            body_bytes,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Probe completed"
        );

        Ok(TimedResponse {
            url: url.to_string(),
            status,
            headers,
            body_bytes,
            time_to_headers: measurement.get_checkpoint("headers").unwrap_or(elapsed),
            elapsed,
        })
    }

    /// Elapsed milliseconds of one GET, or [`Metric::Failed`] on any error.
    pub async fn probe(&self, url: &str) -> Metric {
        match self.timed_get(url).await {
            Ok(response) => response.elapsed_ms(),
            Err(e) => {
                warn!(url, error = %e, "Probe failed");
                Metric::Failed
            }
        }
    }
}
