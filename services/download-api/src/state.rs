// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared state and upstream object fetches.

use crate::error::{ApiError, Result};
use bytes::Bytes;
use rbperf_core::config::ServerSettings;
use std::time::{Duration, Instant};
use tracing::debug;

/// Connect timeout for upstream requests. Transfers themselves are unbounded
/// since the largest object takes a while from a distant region.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// An object fetched in full, with the fetch duration.
#[derive(Debug, Clone)]
pub struct FetchedObject {
    /// Object contents.
    pub body: Bytes,
    /// Request dispatch until the last body byte arrived.
    pub elapsed: Duration,
}

impl FetchedObject {
    /// Fetch duration in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

/// Application state shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Client for upstream object storage.
    pub http: reqwest::Client,
    /// Object storage endpoint, without trailing slash.
    pub upstream_base_url: String,
}

impl AppState {
    /// Create state for `upstream_base_url` over `http`.
    pub fn new(http: reqwest::Client, upstream_base_url: impl Into<String>) -> Self {
        let upstream_base_url = upstream_base_url.into();
        Self {
            http,
            upstream_base_url: upstream_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create state from server settings with a fresh client.
    pub fn from_settings(settings: &ServerSettings) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self::new(http, &settings.upstream_base_url))
    }

    /// Upstream media URL of `object` in `bucket`.
    pub fn object_url(&self, bucket: &str, object: &str) -> String {
        format!("{}/{}/{}?alt=media", self.upstream_base_url, bucket, object)
    }

    /// Send the upstream GET for `object` and check its status.
    pub async fn open_object(&self, bucket: &str, object: &str) -> Result<reqwest::Response> {
        let url = self.object_url(bucket, object);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ApiError::Upstream {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::UpstreamStatus { url, status });
        }
        Ok(response)
    }

    /// Download `object` from `bucket` into memory, timing the whole fetch.
    pub async fn fetch_object(&self, bucket: &str, object: &str) -> Result<FetchedObject> {
        let start = Instant::now();
        let response = self.open_object(bucket, object).await?;
        let url = response.url().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|source| ApiError::Upstream { url, source })?;
        let elapsed = start.elapsed();

        debug!(bucket, object, bytes = body.len(), ?elapsed, "Fetched upstream object");
        Ok(FetchedObject { body, elapsed })
    }
}
