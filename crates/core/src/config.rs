// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Layered settings.
//!
//! Settings are resolved in this order, later sources overriding earlier:
//!
//! 1. compiled-in defaults
//! 2. a TOML file (`rbperf.toml` in the working directory, or an explicit path)
//! 3. environment variables prefixed `RBPERF_`, with `__` between nested keys
//!    (`RBPERF_PROBE__SERVER_BASE_URL`, `RBPERF_HARNESS__UNITS`, ...)
//!
//! A `.env` file is loaded into the environment first when present.
//!
//! # Example
//!
//! ```ignore
//! use rbperf_core::Settings;
//!
//! let settings = Settings::load(None)?;
//! println!("{}", settings.probe.server_base_url);
//! ```

use crate::error::{Error, Result};
use crate::execution::FailurePolicy;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "rbperf";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "RBPERF";

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Probe endpoints and timeouts.
    pub probe: ProbeSettings,
    /// Concurrent harness settings.
    pub harness: HarnessSettings,
    /// Download service settings.
    pub server: ServerSettings,
    /// Logging settings.
    pub log: LogSettings,
}

/// Where probes send their requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Public object storage endpoint, without trailing slash.
    pub storage_base_url: String,
    /// Download service endpoint, without trailing slash.
    pub server_base_url: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            storage_base_url: "https://storage.googleapis.com".to_string(),
            server_base_url: "https://regionalized-bucket-perf-mgsjbmdcoa-uw.a.run.app".to_string(),
            request_timeout_ms: 120_000,
        }
    }
}

impl ProbeSettings {
    /// Public URL of `object` in `bucket`.
    pub fn object_url(&self, bucket: &str, object: &str) -> String {
        format!(
            "{}/{}/{}?alt=media",
            self.storage_base_url.trim_end_matches('/'),
            bucket,
            object
        )
    }

    /// Download service URL for `object` in `bucket`.
    pub fn server_download_url(&self, bucket: &str, object: &str) -> String {
        format!(
            "{}/download/{}/{}",
            self.server_base_url.trim_end_matches('/'),
            bucket,
            object
        )
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Concurrent harness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessSettings {
    /// Number of units launched per batch.
    pub units: usize,
    /// Rows a page must render before it is scraped. Defaults to the plan size.
    pub expected_rows: Option<usize>,
    /// Bound on the population wait, in milliseconds.
    pub population_timeout_ms: u64,
    /// How often a page's row count is checked, in milliseconds.
    pub poll_interval_ms: u64,
    /// What to do with the batch when units fail.
    pub failure_policy: FailurePolicy,
    /// Directory batch outputs are written to.
    pub output_dir: String,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            units: 3,
            expected_rows: None,
            population_timeout_ms: 30_000,
            poll_interval_ms: 250,
            failure_policy: FailurePolicy::default(),
            output_dir: "benchmarks/output".to_string(),
        }
    }
}

impl HarnessSettings {
    /// Bound on the population wait.
    pub fn population_timeout(&self) -> Duration {
        Duration::from_millis(self.population_timeout_ms)
    }

    /// Row count polling interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Download service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address to bind.
    pub bind_addr: String,
    /// Object storage endpoint the service fetches from.
    pub upstream_base_url: String,
    /// Origins allowed by CORS. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            upstream_base_url: "https://storage.googleapis.com".to_string(),
            allowed_origins: vec![
                "http://localhost:8080".to_string(),
                "https://storage.googleapis.com".to_string(),
            ],
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default level when `RUST_LOG` is unset.
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment.
    ///
    /// An explicit `path` must exist; the default `rbperf.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!(path = %env_file.display(), "Loaded .env file");
        }

        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings no run could use.
    pub fn validate(&self) -> Result<()> {
        if self.harness.units == 0 {
            return Err(Error::invalid_input("harness.units must be at least 1"));
        }
        if self.harness.population_timeout_ms == 0 {
            return Err(Error::invalid_input(
                "harness.population_timeout_ms must be positive",
            ));
        }
        if self.harness.poll_interval_ms == 0 {
            return Err(Error::invalid_input("harness.poll_interval_ms must be positive"));
        }
        if self.probe.request_timeout_ms == 0 {
            return Err(Error::invalid_input("probe.request_timeout_ms must be positive"));
        }
        if !matches!(self.log.format.as_str(), "text" | "json") {
            return Err(Error::invalid_input(format!(
                "log.format must be 'text' or 'json', got '{}'",
                self.log.format
            )));
        }
        Ok(())
    }
}
