// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Latency decomposition.
//!
//! Splits the server-vantage time of a download into the server's own
//! upstream fetch and the network hop between server and client, and
//! derives the relative change and transfer speeds from the client-vantage
//! time.
//!
//! # Example
//!
//! ```
//! use rbperf_core::{Decomposition, Metric, TimingTriple};
//!
//! let triple = TimingTriple::new(
//!     Metric::Measured(2000.0),
//!     Metric::Measured(2600.0),
//!     Metric::Measured(2100.0),
//! );
//! let d = Decomposition::compute(&triple, 2_097_152, 2);
//! assert_eq!(d.network_hop.format(), "500.000");
//! assert_eq!(d.percent_change, 30);
//! assert_eq!(d.speed_mib_per_sec.format(), "1.000");
//! ```

use crate::metric::{Metric, METRIC_SENTINEL};
use serde::{Deserialize, Serialize};

/// Durations observed for one trial, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingTriple {
    /// Direct client-to-bucket download.
    pub client: Metric,
    /// Download through the intermediary server.
    pub server: Metric,
    /// The server's self-reported upstream fetch.
    pub server_client_latency: Metric,
}

impl TimingTriple {
    /// Create a triple from its parts.
    pub fn new(client: Metric, server: Metric, server_client_latency: Metric) -> Self {
        Self {
            client,
            server,
            server_client_latency,
        }
    }

    /// A triple where every field failed.
    pub fn failed() -> Self {
        Self::new(Metric::Failed, Metric::Failed, Metric::Failed)
    }

    /// Whether every field failed.
    pub fn is_failed(&self) -> bool {
        self.client.is_failed() && self.server.is_failed() && self.server_client_latency.is_failed()
    }
}

/// Time attributable to the hop between server and client.
///
/// Not clamped: a server reporting more upstream time than its total
/// yields a negative hop.
pub fn network_hop(server: Metric, server_client_latency: Metric) -> Metric {
    server - server_client_latency
}

/// Floor-truncated relative change from `a` (client) to `b` (server).
///
/// Zero operands are handled explicitly instead of dividing by zero:
/// `b == 0` yields `floor(-a * 100)` and `a == 0` yields `floor(b * 100)`.
///
/// A server up to 1% faster than the client also yields `-1`, the value
/// written for a trial whose client or server timing failed. Use
/// [`Decomposition::has_percent_change`] to tell them apart.
pub fn percent_change(a: f64, b: f64) -> i64 {
    let percent = if b != 0.0 {
        if a != 0.0 {
            (b - a) / a * 100.0
        } else {
            b * 100.0
        }
    } else {
        -a * 100.0
    };
    percent.floor() as i64
}

/// Units per second for `size` transferred in `elapsed_ms`.
///
/// A zero, NaN or infinite speed is a failure.
pub fn transfer_speed(size: f64, elapsed_ms: Metric) -> Metric {
    match elapsed_ms.map(|ms| size / (ms / 1000.0)) {
        Metric::Measured(speed) if speed != 0.0 => Metric::Measured(speed),
        _ => Metric::Failed,
    }
}

/// Every derived quantity for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    /// Client-vantage duration.
    pub client: Metric,
    /// Server-vantage duration.
    pub server: Metric,
    /// Server's upstream fetch.
    pub server_client_latency: Metric,
    /// `server - server_client_latency`.
    pub network_hop: Metric,
    /// Relative change from client to server time; sentinel if either failed.
    ///
    /// The sentinel collides with a measured `-1`; see
    /// [`Decomposition::has_percent_change`].
    pub percent_change: i64,
    /// Client-vantage throughput in bytes per second.
    pub speed_bytes_per_sec: Metric,
    /// Client-vantage throughput in MiB per second.
    pub speed_mib_per_sec: Metric,
}

impl Decomposition {
    /// Derive every quantity from `triple` for an object of the given size.
    pub fn compute(triple: &TimingTriple, size_bytes: u64, size_mib: u64) -> Self {
        let percent_change = match (triple.client.value(), triple.server.value()) {
            (Some(client), Some(server)) => percent_change(client, server),
            _ => METRIC_SENTINEL as i64,
        };

        Self {
            client: triple.client,
            server: triple.server,
            server_client_latency: triple.server_client_latency,
            network_hop: network_hop(triple.server, triple.server_client_latency),
            percent_change,
            speed_bytes_per_sec: transfer_speed(size_bytes as f64, triple.client),
            speed_mib_per_sec: transfer_speed(size_mib as f64, triple.client),
        }
    }

    /// Whether `percent_change` was computed from two measured times rather
    /// than set to the sentinel.
    pub fn has_percent_change(&self) -> bool {
        !self.client.is_failed() && !self.server.is_failed()
    }
}
