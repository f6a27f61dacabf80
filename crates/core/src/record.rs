// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! The per-trial result record.

use crate::catalog::TrialRequest;
use crate::decomposition::Decomposition;
use crate::metric::{format_fixed, METRIC_SENTINEL};
use serde::{Deserialize, Serialize};

/// Column names of a rendered results-table row, in order.
pub const TABLE_COLUMNS: [&str; 9] = [
    "bucket_region",
    "bucket_region_name",
    "file_size",
    "mib_s",
    "browser",
    "server",
    "server_client",
    "server_hop",
    "browser_boost_percent",
];

/// Outcome of one trial, with every number already formatted.
///
/// Serializes with the camelCase field names consumers of the JSON array
/// expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    /// Bucket the object was downloaded from.
    pub bucket_name: String,
    /// Display label of the bucket's region.
    pub location: String,
    /// Object name.
    pub object_id: String,
    /// Client-vantage duration, ms.
    pub time_taken_client: String,
    /// Server-vantage duration, ms.
    pub time_taken_server: String,
    /// Server's upstream fetch, ms.
    pub time_taken_server_client_upstream: String,
    /// Server-to-client network hop, ms.
    pub time_taken_server_network_hop: String,
    /// Floor-truncated change from client to server time.
    pub percent_change: i64,
    /// Object size in bytes.
    pub file_size_bytes: String,
    /// Client throughput, bytes/s.
    pub speed_bytes_per_sec: String,
    /// Client throughput, MiB/s.
    #[serde(rename = "speedMiBPerSec")]
    pub speed_mib_per_sec: String,
}

impl ResultRecord {
    /// Build the record for `request` from its decomposition.
    pub fn assemble(request: &TrialRequest, d: &Decomposition) -> Self {
        Self {
            bucket_name: request.bucket_name(),
            location: request.region.location().to_string(),
            object_id: request.object.as_str().to_string(),
            time_taken_client: d.client.format(),
            time_taken_server: d.server.format(),
            time_taken_server_client_upstream: d.server_client_latency.format(),
            time_taken_server_network_hop: d.network_hop.format(),
            percent_change: d.percent_change,
            file_size_bytes: request.object.size_bytes().to_string(),
            speed_bytes_per_sec: d.speed_bytes_per_sec.format(),
            speed_mib_per_sec: d.speed_mib_per_sec.format(),
        }
    }

    /// Whether `percent_change` is a real measurement.
    ///
    /// A `-1` is ambiguous on its own: it is both the sentinel and the
    /// result for a server up to 1% faster than the client. Measured
    /// durations are never negative, so a sentinel client or server time
    /// marks the sentinel case.
    pub fn has_percent_change(&self) -> bool {
        let sentinel = format_fixed(METRIC_SENTINEL);
        self.time_taken_client != sentinel && self.time_taken_server != sentinel
    }

    /// Cells of the rendered table row, matching [`TABLE_COLUMNS`].
    pub fn table_cells(&self) -> Vec<String> {
        vec![
            self.bucket_name.clone(),
            self.location.clone(),
            self.object_id.clone(),
            self.speed_mib_per_sec.clone(),
            self.time_taken_client.clone(),
            self.time_taken_server.clone(),
            self.time_taken_server_client_upstream.clone(),
            self.time_taken_server_network_hop.clone(),
            self.percent_change.to_string(),
        ]
    }
}
