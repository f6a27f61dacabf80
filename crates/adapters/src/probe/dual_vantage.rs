// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dual-vantage timer.
//!
//! Downloads the same object twice: once directly from the bucket and once
//! through the download service, which reports its own upstream fetch time
//! in the `rbf-client-library-latency` header. The client request always
//! finishes before the server request is sent.

use super::latency::{LatencyProbe, Result};
use rbperf_core::config::ProbeSettings;
use rbperf_core::headers::CLIENT_LIBRARY_LATENCY;
use rbperf_core::{Metric, TimingTriple};
use tracing::{debug, warn};

/// Parse the download service's latency header.
///
/// Absent, unparsable, non-finite and negative values are failures.
pub fn parse_latency_header(value: Option<&str>) -> Metric {
    match value.and_then(|v| v.trim().parse::<f64>().ok()) {
        Some(ms) if ms.is_finite() && ms >= 0.0 => Metric::Measured(ms),
        _ => Metric::Failed,
    }
}

/// Times a download from the client and the server vantage.
#[derive(Debug, Clone)]
pub struct DualVantageTimer {
    probe: LatencyProbe,
    settings: ProbeSettings,
}

impl DualVantageTimer {
    /// Create a timer that sends both requests through `probe`.
    pub fn new(probe: LatencyProbe, settings: ProbeSettings) -> Self {
        Self { probe, settings }
    }

    /// Measure both vantages for `object_id` in `bucket_name`.
    ///
    /// A failure of either request collapses the whole triple to
    /// [`TimingTriple::failed`]. A missing or malformed latency header only
    /// fails the upstream latency field.
    pub async fn measure(&self, bucket_name: &str, object_id: &str) -> TimingTriple {
        match self.try_measure(bucket_name, object_id).await {
            Ok(triple) => triple,
            Err(e) => {
                warn!(bucket = bucket_name, object = object_id, error = %e, "Measurement failed");
                TimingTriple::failed()
            }
        }
    }

    async fn try_measure(&self, bucket_name: &str, object_id: &str) -> Result<TimingTriple> {
        let client_url = self.settings.object_url(bucket_name, object_id);
        let server_url = self.settings.server_download_url(bucket_name, object_id);

        let client = self.probe.timed_get(&client_url).await?;
        let server = self.probe.timed_get(&server_url).await?;

        let header = server.header_str(CLIENT_LIBRARY_LATENCY);
        let server_client_latency = parse_latency_header(header);
        if server_client_latency.is_failed() {
            warn!(url = %server_url, header = ?header, "Latency header missing or invalid");
        }

        let triple = TimingTriple::new(client.elapsed_ms(), server.elapsed_ms(), server_client_latency);
        debug!(
            bucket = bucket_name,
            client_ms = triple.client.or_sentinel(),
            server_ms = triple.server.or_sentinel(),
            server_client_ms = triple.server_client_latency.or_sentinel(),
            "Dual-vantage measurement"
        );
        Ok(triple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BUCKET: &str = "gcsrbpa-us-west1";

    fn timer(server: &MockServer) -> DualVantageTimer {
        let settings = ProbeSettings {
            storage_base_url: server.uri(),
            server_base_url: server.uri(),
            request_timeout_ms: 5_000,
        };
        DualVantageTimer::new(LatencyProbe::new(settings.request_timeout()).unwrap(), settings)
    }

    async fn mount_storage(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(format!("/{BUCKET}/2mib.txt")))
            .and(query_param("alt", "media"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'a'; 2048]))
            .mount(server)
            .await;
    }

    #[test]
    fn test_parse_latency_header() {
        assert_eq!(parse_latency_header(Some("123.456")), Metric::Measured(123.456));
        assert_eq!(parse_latency_header(Some(" 7 ")), Metric::Measured(7.0));
        assert!(parse_latency_header(None).is_failed());
        assert!(parse_latency_header(Some("fast")).is_failed());
        assert!(parse_latency_header(Some("NaN")).is_failed());
        assert!(parse_latency_header(Some("-3")).is_failed());
    }

    #[tokio::test]
    async fn test_measure_populates_triple() {
        let server = MockServer::start().await;
        mount_storage(&server).await;
        Mock::given(method("GET"))
            .and(path(format!("/download/{BUCKET}/2mib.txt")))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(CLIENT_LIBRARY_LATENCY, "12.5")
                    .set_body_bytes(vec![b'a'; 2048])
                    .set_delay(Duration::from_millis(30)),
            )
            .mount(&server)
            .await;

        let triple = timer(&server).measure(BUCKET, "2mib.txt").await;

        assert!(triple.client.value().is_some());
        assert!(triple.server.value().unwrap() >= 30.0);
        assert_eq!(triple.server_client_latency, Metric::Measured(12.5));
    }

    #[tokio::test]
    async fn test_client_request_precedes_server_request() {
        let server = MockServer::start().await;
        mount_storage(&server).await;
        Mock::given(method("GET"))
            .and(path(format!("/download/{BUCKET}/2mib.txt")))
            .respond_with(ResponseTemplate::new(200).insert_header(CLIENT_LIBRARY_LATENCY, "1"))
            .mount(&server)
            .await;

        timer(&server).measure(BUCKET, "2mib.txt").await;

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url.path(), format!("/{BUCKET}/2mib.txt"));
        assert_eq!(requests[1].url.path(), format!("/download/{BUCKET}/2mib.txt"));
    }

    #[tokio::test]
    async fn test_server_failure_collapses_triple() {
        let server = MockServer::start().await;
        mount_storage(&server).await;
        Mock::given(method("GET"))
            .and(path(format!("/download/{BUCKET}/2mib.txt")))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let triple = timer(&server).measure(BUCKET, "2mib.txt").await;
        assert!(triple.is_failed());
    }

    #[tokio::test]
    async fn test_client_failure_skips_server_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let triple = timer(&server).measure(BUCKET, "2mib.txt").await;
        assert!(triple.is_failed());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_header_fails_only_latency() {
        let server = MockServer::start().await;
        mount_storage(&server).await;
        Mock::given(method("GET"))
            .and(path(format!("/download/{BUCKET}/2mib.txt")))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let triple = timer(&server).measure(BUCKET, "2mib.txt").await;
        assert!(triple.client.value().is_some());
        assert!(triple.server.value().is_some());
        assert!(triple.server_client_latency.is_failed());
    }
}
