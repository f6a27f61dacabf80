// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Response header middleware for the download service.
//!
//! Every response is marked uncacheable so repeated trials always reach
//! upstream storage, and browsers on the allowed origins may read the
//! latency header.

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use rbperf_core::headers::CLIENT_LIBRARY_LATENCY;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

/// Middleware function that sets `Cache-Control: no-store` on every
/// response, errors included.
pub async fn no_store(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// CORS layer allowing GETs from `allowed_origins` and exposing the latency
/// header. An empty list allows any origin.
///
/// Origins that are not valid header values are skipped with a warning.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
        .expose_headers([HeaderName::from_static(CLIENT_LIBRARY_LATENCY)])
}
