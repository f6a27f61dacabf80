// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Server-vantage download service.
//!
//! Fetches objects from storage on behalf of a client and reports how long
//! its own upstream fetch took in the `rbf-client-library-latency` header,
//! so the client can split a server-mediated download into the upstream
//! fetch and the server-to-client hop.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::Router;
use rbperf_core::config::ServerSettings;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn router(state: AppState, settings: &ServerSettings) -> Router {
    Router::new()
        .merge(routes::routes())
        .layer(axum::middleware::from_fn(middleware::no_store))
        .layer(CompressionLayer::new())
        .layer(middleware::cors_layer(&settings.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
