use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use rbperf_core::headers::CLIENT_LIBRARY_LATENCY;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::state::AppState;

/// Banner served at the root.
pub const BANNER: &str = "RBF API";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/download/:bucket/:object", get(download))
        .route("/stream/:bucket/:object", get(stream))
}

async fn index() -> &'static str {
    BANNER
}

/// Fetch the whole object upstream, then send it with the fetch time in
/// milliseconds in the latency header.
async fn download(
    State(state): State<Arc<AppState>>,
    Path((bucket, object)): Path<(String, String)>,
) -> Result<Response> {
    let fetched = state.fetch_object(&bucket, &object).await?;
    let latency_ms = fetched.elapsed_ms();

    info!(
        bucket = %bucket,
        object = %object,
        bytes = fetched.body.len(),
        latency_ms,
        "Object downloaded"
    );

    let disposition = format!("attachment; filename=\"{}\"", object.replace('"', ""));
    Ok((
        [
            (HeaderName::from_static(CLIENT_LIBRARY_LATENCY), latency_ms.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_TYPE, "text/plain".to_string()),
        ],
        fetched.body,
    )
        .into_response())
}

/// Pipe the upstream body through as it arrives.
async fn stream(
    State(state): State<Arc<AppState>>,
    Path((bucket, object)): Path<(String, String)>,
) -> Result<Response> {
    let upstream = state.open_object(&bucket, &object).await?;
    info!(bucket = %bucket, object = %object, "Streaming object");

    Ok((
        [(header::CONTENT_TYPE, "text/plain")],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response())
}
