// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! API error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

/// Errors returned by the download handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upstream storage could not be reached or the transfer broke.
    #[error("Upstream request to {url} failed: {source}")]
    Upstream {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream storage answered with a non-2xx status.
    #[error("Upstream {url} returned HTTP {status}")]
    UpstreamStatus { url: String, status: StatusCode },
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Upstream { .. } => "UPSTREAM_UNAVAILABLE",
            Self::UpstreamStatus { .. } => "UPSTREAM_STATUS",
        }
    }

    /// Status returned to the client. Every upstream failure is a bad gateway.
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_GATEWAY
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(code = self.code(), error = %self, "Download failed");

        let upstream_status = match &self {
            Self::UpstreamStatus { status, .. } => Some(status.as_u16()),
            Self::Upstream { .. } => None,
        };
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "upstream_status": upstream_status,
            },
            "meta": {
                "timestamp": Utc::now().to_rfc3339(),
            }
        }));
        (self.status(), body).into_response()
    }
}
