use crate::upstream::UpstreamError;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use blockscope_core::{QueryError, ShapeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("malformed upstream payload: {0}")]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("time must be a millisecond timestamp, got `{0}`")]
    InvalidTime(String),
    #[error("invalid query string: {0}")]
    InvalidQuery(String),
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidQuery(rejection.body_text())
    }
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Upstream(UpstreamError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Upstream(UpstreamError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Upstream(_) | ApiError::Shape(_) => StatusCode::BAD_GATEWAY,
            ApiError::Query(_) | ApiError::InvalidTime(_) | ApiError::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Upstream(UpstreamError::Unavailable(_)) => "upstream_unavailable",
            ApiError::Upstream(UpstreamError::Timeout(_)) => "upstream_timeout",
            ApiError::Upstream(UpstreamError::Status(_)) => "upstream_error",
            ApiError::Upstream(UpstreamError::NotFound(_)) => "not_found",
            ApiError::Shape(_) => "shaping_error",
            ApiError::Query(err) => err.kind(),
            ApiError::InvalidTime(_) => "invalid_time",
            ApiError::InvalidQuery(_) => "invalid_query",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(kind = self.kind(), error = %self, "request failed");
        } else {
            debug!(kind = self.kind(), error = %self, "request rejected");
        }
        let body = ErrorBody {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
