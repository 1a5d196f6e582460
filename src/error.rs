// API errors; the only place error envelopes are built

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::ApiResponse;

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later";
pub const INVALID_DATA_MESSAGE: &str = "Invalid data format";
pub const DB_ERROR_MESSAGE: &str = "Database operation failed";
pub const NOT_FOUND_MESSAGE: &str = "Resource not found";
pub const TEMPLATE_FETCH_MESSAGE: &str = "Failed to fetch template";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimitExceeded,

    #[error("{}", INVALID_DATA_MESSAGE)]
    InvalidInput,

    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound,

    #[error("{}", DB_ERROR_MESSAGE)]
    Persistence(#[source] anyhow::Error),

    #[error("{}", TEMPLATE_FETCH_MESSAGE)]
    UpstreamFetch(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InvalidInput => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Persistence(_) | ApiError::UpstreamFetch(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Persistence(e) => tracing::error!(error = ?e, "persistence failure"),
            ApiError::UpstreamFetch(detail) => {
                tracing::error!(error = %detail, "template fetch failed")
            }
            other => tracing::debug!(status = status.as_u16(), "{other}"),
        }

        let body = Json(ApiResponse::<()>::error(self.to_string()));
        (status, body).into_response()
    }
}
