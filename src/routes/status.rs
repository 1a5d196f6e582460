// /status handlers: ingestion, latest-per-client query, health marker

use axum::{
    Form, Json,
    extract::{State, rejection::FormRejection},
    http::{HeaderValue, header},
    response::IntoResponse,
};

use super::{AppState, no_cache};
use crate::error::ApiError;
use crate::models::{ApiResponse, StatusForm};

/// Body of `GET /status`.
pub const HEALTH_MARKER: &str = "kunlun";

/// POST /status: store one snapshot.
pub(super) async fn ingest_handler(
    State(state): State<AppState>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Form(pairs) = form.map_err(|rejection| {
        tracing::debug!(error = %rejection, "unreadable status form");
        ApiError::InvalidInput
    })?;
    let form = StatusForm::from_pairs(pairs);

    let receipt = state.service.ingest(&form).await?;
    Ok(Json(ApiResponse::ok(receipt)))
}

/// GET /status/latest: newest snapshot of every client.
pub(super) async fn latest_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let latest = state.service.query_latest().await?;
    Ok(([no_cache()], Json(ApiResponse::ok(latest))))
}

/// GET /status: constant liveness marker.
pub(super) async fn health_handler() -> impl IntoResponse {
    (
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            no_cache(),
        ],
        HEALTH_MARKER,
    )
}
