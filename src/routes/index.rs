// GET /: serves the dashboard template fetched from its upstream URL.

use axum::{
    extract::State,
    http::{HeaderValue, header},
    response::{Html, IntoResponse},
};

use super::AppState;
use crate::error::ApiError;

pub(super) async fn index_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let template = &state.config.template;
    let html = fetch_template(&state.http_client, &template.url).await?;
    let cache = HeaderValue::from_str(&format!("public, max-age={}", template.cache_max_age_secs))
        .map_err(|e| ApiError::UpstreamFetch(e.to_string()))?;
    Ok(([(header::CACHE_CONTROL, cache)], Html(html)))
}

async fn fetch_template(client: &reqwest::Client, url: &str) -> Result<String, ApiError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ApiError::UpstreamFetch(e.to_string()))?;
    if !response.status().is_success() {
        return Err(ApiError::UpstreamFetch(format!(
            "upstream returned {}",
            response.status()
        )));
    }
    response
        .text()
        .await
        .map_err(|e| ApiError::UpstreamFetch(e.to_string()))
}
