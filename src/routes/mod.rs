// HTTP routes

mod index;
mod status;

use axum::{
    Router,
    extract::{Request, State},
    handler::Handler,
    http::{HeaderMap, HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::rate_limiter::{RateLimiter, UNKNOWN_CLIENT_KEY};
use crate::status_service::StatusService;

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86400);

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) service: StatusService,
    pub(crate) rate_limiter: Arc<RateLimiter>,
    pub(crate) http_client: reqwest::Client,
    pub(crate) config: Arc<AppConfig>,
}

impl AppState {
    /// Rate limit by the configured client address header.
    pub(crate) fn admit(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let key = client_key(headers, &self.config.rate_limit.client_ip_header);
        if self.rate_limiter.check(key) {
            Ok(())
        } else {
            tracing::debug!(client = key, "rate limited");
            Err(ApiError::RateLimitExceeded)
        }
    }
}

/// Rate limit before the handler runs, so rejected callers' bodies are never read.
async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state.admit(request.headers())?;
    Ok(next.run(request).await)
}

/// Caller key for rate limiting; callers without the header share one key.
fn client_key<'a>(headers: &'a HeaderMap, header_name: &str) -> &'a str {
    headers
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_CLIENT_KEY)
}

pub fn app(service: StatusService, rate_limiter: Arc<RateLimiter>, config: AppConfig) -> Router {
    let state = AppState {
        service,
        rate_limiter,
        http_client: reqwest::Client::new(),
        config: Arc::new(config),
    };
    let limited = middleware::from_fn_with_state(state.clone(), rate_limit);
    // Any OPTIONS request is answered by the CORS layer as a preflight.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(PREFLIGHT_MAX_AGE);

    Router::new()
        .route("/", get(index::index_handler).fallback(not_found)) // GET /
        .route(
            "/status",
            get(status::health_handler) // GET /status
                .post(status::ingest_handler.layer(limited.clone())) // POST /status
                .fallback(not_found),
        )
        .route(
            "/status/latest",
            get(status::latest_handler.layer(limited)).fallback(not_found), // GET /status/latest
        )
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub(crate) fn no_cache() -> (header::HeaderName, HeaderValue) {
    (header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))
}
