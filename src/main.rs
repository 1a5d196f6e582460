use anyhow::Result;
use statusd::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let status_repo = Arc::new(
        status_repo::StatusRepo::connect(
            &app_config.database.path,
            app_config.database.max_pool_size,
            app_config.database.max_records_per_client,
        )
        .await?,
    );
    status_repo.init().await?;
    let sweep = status_repo.enforce_retention().await?;
    tracing::info!(
        snapshots_deleted = sweep.snapshots_deleted,
        clients_deleted = sweep.clients_deleted,
        keep = status_repo.max_records_per_client(),
        "Database ready at {}",
        app_config.database.path
    );

    let rate_limiter = Arc::new(rate_limiter::RateLimiter::new(
        Duration::from_secs(app_config.rate_limit.window_secs),
        app_config.rate_limit.max_requests,
    ));
    tracing::info!(
        window_secs = rate_limiter.window().as_secs(),
        max_requests = rate_limiter.max_requests(),
        header = %app_config.rate_limit.client_ip_header,
        "Rate limiting enabled"
    );

    let service = status_service::StatusService::new(status_repo);
    let app = routes::app(service, rate_limiter, app_config.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Received shutdown signal");
}
