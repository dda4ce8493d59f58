use std::sync::Arc;
use std::time::Duration;

use freshpress::api;
use freshpress::backend::HttpBackend;
use freshpress::config::Config;
use freshpress::error::AppError;
use freshpress::state::AppState;
use freshpress::sweeper::run_sweeper;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let backend = HttpBackend::new(
        config.backend_url.clone(),
        Duration::from_millis(config.backend_timeout_ms),
    )
    .map_err(|err| AppError::Internal(err.to_string()))?;

    let shared_state = Arc::new(AppState::new(Arc::new(backend), &config));

    tokio::spawn(run_sweeper(
        shared_state.clone(),
        Duration::from_secs(config.sweep_interval_secs),
    ));

    let app = api::rest::router(shared_state)
        .layer(api::rest::cors(config.frontend_origin.as_deref()));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        backend_url = %config.backend_url,
        pricing_model = %config.pricing_model,
        "http server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
