use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    middleware::Next,
    response::IntoResponse,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::api;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::file_processing::ExtractorFactory;
use crate::pipeline::{BatchOrchestrator, StagingArea};

/// Build shared state: staging directory, extractor and orchestrator.
pub async fn build_state(config: Arc<AppConfig>) -> anyhow::Result<AppState> {
    let staging = StagingArea::prepare(&config.staging.dir).await?;
    info!(
        name: "staging.ready",
        dir = %staging.dir().display(),
        "Staging directory ready"
    );

    let extractor = ExtractorFactory::create(&config.extraction)?;

    let orchestrator = Arc::new(BatchOrchestrator::new(
        staging,
        extractor,
        config.extraction.batch_concurrency,
        config.extraction.max_processes,
    ));

    Ok(AppState {
        config,
        orchestrator,
    })
}

/// Assemble the router with all middleware.
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let mut app = Router::new()
        .route("/upload", post(api::upload::upload_handler))
        .route("/health", get(api::health_check))
        .layer(DefaultBodyLimit::max(config.server.body_limit_bytes));

    // Dropping the handler does not cancel the batch (it runs detached),
    // so a timed-out request still cleans up its staged files.
    if config.server.request_timeout_secs > 0 {
        let timeout_duration = Duration::from_secs(config.server.request_timeout_secs);
        app = app.layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => ApiError::Timeout.into_response(),
                }
            },
        ));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let state = build_state(Arc::clone(&config)).await?;
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
