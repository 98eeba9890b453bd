use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
    routing::get,
};
use std::sync::Arc;
use std::time::Duration;

use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::api;
use crate::assignments::{
    AssignmentService, FileVault, InMemorySessionValues, SessionAssignmentStore, SessionRegistry,
};
use crate::config::AppConfig;
use crate::security::rate_limit::{AppRateLimiter, rate_limit_middleware};
use crate::session::session_middleware;

/// Wire the core components together from configuration.
pub fn build_state(config: Arc<AppConfig>) -> AppState {
    let registry = Arc::new(SessionRegistry::new(config.session.ttl()));
    let store = Arc::new(SessionAssignmentStore::new(Arc::new(
        InMemorySessionValues::new(),
    )));
    let vault = FileVault::new(&config.storage.root, &config.storage.namespace);
    let assignments = Arc::new(AssignmentService::new(registry, store, vault));

    let rate_limiter = Arc::new(AppRateLimiter::new(
        config.resilience.requests_per_second,
        config.resilience.burst_size,
    ));

    AppState {
        assignments,
        rate_limiter,
        config,
    }
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    let vault = state.assignments.vault();
    let files_route = format!("/{}", vault.namespace());
    let files = ServeDir::new(vault.public_dir());

    // A very long timeout stands in for "disabled" so the layer stack keeps one type.
    let timeout_duration = if config.resilience.timeout_disabled {
        Duration::from_secs(365 * 24 * 60 * 60)
    } else {
        Duration::from_secs(config.resilience.request_timeout_seconds)
    };

    Router::new()
        .nest("/api/assignment", api::assignments::router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .nest_service(&files_route, files)
        .route("/health", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(config.resilience.max_upload_bytes))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            },
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
///
/// The session registry lives exactly as long as this call.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    info!(
        name: "config.loaded",
        ttl_seconds = config.session.ttl_seconds,
        storage_root = %config.storage.root.display(),
        namespace = %config.storage.namespace,
        "Configuration loaded"
    );

    let state = build_state(Arc::clone(&config));
    tokio::fs::create_dir_all(state.assignments.vault().public_dir()).await?;
    let registry = Arc::clone(state.assignments.registry());

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(
        name: "server.stopped",
        sessions = registry.len(),
        "Server stopped, in-memory sessions discarded"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
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
                tracing::error!("Failed to install SIGTERM handler: {e}");
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
