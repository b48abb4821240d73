//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all API endpoints
//! - Middleware stack (allow-list, logging, compression, etc.)
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::metrics::{install_recorder, PrometheusIntakeMetrics};
use crate::middleware::{ip_allowlist, log_requests, request_id};
use crate::routes::{api_info, not_found};
use crate::routes::{form_options, health, submit};
use crate::state::ServerState;
use harvest::IdentityPolicy;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Routes are divided into:
/// - Public routes: /, /health, /ready, /metrics and form options
/// - Submission routes: /submit and /api/v1/submissions (IP allow-list)
///
/// Middleware stack (outermost last):
/// 1. Request logging
/// 2. Request ID tracking
/// 3. CORS
/// 4. Compression
/// 5. Timeout handling
/// 6. IP allow-list (submission routes only)
pub fn build_router(state: Arc<ServerState>) -> Router {
    // CORS layer
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let public_routes = Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .route("/api/v1/form-options", get(form_options::form_options));

    let submission_routes = Router::new()
        .route("/submit", post(submit::submit_form))
        .route("/api/v1/submissions", post(submit::submit_json))
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(from_fn_with_state(state.clone(), ip_allowlist));

    Router::new()
        .merge(public_routes)
        .merge(submission_routes)
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the harvest intake HTTP server
///
/// Initializes logging, opens the configured stores and serves until
/// SIGTERM or Ctrl+C.
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    let mut state = ServerState::new(config.clone())?;

    if config.metrics_enabled {
        let handle = install_recorder()?;
        harvest::set_intake_metrics(Some(Arc::new(PrometheusIntakeMetrics)));
        state = state.with_metrics(handle);
    }

    let stores = state.intake.store_names().join(", ");
    let policy = state.intake.policy();
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = config.socket_addr()?;
    log_startup(&config, addr, &stores, policy);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn log_startup(config: &ServerConfig, addr: SocketAddr, stores: &str, policy: IdentityPolicy) {
    tracing::info!(
        %addr,
        stores = %stores,
        identity_policy = %policy,
        "Starting harvest intake server"
    );
    tracing::info!(
        "Timeout: {}s, Max body: {}KB",
        config.timeout_secs,
        config.max_body_size_kb
    );
    tracing::info!(
        "CORS: {}, Metrics: {}, Allowed IPs: {}",
        config.enable_cors,
        config.metrics_enabled,
        if config.allowed_ips.is_empty() {
            "any".to_string()
        } else {
            config.allowed_ips.join(", ")
        }
    );

    if config.allowed_ips.is_empty() {
        tracing::warn!("No allowed_ips configured, submissions are open to every client");
    }
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
