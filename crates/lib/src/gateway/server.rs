//! Gateway HTTP server.

use crate::config::{self, Config};
use crate::console::{Bridge, ErrorCode, NormalizedResult};
use crate::gateway::protocol::{ConsoleParams, Health, JobTasksQuery};
use crate::init;
use crate::jobs;
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use std::path::PathBuf;
use std::sync::Arc;

const PROTOCOL_VERSION: u32 = 1;

/// Shared state for the gateway (config and bridge).
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub bridge: Arc<Bridge>,
    /// When Some, every API request must carry `Authorization: Bearer <token>`.
    pub required_token: Option<String>,
}

impl GatewayState {
    pub fn new(config: Config) -> Self {
        let required_token = require_token(&config);
        let bridge = Bridge::from_config(&config);
        Self {
            config: Arc::new(config),
            bridge: Arc::new(bridge),
            required_token,
        }
    }
}

/// When auth mode is token and a token is configured, returns it for request validation.
fn require_token(config: &Config) -> Option<String> {
    if config.gateway.auth.mode == config::GatewayAuthMode::Token {
        config::resolve_gateway_token(config)
    } else {
        None
    }
}

fn authorize(state: &GatewayState, headers: &HeaderMap) -> Result<(), StatusCode> {
    let Some(ref expected) = state.required_token else {
        return Ok(());
    };
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .unwrap_or("");
    if provided == expected.as_str() {
        Ok(())
    } else {
        log::warn!("rejected gateway request with missing or wrong token");
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// Run a bridge call on the blocking pool. A failed worker becomes an internal-error envelope.
async fn blocking<F>(f: F) -> NormalizedResult
where
    F: FnOnce() -> NormalizedResult + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => {
            log::error!("bridge worker failed: {}", e);
            NormalizedResult::failure(ErrorCode::InternalError)
        }
    }
}

/// Routes for the gateway; exposed for embedding and tests.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/api/directors", get(directors_http))
        .route("/api/console", post(console_http))
        .route("/api/jobs/tasks", get(job_tasks_http))
        .with_state(state)
}

pub async fn run_gateway(config: Config, config_path: PathBuf) -> Result<()> {
    init::require_initialized(&config_path)?;
    let bind = config.gateway.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) {
        let token = config::resolve_gateway_token(&config);
        if token.is_none() || config.gateway.auth.mode != config::GatewayAuthMode::Token {
            anyhow::bail!(
                "refusing to bind gateway to {} without auth (set gateway.auth.mode to \"token\" and gateway.auth.token or BRIDGE_GATEWAY_TOKEN)",
                bind
            );
        }
    }

    let port = config.gateway.port;
    log::info!(
        "console: {} (config {}, sudo: {}, mode: {:?})",
        config.console.bin_path,
        config.console.cfg_path,
        config.console.use_sudo,
        config.console.exec_mode
    );
    let app = router(GatewayState::new(config));

    let bind_addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<Health> {
    Json(Health {
        runtime: "running".to_string(),
        protocol: PROTOCOL_VERSION,
        port: state.config.gateway.port,
    })
}

/// GET /api/directors lists directors known to the console.
async fn directors_http(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<Json<NormalizedResult>, StatusCode> {
    authorize(&state, &headers)?;
    let bridge = state.bridge.clone();
    Ok(Json(blocking(move || bridge.list_directors().into_result()).await))
}

/// POST /api/console runs one allowlisted command.
async fn console_http(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(params): Json<ConsoleParams>,
) -> Result<Json<NormalizedResult>, StatusCode> {
    authorize(&state, &headers)?;
    let bridge = state.bridge.clone();
    let result = blocking(move || {
        bridge.command(
            params.director.as_deref(),
            params.command,
            params.user.as_deref(),
        )
    })
    .await;
    Ok(Json(result))
}

/// GET /api/jobs/tasks lists confirmed job names per director.
async fn job_tasks_http(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(query): Query<JobTasksQuery>,
) -> Result<Json<NormalizedResult>, StatusCode> {
    authorize(&state, &headers)?;
    let bridge = state.bridge.clone();
    let result = blocking(move || {
        jobs::job_tasks(&bridge, query.user.as_deref(), query.limit.unwrap_or(0))
    })
    .await;
    Ok(Json(result))
}
