//! crewdesk Server - admin console and generation gateway backend
//!
//! A thin axum HTTP adapter on top of `crewdesk-core`, providing:
//! - the streaming generation endpoint (Server-Sent Events) and its
//!   non-streaming variant
//! - CRUD endpoints for workflows, LLM providers and per-workflow models
//! - optional static frontend serving
//!
//! All domain logic lives in `crewdesk-core`. This crate can be used
//! standalone or embedded (the `crewdesk` CLI runs it via `crewdesk server`).

pub mod api;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crewdesk_core::auth::AdminSecret;
use crewdesk_core::config::{DataPaths, JobConfig};
use crewdesk_core::state::{AppState, AppStateInner};

/// Configuration for the crewdesk backend server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Root holding `public/workflows.json` and `config/*.json`.
    pub data_dir: PathBuf,
    /// Optional path to static frontend files.
    /// When set, the server serves these files for all non-API routes.
    pub static_dir: Option<String>,
    /// Without one, every mutating endpoint answers 401.
    pub admin_password: Option<String>,
    pub job: JobConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            data_dir: PathBuf::from("."),
            static_dir: None,
            admin_password: None,
            job: JobConfig::default(),
        }
    }
}

/// Create a shared `AppState` from the server configuration.
///
/// This is useful when you need to share the state between the HTTP server
/// and other consumers (e.g. the CLI running a job in-process).
pub async fn create_app_state(config: &ServerConfig) -> Result<AppState, String> {
    let paths = DataPaths::under(&config.data_dir);
    let admin = AdminSecret::new(config.admin_password.clone());
    if !admin.is_configured() {
        tracing::warn!("ADMIN_PASSWORD is not set; configuration endpoints will reject all changes");
    }

    let state: AppState = Arc::new(AppStateInner::new(&paths, config.job.clone(), admin));

    // Seeds the provider registry on first start
    state
        .provider_store
        .list()
        .await
        .map_err(|e| format!("Failed to load LLM providers: {}", e))?;

    Ok(state)
}

/// Start the crewdesk backend server.
///
/// Returns the actual address the server is listening on.
pub async fn start_server(config: ServerConfig) -> Result<SocketAddr, String> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crewdesk_server=info,crewdesk_core=info,tower_http=info".into()),
        )
        .try_init();

    tracing::info!(
        "Starting crewdesk server on {}:{}",
        config.host,
        config.port
    );

    let state = create_app_state(&config).await?;

    start_server_with_state(config, state).await
}

/// Build the full application router: API routes, health check, CORS,
/// request tracing and (optionally) the static frontend.
///
/// No request-timeout layer is installed; the job budget bounds streams.
pub fn build_router(state: AppState, static_dir: Option<&str>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .merge(api::api_router())
        .route("/api/health", axum::routing::get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(static_dir) = static_dir {
        let static_path = std::path::Path::new(static_dir);
        if static_path.is_dir() {
            tracing::info!("Serving static frontend from: {}", static_dir);
            let serve_dir = tower_http::services::ServeDir::new(static_dir)
                .not_found_service(tower_http::services::ServeFile::new(
                    static_path.join("index.html"),
                ));
            app = app.fallback_service(serve_dir);
        } else {
            tracing::warn!(
                "Static directory not found: {}. Frontend won't be served.",
                static_dir
            );
        }
    }

    app
}

/// Start the HTTP server with a pre-built `AppState`.
pub async fn start_server_with_state(
    config: ServerConfig,
    state: AppState,
) -> Result<SocketAddr, String> {
    let app = build_router(state, config.static_dir.as_deref());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    let local_addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get local address: {}", e))?;

    tracing::info!("crewdesk server listening on {}", local_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(local_addr)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "server": "crewdesk-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
