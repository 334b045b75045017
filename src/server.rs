//! HTTP API for the command catalog.
//!
//! Every catalog request reloads the catalog from disk, so responses always
//! reflect the current state of the mirror checkout.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | HTML documentation page |
//! | `GET`  | `/cmds` | All commands, each tagged with its category |
//! | `GET`  | `/cmds/{category}` | Commands in one category |
//! | `GET`  | `/cmds/{category}/{command}` | A single command |
//! | `POST` | `/update` | Run a mirror sync cycle now |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Lookup failures and unknown routes return `404` with a flat body:
//!
//! ```json
//! { "error": "Category 'vip' not found" }
//! ```
//!
//! `POST /update` always answers `200`; the body says whether the mirror was
//! updated, already current, or failed.
//!
//! # CORS
//!
//! Every response carries `Access-Control-Allow-Origin: *`. Any `OPTIONS`
//! request is answered as a pre-flight with an empty `200`.

use anyhow::Context;
use axum::{
    extract::{Path, Request, State},
    http::{
        header::{ACCEPT, ALLOW, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::catalog::{load_catalog, Catalog, LookupError};
use crate::config::Config;
use crate::mirror::{spawn_poller, Mirror};
use crate::models::{Command, SyncOutcome};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Directory holding one subdirectory per category.
    catalog_root: Arc<PathBuf>,
    /// Present only when a remote is configured.
    mirror: Option<Arc<Mirror>>,
}

impl AppState {
    pub fn new(catalog_root: impl Into<PathBuf>, mirror: Option<Arc<Mirror>>) -> Self {
        Self {
            catalog_root: Arc::new(catalog_root.into()),
            mirror,
        }
    }

    /// Load a fresh catalog on the blocking pool.
    async fn load(&self) -> Result<Catalog, AppError> {
        let root = self.catalog_root.clone();
        tokio::task::spawn_blocking(move || load_catalog(&root))
            .await
            .map_err(|e| internal(format!("catalog load failed: {}", e)))
    }
}

/// Starts the HTTP server and, when a remote is configured, the mirror poller.
///
/// Runs until SIGINT/SIGTERM. On shutdown the server drains in-flight
/// requests, then the poller is cancelled and awaited.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let addr = config.server.socket_addr()?;
    let shutdown = CancellationToken::new();

    let mirror = Mirror::from_config(&config.mirror).map(Arc::new);
    let poller = match &mirror {
        Some(mirror) => {
            if let Err(e) = mirror.init().await {
                tracing::error!(error = %format!("{:#}", e), "mirror initialization failed");
            }
            Some(spawn_poller(
                mirror.clone(),
                config.mirror.poll_interval(),
                shutdown.clone(),
            ))
        }
        None => {
            tracing::info!("no mirror.repo_url configured; background sync disabled");
            None
        }
    };

    let app = build_router(AppState::new(config.catalog.root.clone(), mirror));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(
        catalog = %config.catalog.root.display(),
        "Server is running at http://{}",
        addr
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    shutdown.cancel();
    if let Some(poller) = poller {
        if let Err(e) = poller.await {
            tracing::error!(error = %e, "mirror poller ended abnormally");
        }
    }

    served.context("HTTP server failed")
}

/// Build the router with CORS, tracing and the `Allow` header on `OPTIONS`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/cmds", get(handle_all_commands))
        .route("/cmds/", get(handle_all_commands))
        .route("/cmds/{category}", get(handle_category))
        .route("/cmds/{category}/{command}", get(handle_command))
        .route("/update", post(handle_update))
        .fallback(handle_not_found)
        .layer(cors_layer())
        .layer(middleware::from_fn(allow_header))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
        .expose_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86_400))
}

async fn allow_header(req: Request, next: Next) -> Response {
    let is_options = req.method() == Method::OPTIONS;
    let mut response = next.run(req).await;
    if is_options {
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static("GET, POST, OPTIONS"));
    }
    response
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown requested");
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        not_found(err.to_string())
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

async fn handle_not_found() -> AppError {
    not_found("Not found")
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /cmds ============

async fn handle_all_commands(
    State(state): State<AppState>,
) -> Result<Json<Vec<Command>>, AppError> {
    let catalog = state.load().await?;
    Ok(Json(catalog.into_commands()))
}

async fn handle_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Command>>, AppError> {
    let catalog = state.load().await?;
    let commands = catalog
        .in_category(&category)?
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(commands))
}

async fn handle_command(
    State(state): State<AppState>,
    Path((category, command)): Path<(String, String)>,
) -> Result<Json<Command>, AppError> {
    let catalog = state.load().await?;
    let found = catalog.command(&category, &command)?;
    Ok(Json(found.clone()))
}

// ============ POST /update ============

#[derive(Debug, Serialize)]
struct UpdateResponse {
    success: bool,
    /// `updated`, `unchanged` or `error`.
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    revision: Option<String>,
}

impl From<SyncOutcome> for UpdateResponse {
    fn from(outcome: SyncOutcome) -> Self {
        match outcome {
            SyncOutcome::Updated { revision } => Self {
                success: true,
                status: "updated",
                message: "Repository updated successfully".to_string(),
                revision: Some(revision),
            },
            SyncOutcome::Unchanged => Self {
                success: false,
                status: "unchanged",
                message: "No updates available".to_string(),
                revision: None,
            },
            SyncOutcome::Failed { message } => Self {
                success: false,
                status: "error",
                message,
                revision: None,
            },
        }
    }
}

/// Runs a sync cycle to completion before answering.
async fn handle_update(State(state): State<AppState>) -> Json<UpdateResponse> {
    let outcome = match &state.mirror {
        Some(mirror) => mirror.run_cycle().await,
        None => SyncOutcome::Failed {
            message: "mirror not configured".to_string(),
        },
    };
    Json(outcome.into())
}

// ============ GET / ============

async fn handle_index() -> Html<String> {
    Html(documentation_page())
}

fn documentation_page() -> String {
    let example = serde_json::json!({
        "name": "convert",
        "aliases": [],
        "help": "Convert image to different format",
        "syntax": "convert [format] (url)",
        "example": "convert png",
        "cooldown": false,
        "permissions": false,
        "donor": true,
        "donor_tier": 1,
        "parameters": ["format", "url"],
    });
    let example = serde_json::to_string_pretty(&example).unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>Commands API</title>
    <style>
      body {{ font-family: Arial, sans-serif; margin: 20px; }}
      h1 {{ color: #333; }}
      pre {{ background-color: #f4f4f4; padding: 10px; border-radius: 5px; }}
    </style>
  </head>
  <body>
    <h1>Commands API</h1>
    <p>This API serves command data from JSON files.</p>
    <h2>Available Endpoints:</h2>
    <ul>
      <li><code>GET /cmds</code> - List all commands from all categories</li>
      <li><code>GET /cmds/{{category}}</code> - List all commands in a specific category</li>
      <li><code>GET /cmds/{{category}}/{{command}}</code> - Get details for a specific command</li>
      <li><code>POST /update</code> - Pull the latest commands from the source repository</li>
    </ul>
    <h2>Example Command Structure:</h2>
    <pre>{}</pre>
  </body>
</html>
"#,
        example
    )
}
