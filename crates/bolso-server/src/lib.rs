//! Bolso Web Server
//!
//! Axum-based HTTP front for the expense chat pipeline:
//! - Messaging gateway webhook (form in, TwiML out)
//! - JSON chat endpoint for other clients
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use bolso_core::ai::TaskRunner;
use bolso_core::db::Database;
use bolso_core::IntentRouter;

mod handlers;

pub use handlers::twiml;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins for the JSON API (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub router: IntentRouter,
    pub config: ServerConfig,
    /// Date used for every message instead of the local date (for testing)
    pub fixed_today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(db: Database, runner: Option<TaskRunner>, config: ServerConfig) -> Self {
        Self {
            router: IntentRouter::new(Arc::new(db), runner),
            config,
            fixed_today: None,
        }
    }

    /// Date a message is recorded under
    pub fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Create the application router
pub fn create_router(db: Database, runner: Option<TaskRunner>, config: ServerConfig) -> Router {
    create_router_with_state(Arc::new(AppState::new(db, runner, config)))
}

pub fn create_router_with_state(state: Arc<AppState>) -> Router {
    let cors = if state.config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/webhook/whatsapp",
            get(handlers::health).post(handlers::whatsapp_webhook),
        )
        .route("/api/messages", post(handlers::post_message))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server with the default configuration
pub async fn serve(
    db: Database,
    runner: Option<TaskRunner>,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    serve_with_config(db, runner, host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    runner: Option<TaskRunner>,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    check_ai_connection(runner.as_ref()).await;

    let app = create_router(db, runner, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log completion backend status
async fn check_ai_connection(runner: Option<&TaskRunner>) {
    match runner {
        Some(runner) => {
            let client = runner.client();
            let router_info = runner.router_info();

            if client.health_check().await {
                info!(
                    "✅ Completion backend connected: {} (default: {})",
                    client.host(),
                    router_info.default_model
                );
            } else {
                warn!(
                    "⚠️  Completion backend configured but not responding: {} (replies use fallbacks)",
                    client.host()
                );
            }
        }
        None => {
            info!("ℹ️  Completion backend not configured (set OLLAMA_HOST to enable)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err.into()),
        }
    }
}
