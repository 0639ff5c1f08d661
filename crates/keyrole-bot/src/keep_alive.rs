//! Keep-alive HTTP endpoints for hosts that idle silent processes.

use crate::error::{BotError, BotResult};
use axum::{extract::State, response::Html, routing::get, Json, Router};
use chrono::Utc;
use keyrole_config::KeepAliveSettings;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared by the handlers.
#[derive(Debug, Clone)]
pub struct KeepAliveState {
    started: Instant,
    platform: Arc<str>,
}

impl KeepAliveState {
    /// State for a process that started at `started`.
    #[must_use]
    pub fn new(started: Instant, platform: &str) -> Self {
        Self {
            started,
            platform: Arc::from(platform),
        }
    }

    fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

/// `/health` response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` while the process serves requests.
    pub status: &'static str,
    /// Seconds since start.
    pub uptime_seconds: u64,
    /// Hosting platform label.
    pub platform: String,
    /// Unix time of the response.
    pub timestamp: i64,
}

/// Router with `/`, `/ping` and `/health`.
pub fn router(state: KeepAliveState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/ping", get(ping))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds and serves until the process exits.
pub async fn serve(settings: KeepAliveSettings, started: Instant) -> BotResult<()> {
    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port)).await?;
    info!(address = %listener.local_addr()?, "Keep-alive server listening");

    let app = router(KeepAliveState::new(started, &settings.platform));
    axum::serve(listener, app)
        .await
        .map_err(|e| BotError::KeepAlive(e.to_string()))
}

async fn home(State(state): State<KeepAliveState>) -> Html<String> {
    let uptime = state.uptime().as_secs();
    let hours = uptime / 3600;
    let minutes = (uptime % 3600) / 60;
    Html(format!(
        "<html>\n\
         <head><title>keyrole status</title></head>\n\
         <body>\n\
         <h1>keyrole</h1>\n\
         <p><strong>Platform:</strong> {platform}</p>\n\
         <p><strong>Status:</strong> <span style=\"color: green;\">RUNNING</span></p>\n\
         <p><strong>Uptime:</strong> {hours}h {minutes}m</p>\n\
         <p><strong>Last ping:</strong> {now}</p>\n\
         <p><a href=\"/ping\">Ping endpoint</a></p>\n\
         </body>\n\
         </html>\n",
        platform = state.platform,
        now = Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
    ))
}

async fn ping() -> &'static str {
    "pong"
}

async fn health(State(state): State<KeepAliveState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        uptime_seconds: state.uptime().as_secs(),
        platform: state.platform.to_string(),
        timestamp: Utc::now().timestamp(),
    })
}
