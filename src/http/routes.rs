use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::foundation::core::{Mode, Request};
use crate::foundation::error::BratError;
use crate::http::error::ApiError;
use crate::service::orchestrator::Orchestrator;

/// State shared by every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Generation entry point.
    pub orchestrator: Orchestrator,
}

impl AppState {
    /// Wrap an orchestrator.
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }
}

/// Query string of `GET /`.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateQuery {
    /// Text to render.
    pub text: Option<String>,
    /// Ask for a video instead of a still image. Must be `true` or `false` when present.
    #[serde(default)]
    pub video: bool,
}

/// Router with `GET /` and `GET /healthz`, wrapped in request tracing.
///
/// Request spans and response events are emitted at INFO so the default filter shows one line
/// per request.
pub fn create_router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));
    Router::new()
        .route("/", get(generate))
        .route("/healthz", get(healthz))
        .layer(trace)
        .with_state(state)
}

async fn generate(
    State(state): State<AppState>,
    query: Result<Query<GenerateQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::invalid_input(e.body_text()))?;
    let text = match query.text {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Err(ApiError::missing_text()),
    };
    let mode = if query.video { Mode::Video } else { Mode::Image };

    let request = Request::new(text, mode)?;
    let artifact = state.orchestrator.generate(&request).await?;

    // The cache may evict the file between lookup and read; that surfaces as a generation error.
    let body = tokio::fs::read(&artifact.path)
        .await
        .map_err(|e| ApiError::from(BratError::Io(e)))?;
    Ok(([(header::CONTENT_TYPE, mode.content_type())], body).into_response())
}

async fn healthz() -> &'static str {
    "ok"
}
