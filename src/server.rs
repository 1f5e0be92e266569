//! HTTP surface.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /` | plain-text welcome message |
//! | `GET /api/articles` | JSON array of zero or one [`ArticleReport`](crate::models::ArticleReport) |
//!
//! `/api/articles` always answers `200 OK`. Stage failures absorbed by the
//! pipeline are listed in the `x-pipeline-issues` header so that a failure
//! can be told apart from an index page without articles. Every origin is
//! allowed by CORS.

use crate::models::ArticleReport;
use crate::pipeline::Pipeline;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

pub const PIPELINE_ISSUES_HEADER: HeaderName = HeaderName::from_static("x-pipeline-issues");

const WELCOME: &str = "Welcome to the News Quiz API. GET /api/articles for today's summarized article.";

/// State shared by every request.
pub struct AppState {
    pub pipeline: Pipeline,
    pub index_url: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/api/articles", get(list_articles))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn welcome() -> &'static str {
    WELCOME
}

#[instrument(level = "info", skip_all)]
async fn list_articles(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let outcome = state.pipeline.build_report(&state.index_url).await;
    let issues = outcome
        .issues_header()
        .and_then(|value| HeaderValue::from_str(&value).ok());
    info!(
        reports = outcome.reports.len(),
        issues = outcome.issues.len(),
        "Serving articles"
    );

    let mut response = Json::<Vec<ArticleReport>>(outcome.reports).into_response();
    if let Some(value) = issues {
        response.headers_mut().insert(PIPELINE_ISSUES_HEADER, value);
    }
    response
}
