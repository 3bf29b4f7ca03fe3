//! Service endpoints: status probe, robots.txt and favicon.

use axum::{
    Json, Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::AppState;
use crate::extractors::ValidatedQuery;

/// Query accepted by `GET /status`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct StatusQuery {
    /// Whether to return a body.
    #[serde(default)]
    pub results: Option<bool>,
}

/// Creates the service routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(status))
        .route("/robots.txt", get(robots))
        .route("/favicon.ico", get(favicon))
}

/// GET /status - 200 with the server time when `results=true`, else 204.
async fn status(ValidatedQuery(query): ValidatedQuery<StatusQuery>) -> Response {
    if query.results.unwrap_or(false) {
        (
            StatusCode::OK,
            Json(json!({ "timestamp": Utc::now().to_rfc3339() })),
        )
            .into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

async fn robots() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "User-agent: *\nDisallow: /",
    )
}

async fn favicon() -> StatusCode {
    StatusCode::NOT_FOUND
}
