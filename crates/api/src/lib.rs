//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - Request extractors
//! - Error-to-response mapping

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod views;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use agora_core::photo::PhotoRef;
use agora_core::storage::{PhotoStorage, PhotoUpload};
use agora_shared::JwtService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, header},
};
use sea_orm::DatabaseConnection;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ApiResult};

/// Room left in the request body limit for multipart framing and text fields.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Storage service for photos (optional).
    pub storage: Option<Arc<PhotoStorage>>,
    /// Largest accepted request body in bytes.
    pub body_limit: usize,
}

impl AppState {
    /// Builds the state, sizing the body limit to the storage upload limit.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        jwt_service: JwtService,
        storage: Option<PhotoStorage>,
    ) -> Self {
        let max_file_size = storage.as_ref().map_or(
            agora_core::storage::StorageConfig::DEFAULT_MAX_FILE_SIZE,
            |s| s.config().max_file_size,
        );

        Self {
            db: Arc::new(db),
            jwt_service: Arc::new(jwt_service),
            storage: storage.map(Arc::new),
            body_limit: usize::try_from(max_file_size)
                .unwrap_or(usize::MAX)
                .saturating_add(FORM_OVERHEAD_BYTES),
        }
    }

    /// The photo storage, or a 503 when none is configured.
    pub fn photo_storage(&self) -> ApiResult<&PhotoStorage> {
        self.storage
            .as_deref()
            .ok_or_else(ApiError::storage_not_configured)
    }

    /// Uploads a photo if one was sent.
    pub async fn store_photo(&self, upload: Option<PhotoUpload>) -> ApiResult<Option<PhotoRef>> {
        match upload {
            Some(upload) => Ok(Some(self.photo_storage()?.upload(upload).await?)),
            None => Ok(None),
        }
    }

    /// Deletes stored photos, logging failures instead of returning them.
    pub async fn discard_photos<I, S>(&self, filenames: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(storage) = &self.storage {
            for filename in filenames {
                storage.delete_quietly(filename.as_ref()).await;
            }
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes_with_state(state.clone()))
        .fallback(routes::not_found)
        .method_not_allowed_fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(state.body_limit))
        .layer(CompressionLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-dns-prefetch-control"),
            HeaderValue::from_static("off"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
