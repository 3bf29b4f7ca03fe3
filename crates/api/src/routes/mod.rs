//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, error::ApiError, middleware::auth::auth_middleware};

pub mod auth;
pub mod posts;
pub mod status;
pub mod users;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(users::protected_routes())
        .merge(posts::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(status::routes())
        .merge(auth::routes())
        .merge(users::routes())
        .merge(protected_routes)
}

/// Fallback for unmatched routes.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
