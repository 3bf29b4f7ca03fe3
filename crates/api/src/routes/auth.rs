//! Authentication routes for sign-in and sign-out.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;
use tracing::info;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::auth::{AuthUser, TOKEN_COOKIE},
    views::user_view,
};
use agora_core::auth::verify_password_or_dummy;
use agora_db::UserRepository;
use agora_shared::auth::SignInRequest;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Creates the public auth router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/sign-in", post(sign_in))
}

/// Creates the auth routes that require a token.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/sign-out", post(sign_out))
}

fn token_cookie(value: &str, max_age_secs: i64) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&format!(
        "{TOKEN_COOKIE}={value}; Max-Age={max_age_secs}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .map_err(|e| ApiError(agora_shared::AppError::Internal(e.to_string())))
}

/// POST /sign-in - Verify credentials and issue a token.
async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignInRequest>,
) -> ApiResult<Response> {
    let user_repo = UserRepository::new((*state.db).clone());
    let user = user_repo.find_by_email(&payload.email).await?;

    let verified = verify_password_or_dummy(
        &payload.password,
        user.as_ref().map(|u| u.password_hash.as_str()),
    )?;

    let user = match user {
        Some(user) if verified => user,
        Some(user) => {
            info!(user_id = %user.id, "Failed sign-in attempt - invalid password");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }
        None => {
            info!("Sign-in attempt for unknown email");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }
    };

    let token = state.jwt_service.generate_token(user.id, &user.email)?;
    let cookie = token_cookie(&token, state.jwt_service.expires_in())?;

    info!(user_id = %user.id, "User signed in");

    let user = user_view(&state.db, user).await?;
    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(json!({ "token": token, "user": user })),
    )
        .into_response())
}

/// POST /sign-out - Clear the token cookie.
///
/// Tokens are stateless; one that was copied elsewhere stays valid until
/// it expires.
async fn sign_out(auth: AuthUser) -> ApiResult<Response> {
    info!(user_id = %auth.user_id(), "User signed out");

    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, token_cookie("", 0)?)]).into_response())
}
