//! User routes: registration, profiles, photos and the follow graph.

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult, is_unique_violation},
    extractors::{PhotoForm, ValidatedJson, ValidatedPath, ValidatedQuery},
    middleware::auth::AuthUser,
    views::{post_views, user_view, user_views},
};
use agora_core::access::{ensure_can_follow, ensure_self};
use agora_core::auth::hash_password;
use agora_db::{
    FollowRepository, NewUser, PostRepository, UserChanges, UserRepository, entities::users,
};
use agora_shared::{
    AppError,
    auth::{CreateUserRequest, UpdateUserRequest},
    types::{PageRequest, UserId},
};

/// Most suggestions returned by find-people.
const FIND_PEOPLE_LIMIT: u64 = 10;

const EMAIL_IN_USE: &str = "Email already in use";

/// Creates the public user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}/photo", get(user_photo))
}

/// Creates the user routes that require a token.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/{id}/follow", post(follow))
        .route("/users/{id}/unfollow", post(unfollow))
        .route("/users/{id}/find-people", get(find_people))
        .route("/users/{id}/feed", get(feed))
        .route("/users/{id}/posts", get(user_posts))
}

async fn find_user(repo: &UserRepository, id: Uuid) -> ApiResult<users::Model> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// GET /users - List users, oldest first.
async fn list_users(
    State(state): State<AppState>,
    ValidatedQuery(page): ValidatedQuery<PageRequest>,
) -> ApiResult<impl IntoResponse> {
    let users = UserRepository::new((*state.db).clone()).list(&page).await?;
    let users = user_views(&state.db, users).await?;

    Ok(Json(json!({ "users": users })))
}

/// POST /users - Register a new user.
async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let user_repo = UserRepository::new((*state.db).clone());

    if user_repo.email_exists(&payload.email).await? {
        return Err(ApiError::conflict(EMAIL_IN_USE));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = user_repo
        .create(NewUser {
            name: &payload.name,
            email: &payload.email,
            password_hash: &password_hash,
        })
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict(EMAIL_IN_USE)
            } else {
                ApiError::from(e)
            }
        })?;

    info!(user_id = %user.id, "User registered");

    let user = user_view(&state.db, user).await?;
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

/// GET /users/{id} - Fetch a profile.
async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let user = find_user(&UserRepository::new((*state.db).clone()), id).await?;
    let user = user_view(&state.db, user).await?;

    Ok(Json(json!({ "user": user })))
}

/// PUT /users/{id} - Update your own profile, optionally replacing the photo.
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
    form: PhotoForm<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    ensure_self(UserId::from(id), auth.id())?;

    let user_repo = UserRepository::new((*state.db).clone());
    let user = find_user(&user_repo, id).await?;
    let old_photo = user.photo_filename.clone();

    let photo = state.store_photo(form.photo).await?;
    let new_photo = photo.as_ref().map(|p| p.filename.clone());

    let changes = UserChanges {
        name: form.data.name,
        about: form.data.about,
        photo,
    };
    let user = match user_repo.update(user, changes).await {
        Ok(user) => user,
        Err(e) => {
            state.discard_photos(new_photo).await;
            return Err(e.into());
        }
    };

    if new_photo.is_some() {
        state.discard_photos(old_photo).await;
    }

    info!(user_id = %user.id, photo_replaced = new_photo.is_some(), "User updated");

    let user = user_view(&state.db, user).await?;
    Ok(Json(json!({ "user": user })))
}

/// DELETE /users/{id} - Delete your own account and everything you posted.
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ensure_self(UserId::from(id), auth.id())?;

    let user_repo = UserRepository::new((*state.db).clone());
    let user = find_user(&user_repo, id).await?;

    let mut photos = PostRepository::new((*state.db).clone())
        .photo_filenames_by_author(id)
        .await?;
    photos.extend(user.photo_filename);

    user_repo.delete(id).await?;
    state.discard_photos(photos).await;

    info!(user_id = %id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/{id}/photo - Stream the stored profile photo.
async fn user_photo(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> ApiResult<Response> {
    let user = find_user(&UserRepository::new((*state.db).clone()), id).await?;
    let photo = user
        .photo()
        .ok_or_else(|| ApiError::not_found("Photo not found"))?;

    let data = state.photo_storage()?.read(&photo.filename).await?;
    let content_type = HeaderValue::from_str(&photo.content_type)
        .map_err(|e| ApiError(AppError::Internal(e.to_string())))?;

    Ok(([(header::CONTENT_TYPE, content_type)], Body::from(data)).into_response())
}

/// POST /users/{id}/follow - Follow a user. Responds with the caller.
async fn follow(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ensure_can_follow(auth.id(), UserId::from(id))?;

    let user_repo = UserRepository::new((*state.db).clone());
    find_user(&user_repo, id).await?;

    let created = FollowRepository::new((*state.db).clone())
        .follow(auth.user_id(), id)
        .await?;
    if created {
        info!(follower = %auth.user_id(), followee = %id, "User followed");
    }

    let me = find_user(&user_repo, auth.user_id()).await?;
    let me = user_view(&state.db, me).await?;
    Ok(Json(json!({ "user": me })))
}

/// POST /users/{id}/unfollow - Stop following a user. Responds with the caller.
async fn unfollow(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ensure_can_follow(auth.id(), UserId::from(id))?;

    let user_repo = UserRepository::new((*state.db).clone());
    find_user(&user_repo, id).await?;

    let removed = FollowRepository::new((*state.db).clone())
        .unfollow(auth.user_id(), id)
        .await?;
    if removed {
        info!(follower = %auth.user_id(), followee = %id, "User unfollowed");
    }

    let me = find_user(&user_repo, auth.user_id()).await?;
    let me = user_view(&state.db, me).await?;
    Ok(Json(json!({ "user": me })))
}

/// GET /users/{id}/find-people - Users `id` does not follow yet.
async fn find_people(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let user_repo = UserRepository::new((*state.db).clone());
    find_user(&user_repo, id).await?;

    let people = user_repo.find_people(id, FIND_PEOPLE_LIMIT).await?;
    let people = user_views(&state.db, people).await?;
    Ok(Json(json!({ "users": people })))
}

/// GET /users/{id}/feed - Posts by the users `id` follows, newest first.
async fn feed(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedQuery(page): ValidatedQuery<PageRequest>,
) -> ApiResult<impl IntoResponse> {
    find_user(&UserRepository::new((*state.db).clone()), id).await?;

    let posts = PostRepository::new((*state.db).clone())
        .feed(id, &page)
        .await?;
    let posts = post_views(&state.db, posts).await?;
    Ok(Json(json!({ "posts": posts })))
}

/// GET /users/{id}/posts - Posts written by `id`, newest first.
async fn user_posts(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedQuery(page): ValidatedQuery<PageRequest>,
) -> ApiResult<impl IntoResponse> {
    find_user(&UserRepository::new((*state.db).clone()), id).await?;

    let posts = PostRepository::new((*state.db).clone())
        .list_by_author(id, &page)
        .await?;
    let posts = post_views(&state.db, posts).await?;
    Ok(Json(json!({ "posts": posts })))
}
