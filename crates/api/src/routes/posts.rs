//! Post routes: CRUD, likes and comments. Every route requires a token.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::{PhotoForm, ValidatedJson, ValidatedPath, ValidatedQuery},
    middleware::auth::AuthUser,
    views::{PostView, post_view, post_views},
};
use agora_core::access::ensure_owner;
use agora_db::{CommentRepository, PostRepository, entities::{comments, posts}};
use agora_shared::{
    auth::{CommentRequest, PostContentRequest},
    types::{PageRequest, UserId},
};

/// Creates the post routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/posts/{id}/like", post(like_post))
        .route("/posts/{id}/dislike", post(dislike_post))
        .route("/posts/{id}/comments", post(create_comment))
        .route("/posts/{id}/comments/{comment_id}", delete(delete_comment))
}

async fn find_post(repo: &PostRepository, id: Uuid) -> ApiResult<posts::Model> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))
}

/// Loads a post the caller owns.
async fn owned_post(repo: &PostRepository, id: Uuid, auth: &AuthUser) -> ApiResult<posts::Model> {
    let post = find_post(repo, id).await?;
    ensure_owner(UserId::from(post.posted_by), auth.id())?;
    Ok(post)
}

/// Loads a comment of `post_id` that the caller owns.
async fn owned_comment(
    repo: &CommentRepository,
    post_id: Uuid,
    comment_id: Uuid,
    auth: &AuthUser,
) -> ApiResult<comments::Model> {
    let comment = repo
        .find_in_post(post_id, comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    ensure_owner(UserId::from(comment.posted_by), auth.id())?;
    Ok(comment)
}

async fn render(state: &AppState, post: posts::Model) -> ApiResult<PostView> {
    post_view(&state.db, post)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))
}

/// GET /posts - All posts, newest first.
async fn list_posts(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidatedQuery(page): ValidatedQuery<PageRequest>,
) -> ApiResult<impl IntoResponse> {
    let posts = PostRepository::new((*state.db).clone()).list(&page).await?;
    let posts = post_views(&state.db, posts).await?;

    Ok(Json(json!({ "posts": posts })))
}

/// POST /posts - Publish a post, optionally with a photo.
async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    form: PhotoForm<PostContentRequest>,
) -> ApiResult<impl IntoResponse> {
    let photo = state.store_photo(form.photo).await?;
    let photo_filename = photo.as_ref().map(|p| p.filename.clone());

    let post = match PostRepository::new((*state.db).clone())
        .create(auth.user_id(), &form.data.content, photo)
        .await
    {
        Ok(post) => post,
        Err(e) => {
            state.discard_photos(photo_filename).await;
            return Err(e.into());
        }
    };

    info!(post_id = %post.id, user_id = %auth.user_id(), "Post created");

    let post = render(&state, post).await?;
    Ok((StatusCode::CREATED, Json(json!({ "post": post }))))
}

/// GET /posts/{id}
async fn get_post(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let post = find_post(&PostRepository::new((*state.db).clone()), id).await?;
    let post = render(&state, post).await?;

    Ok(Json(json!({ "post": post })))
}

/// PUT /posts/{id} - Edit your own post, optionally replacing the photo.
async fn update_post(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
    form: PhotoForm<PostContentRequest>,
) -> ApiResult<impl IntoResponse> {
    let repo = PostRepository::new((*state.db).clone());
    let post = owned_post(&repo, id, &auth).await?;
    let old_photo = post.photo_filename.clone();

    let photo = state.store_photo(form.photo).await?;
    let new_photo = photo.as_ref().map(|p| p.filename.clone());

    let post = match repo.update(post, &form.data.content, photo).await {
        Ok(post) => post,
        Err(e) => {
            state.discard_photos(new_photo).await;
            return Err(e.into());
        }
    };

    if new_photo.is_some() {
        state.discard_photos(old_photo).await;
    }

    info!(post_id = %post.id, photo_replaced = new_photo.is_some(), "Post updated");

    let post = render(&state, post).await?;
    Ok(Json(json!({ "post": post })))
}

/// DELETE /posts/{id} - Delete your own post with its comments and likes.
async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = PostRepository::new((*state.db).clone());
    let post = owned_post(&repo, id, &auth).await?;

    repo.delete(post.id).await?;
    state.discard_photos(post.photo_filename).await;

    info!(post_id = %id, "Post deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /posts/{id}/like
async fn like_post(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = PostRepository::new((*state.db).clone());
    let post = find_post(&repo, id).await?;

    if repo.like(id, auth.user_id()).await? {
        info!(post_id = %id, user_id = %auth.user_id(), "Post liked");
    }

    let post = render(&state, post).await?;
    Ok(Json(json!({ "post": post })))
}

/// POST /posts/{id}/dislike
async fn dislike_post(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let repo = PostRepository::new((*state.db).clone());
    let post = find_post(&repo, id).await?;

    if repo.dislike(id, auth.user_id()).await? {
        info!(post_id = %id, user_id = %auth.user_id(), "Post like removed");
    }

    let post = render(&state, post).await?;
    Ok(Json(json!({ "post": post })))
}

/// POST /posts/{id}/comments - Comment on a post. Responds with the post.
async fn create_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<CommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let post = find_post(&PostRepository::new((*state.db).clone()), id).await?;

    let comment = CommentRepository::new((*state.db).clone())
        .create(post.id, auth.user_id(), &payload.content)
        .await?;

    info!(post_id = %id, comment_id = %comment.id, "Comment added");

    let post = render(&state, post).await?;
    Ok((StatusCode::CREATED, Json(json!({ "post": post }))))
}

/// DELETE /posts/{id}/comments/{comment_id} - Remove your own comment.
async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedPath((id, comment_id)): ValidatedPath<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let post = find_post(&PostRepository::new((*state.db).clone()), id).await?;

    let repo = CommentRepository::new((*state.db).clone());
    let comment = owned_comment(&repo, post.id, comment_id, &auth).await?;
    repo.delete(comment.id).await?;

    info!(post_id = %id, comment_id = %comment_id, "Comment deleted");

    let post = render(&state, post).await?;
    Ok(Json(json!({ "post": post })))
}

#[cfg(test)]
mod integration_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use uuid::Uuid;

    use crate::test_support::{
        FilePart, PNG_BYTES, TestApp, json_request, multipart_request, spawn_app,
        spawn_app_without_storage,
    };

    fn id_of(value: &Value) -> String {
        value["id"].as_str().unwrap().to_string()
    }

    async fn comment_on(app: &TestApp, token: &str, post_id: &str, content: &str) -> Value {
        let response = app
            .send(json_request(
                "POST",
                &format!("/posts/{post_id}/comments"),
                Some(token),
                Some(json!({ "content": content })),
            ))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["post"].clone()
    }

    #[tokio::test]
    async fn test_create_post_json() {
        let app = spawn_app_without_storage().await;
        let (alice, token) = app.signed_in_user("Alice Liddell").await;

        let post = app.create_post(&token, "hello world").await;

        assert_eq!(post["content"], "hello world");
        assert_eq!(post["postedBy"]["id"], alice.as_str());
        assert_eq!(post["postedBy"]["name"], "Alice Liddell");
        assert!(post["postedBy"].get("password_hash").is_none());
        assert_eq!(post["likes"], json!([]));
        assert_eq!(post["comments"], json!([]));
        assert!(post["photo"].is_null());
    }

    #[tokio::test]
    async fn test_create_post_requires_content_and_token() {
        let app = spawn_app_without_storage().await;
        let (_, token) = app.signed_in_user("Alice Liddell").await;

        let response = app
            .send(json_request(
                "POST",
                "/posts",
                Some(&token),
                Some(json!({ "content": "" })),
            ))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);

        let response = app
            .send(json_request(
                "POST",
                "/posts",
                None,
                Some(json!({ "content": "anonymous" })),
            ))
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_post_with_photo() {
        let app = spawn_app().await;
        let (_, token) = app.signed_in_user("Alice Liddell").await;

        let response = app
            .send(multipart_request(
                "POST",
                "/posts",
                &token,
                &[("content", "look at this")],
                Some(FilePart {
                    filename: "cat picture.png",
                    content_type: "image/png",
                    data: PNG_BYTES,
                }),
            ))
            .await;

        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        let post = &response.body["post"];
        assert_eq!(post["content"], "look at this");
        assert_eq!(post["photo"]["contentType"], "image/png");
        let filename = post["photo"]["filename"].as_str().unwrap();
        assert!(filename.ends_with("cat_picture.png"));
        assert!(
            post["photo"]["url"]
                .as_str()
                .unwrap()
                .starts_with("http://localhost:8080/uploads/")
        );

        let storage = app.state.storage.as_ref().unwrap();
        assert_eq!(storage.read(filename).await.unwrap(), PNG_BYTES);
    }

    #[tokio::test]
    async fn test_multipart_without_file_creates_plain_post() {
        let app = spawn_app_without_storage().await;
        let (_, token) = app.signed_in_user("Alice Liddell").await;

        let response = app
            .send(multipart_request(
                "POST",
                "/posts",
                &token,
                &[("content", "just words")],
                None,
            ))
            .await;

        assert_eq!(response.status, StatusCode::CREATED);
        assert!(response.body["post"]["photo"].is_null());
    }

    #[tokio::test]
    async fn test_multipart_without_boundary_is_bad_request() {
        let app = spawn_app_without_storage().await;
        let (_, token) = app.signed_in_user("Alice Liddell").await;

        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/posts")
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "multipart/form-data")
            .body(axum::body::Body::from("content=hello"))
            .unwrap();
        let response = app.send(request).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.body["message"].is_string());
    }

    #[tokio::test]
    async fn test_list_posts_newest_first() {
        let app = spawn_app_without_storage().await;
        let (_, token) = app.signed_in_user("Alice Liddell").await;

        let first = app.create_post(&token, "first").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = app.create_post(&token, "second").await;

        let response = app
            .send(json_request("GET", "/posts", Some(&token), None))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        let ids: Vec<String> = response.body["posts"]
            .as_array()
            .unwrap()
            .iter()
            .map(id_of)
            .collect();
        assert_eq!(ids, vec![id_of(&second), id_of(&first)]);

        let response = app
            .send(json_request("GET", "/posts?page=2&per_page=1", Some(&token), None))
            .await;
        assert_eq!(response.body["posts"][0]["id"], first["id"]);
    }

    #[tokio::test]
    async fn test_get_post_not_found_and_bad_id() {
        let app = spawn_app_without_storage().await;
        let (_, token) = app.signed_in_user("Alice Liddell").await;

        let response = app
            .send(json_request(
                "GET",
                &format!("/posts/{}", Uuid::now_v7()),
                Some(&token),
                None,
            ))
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["message"], "Post not found");

        let response = app
            .send(json_request("GET", "/posts/123", Some(&token), None))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_post_owner_only() {
        let app = spawn_app_without_storage().await;
        let (_, owner) = app.signed_in_user("Alice Liddell").await;
        let (_, other) = app.signed_in_user("Mallory User").await;
        let post = app.create_post(&owner, "original").await;
        let uri = format!("/posts/{}", id_of(&post));

        let response = app
            .send(json_request(
                "PUT",
                &uri,
                Some(&other),
                Some(json!({ "content": "defaced" })),
            ))
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.body["message"], "User is not authorized");

        let response = app
            .send(json_request(
                "PUT",
                &uri,
                Some(&owner),
                Some(json!({ "content": "edited" })),
            ))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["post"]["content"], "edited");

        let response = app
            .send(json_request(
                "PUT",
                &format!("/posts/{}", Uuid::now_v7()),
                Some(&owner),
                Some(json!({ "content": "edited" })),
            ))
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_post_replaces_photo() {
        let app = spawn_app().await;
        let (_, token) = app.signed_in_user("Alice Liddell").await;

        let created = app
            .send(multipart_request(
                "POST",
                "/posts",
                &token,
                &[("content", "v1")],
                Some(FilePart {
                    filename: "one.png",
                    content_type: "image/png",
                    data: PNG_BYTES,
                }),
            ))
            .await;
        let post = &created.body["post"];
        let old_filename = post["photo"]["filename"].as_str().unwrap().to_string();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let updated = app
            .send(multipart_request(
                "PUT",
                &format!("/posts/{}", id_of(post)),
                &token,
                &[("content", "v2")],
                Some(FilePart {
                    filename: "two.jpg",
                    content_type: "image/jpeg",
                    data: b"\xff\xd8\xff",
                }),
            ))
            .await;

        assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
        assert_eq!(updated.body["post"]["content"], "v2");
        assert_eq!(updated.body["post"]["photo"]["contentType"], "image/jpeg");

        let storage = app.state.storage.as_ref().unwrap();
        assert!(!storage.exists(&old_filename).await);

        // Text-only edits keep the photo.
        let kept = app
            .send(json_request(
                "PUT",
                &format!("/posts/{}", id_of(post)),
                Some(&token),
                Some(json!({ "content": "v3" })),
            ))
            .await;
        assert_eq!(kept.body["post"]["photo"]["contentType"], "image/jpeg");
    }

    #[tokio::test]
    async fn test_delete_post_cascades() {
        let app = spawn_app().await;
        let (_, owner) = app.signed_in_user("Alice Liddell").await;
        let (_, other) = app.signed_in_user("Bob Builder").await;

        let created = app
            .send(multipart_request(
                "POST",
                "/posts",
                &owner,
                &[("content", "short lived")],
                Some(FilePart {
                    filename: "gone.png",
                    content_type: "image/png",
                    data: PNG_BYTES,
                }),
            ))
            .await;
        let post = created.body["post"].clone();
        let post_id = id_of(&post);
        let filename = post["photo"]["filename"].as_str().unwrap().to_string();
        comment_on(&app, &other, &post_id, "nice").await;

        let response = app
            .send(json_request(
                "DELETE",
                &format!("/posts/{post_id}"),
                Some(&other),
                None,
            ))
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);

        // A missing post is reported before ownership is checked.
        let response = app
            .send(json_request(
                "DELETE",
                &format!("/posts/{}", Uuid::now_v7()),
                Some(&other),
                None,
            ))
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["message"], "Post not found");

        let response = app
            .send(json_request(
                "DELETE",
                &format!("/posts/{post_id}"),
                Some(&owner),
                None,
            ))
            .await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);

        let response = app
            .send(json_request(
                "GET",
                &format!("/posts/{post_id}"),
                Some(&owner),
                None,
            ))
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);

        let storage = app.state.storage.as_ref().unwrap();
        assert!(!storage.exists(&filename).await);
    }

    #[tokio::test]
    async fn test_like_and_dislike() {
        let app = spawn_app_without_storage().await;
        let (_, owner) = app.signed_in_user("Alice Liddell").await;
        let (bob, bob_token) = app.signed_in_user("Bob Builder").await;
        let post_id = id_of(&app.create_post(&owner, "like me").await);

        for _ in 0..2 {
            let response = app
                .send(json_request(
                    "POST",
                    &format!("/posts/{post_id}/like"),
                    Some(&bob_token),
                    None,
                ))
                .await;
            assert_eq!(response.status, StatusCode::OK);
            assert_eq!(response.body["post"]["likes"], json!([bob]));
        }

        let response = app
            .send(json_request(
                "POST",
                &format!("/posts/{post_id}/dislike"),
                Some(&bob_token),
                None,
            ))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["post"]["likes"], json!([]));

        // Removing a like that is not there is not an error.
        let response = app
            .send(json_request(
                "POST",
                &format!("/posts/{post_id}/dislike"),
                Some(&bob_token),
                None,
            ))
            .await;
        assert_eq!(response.status, StatusCode::OK);

        let response = app
            .send(json_request(
                "POST",
                &format!("/posts/{}/like", Uuid::now_v7()),
                Some(&bob_token),
                None,
            ))
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_comment_embeds_author() {
        let app = spawn_app_without_storage().await;
        let (_, owner) = app.signed_in_user("Alice Liddell").await;
        let (bob, bob_token) = app.signed_in_user("Bob Builder").await;
        let post_id = id_of(&app.create_post(&owner, "discuss").await);

        let post = comment_on(&app, &bob_token, &post_id, "first!").await;

        let comments = post["comments"].as_array().unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0]["content"], "first!");
        assert_eq!(comments[0]["postedBy"]["id"], bob.as_str());
        assert_eq!(comments[0]["postedBy"]["name"], "Bob Builder");

        let response = app
            .send(json_request(
                "POST",
                &format!("/posts/{post_id}/comments"),
                Some(&bob_token),
                Some(json!({ "content": "" })),
            ))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);

        let response = app
            .send(json_request(
                "POST",
                &format!("/posts/{}/comments", Uuid::now_v7()),
                Some(&bob_token),
                Some(json!({ "content": "into the void" })),
            ))
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_comment_removes_only_that_comment() {
        let app = spawn_app_without_storage().await;
        let (_, owner) = app.signed_in_user("Alice Liddell").await;
        let (_, bob_token) = app.signed_in_user("Bob Builder").await;
        let post_id = id_of(&app.create_post(&owner, "discuss").await);

        comment_on(&app, &bob_token, &post_id, "same words").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let post = comment_on(&app, &bob_token, &post_id, "same words").await;
        let first_comment = id_of(&post["comments"][0]);
        let second_comment = id_of(&post["comments"][1]);

        // Only the author of a comment may remove it.
        let response = app
            .send(json_request(
                "DELETE",
                &format!("/posts/{post_id}/comments/{first_comment}"),
                Some(&owner),
                None,
            ))
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);

        let response = app
            .send(json_request(
                "DELETE",
                &format!("/posts/{post_id}/comments/{first_comment}"),
                Some(&bob_token),
                None,
            ))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        let remaining = response.body["post"]["comments"].as_array().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(id_of(&remaining[0]), second_comment);
    }

    #[tokio::test]
    async fn test_delete_comment_not_found() {
        let app = spawn_app_without_storage().await;
        let (_, token) = app.signed_in_user("Alice Liddell").await;
        let first = id_of(&app.create_post(&token, "one").await);
        let second = id_of(&app.create_post(&token, "two").await);
        let post = comment_on(&app, &token, &first, "on the first post").await;
        let comment_id = id_of(&post["comments"][0]);

        // The comment exists but under a different post.
        let response = app
            .send(json_request(
                "DELETE",
                &format!("/posts/{second}/comments/{comment_id}"),
                Some(&token),
                None,
            ))
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["message"], "Comment not found");

        let response = app
            .send(json_request(
                "DELETE",
                &format!("/posts/{}/comments/{comment_id}", Uuid::now_v7()),
                Some(&token),
                None,
            ))
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["message"], "Post not found");
    }
}
