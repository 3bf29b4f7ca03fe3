//! Response representations of users and posts.
//!
//! Models are loaded in batches: one query for the follow edges of a page
//! of users, and one query each for the likes, comments and authors of a
//! page of posts.

use std::collections::HashMap;

use agora_core::photo::PhotoRef;
use agora_db::entities::{comments, posts, users};
use agora_db::{CommentRepository, FollowLists, FollowRepository, PostRepository, UserRepository};
use chrono::{DateTime, FixedOffset};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;
use uuid::Uuid;

/// A user as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    /// User id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Login email, lower-cased.
    pub email: String,
    /// Free-form profile text.
    pub about: Option<String>,
    /// Profile photo, if one was uploaded.
    pub photo: Option<PhotoRef>,
    /// Ids of the users this user follows.
    pub following: Vec<Uuid>,
    /// Ids of the users following this user.
    pub followers: Vec<Uuid>,
    /// Registration time.
    pub created_at: DateTime<FixedOffset>,
    /// Last profile change.
    pub updated_at: DateTime<FixedOffset>,
}

impl UserView {
    /// Combines a user row with its follow lists.
    #[must_use]
    pub fn new(user: users::Model, lists: FollowLists) -> Self {
        let photo = user.photo();
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            about: user.about,
            photo,
            following: lists.following,
            followers: lists.followers,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// The author block embedded in posts and comments.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorView {
    /// User id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Profile photo, if any.
    pub photo: Option<PhotoRef>,
}

impl From<&users::Model> for AuthorView {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            photo: user.photo(),
        }
    }
}

/// A comment as embedded in a post.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    /// Comment id.
    pub id: Uuid,
    /// Comment text.
    pub content: String,
    /// Who wrote the comment.
    pub posted_by: AuthorView,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last change.
    pub updated_at: DateTime<FixedOffset>,
}

/// A post as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    /// Post id.
    pub id: Uuid,
    /// Post text.
    pub content: String,
    /// Attached photo, if any.
    pub photo: Option<PhotoRef>,
    /// Who wrote the post.
    pub posted_by: AuthorView,
    /// Ids of the users who liked the post.
    pub likes: Vec<Uuid>,
    /// Comments, oldest first.
    pub comments: Vec<CommentView>,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last edit.
    pub updated_at: DateTime<FixedOffset>,
}

/// Builds the view of a single user.
///
/// # Errors
///
/// Returns an error if loading the follow lists fails.
pub async fn user_view(db: &DatabaseConnection, user: users::Model) -> Result<UserView, DbErr> {
    let lists = FollowRepository::new(db.clone()).lists_for(user.id).await?;
    Ok(UserView::new(user, lists))
}

/// Builds views for a page of users, preserving order.
///
/// # Errors
///
/// Returns an error if loading the follow edges fails.
pub async fn user_views(
    db: &DatabaseConnection,
    users: Vec<users::Model>,
) -> Result<Vec<UserView>, DbErr> {
    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let edges = FollowRepository::new(db.clone())
        .edges_touching(&ids)
        .await?;

    Ok(users
        .into_iter()
        .map(|user| {
            let lists = FollowLists::from_edges(user.id, &edges);
            UserView::new(user, lists)
        })
        .collect())
}

/// Builds the view of a single post.
///
/// Returns `None` if the author no longer exists.
///
/// # Errors
///
/// Returns an error if loading related rows fails.
pub async fn post_view(
    db: &DatabaseConnection,
    post: posts::Model,
) -> Result<Option<PostView>, DbErr> {
    Ok(post_views(db, vec![post]).await?.pop())
}

/// Builds views for a page of posts, preserving order.
///
/// # Errors
///
/// Returns an error if loading related rows fails.
pub async fn post_views(
    db: &DatabaseConnection,
    posts: Vec<posts::Model>,
) -> Result<Vec<PostView>, DbErr> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
    let likes = PostRepository::new(db.clone()).likes_for(&post_ids).await?;
    let comments = CommentRepository::new(db.clone())
        .list_for_posts(&post_ids)
        .await?;

    let mut author_ids: Vec<Uuid> = posts
        .iter()
        .map(|p| p.posted_by)
        .chain(comments.iter().map(|c| c.posted_by))
        .collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<Uuid, AuthorView> = UserRepository::new(db.clone())
        .find_by_ids(&author_ids)
        .await?
        .iter()
        .map(|u| (u.id, AuthorView::from(u)))
        .collect();

    let mut likes_by_post: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for like in likes {
        likes_by_post.entry(like.post_id).or_default().push(like.user_id);
    }

    let mut comments_by_post: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
    for comment in comments {
        let post_id = comment.post_id;
        if let Some(view) = comment_view(comment, &authors) {
            comments_by_post.entry(post_id).or_default().push(view);
        }
    }

    Ok(posts
        .into_iter()
        .filter_map(|post| {
            let posted_by = authors.get(&post.posted_by)?.clone();
            let photo = post.photo();
            Some(PostView {
                likes: likes_by_post.remove(&post.id).unwrap_or_default(),
                comments: comments_by_post.remove(&post.id).unwrap_or_default(),
                id: post.id,
                content: post.content,
                photo,
                posted_by,
                created_at: post.created_at,
                updated_at: post.updated_at,
            })
        })
        .collect())
}

fn comment_view(
    comment: comments::Model,
    authors: &HashMap<Uuid, AuthorView>,
) -> Option<CommentView> {
    let posted_by = authors.get(&comment.posted_by)?.clone();
    Some(CommentView {
        id: comment.id,
        content: comment.content,
        posted_by,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    })
}
