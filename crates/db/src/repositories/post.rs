//! Post repository: posts and their likes.

use agora_core::photo::PhotoRef;
use agora_shared::types::PageRequest;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait, Select, Set, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::entities::{follows, post_likes, posts};

/// Post repository for CRUD operations and likes.
#[derive(Debug, Clone)]
pub struct PostRepository {
    db: DatabaseConnection,
}

impl PostRepository {
    /// Creates a new post repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a post.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        posted_by: Uuid,
        content: &str,
        photo: Option<PhotoRef>,
    ) -> Result<posts::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let (photo_url, photo_filename, photo_content_type) = photo_columns(photo);
        let post = posts::ActiveModel {
            id: Set(Uuid::now_v7()),
            content: Set(content.to_string()),
            photo_url: Set(photo_url),
            photo_filename: Set(photo_filename),
            photo_content_type: Set(photo_content_type),
            posted_by: Set(posted_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        post.insert(&self.db).await
    }

    /// Finds a post by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<posts::Model>, DbErr> {
        posts::Entity::find_by_id(id).one(&self.db).await
    }

    /// Lists all posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, page: &PageRequest) -> Result<Vec<posts::Model>, DbErr> {
        newest_first(posts::Entity::find(), page).all(&self.db).await
    }

    /// Lists posts written by one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_author(
        &self,
        author_id: Uuid,
        page: &PageRequest,
    ) -> Result<Vec<posts::Model>, DbErr> {
        let query = posts::Entity::find().filter(posts::Column::PostedBy.eq(author_id));
        newest_first(query, page).all(&self.db).await
    }

    /// Lists posts written by the users `user_id` follows, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn feed(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> Result<Vec<posts::Model>, DbErr> {
        let followed = follows::Entity::find()
            .select_only()
            .column(follows::Column::FolloweeId)
            .filter(follows::Column::FollowerId.eq(user_id))
            .into_query();

        let query = posts::Entity::find().filter(posts::Column::PostedBy.in_subquery(followed));
        newest_first(query, page).all(&self.db).await
    }

    /// Filenames of every photo attached to posts by `author_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn photo_filenames_by_author(&self, author_id: Uuid) -> Result<Vec<String>, DbErr> {
        let filenames: Vec<Option<String>> = posts::Entity::find()
            .select_only()
            .column(posts::Column::PhotoFilename)
            .filter(posts::Column::PostedBy.eq(author_id))
            .filter(posts::Column::PhotoFilename.is_not_null())
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(filenames.into_iter().flatten().collect())
    }

    /// Replaces the content and, when given, the photo of a post.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update(
        &self,
        post: posts::Model,
        content: &str,
        photo: Option<PhotoRef>,
    ) -> Result<posts::Model, DbErr> {
        let mut active = post.into_active_model();
        active.content = Set(content.to_string());
        if let Some(photo) = photo {
            active.photo_url = Set(Some(photo.url));
            active.photo_filename = Set(Some(photo.filename));
            active.photo_content_type = Set(Some(photo.content_type));
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(&self.db).await
    }

    /// Deletes a post together with its comments and likes.
    ///
    /// Returns true if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = posts::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    /// Adds `user_id` to the likes of a post.
    ///
    /// Returns false if the user had already liked it.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, DbErr> {
        let like = post_likes::ActiveModel {
            post_id: Set(post_id),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now().into()),
        };

        let inserted = post_likes::Entity::insert(like)
            .on_conflict(
                OnConflict::columns([post_likes::Column::PostId, post_likes::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(inserted > 0)
    }

    /// Removes `user_id` from the likes of a post.
    ///
    /// Returns false if the user had not liked it.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn dislike(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, DbErr> {
        let result = post_likes::Entity::delete_many()
            .filter(post_likes::Column::PostId.eq(post_id))
            .filter(post_likes::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Loads the likes of several posts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn likes_for(&self, post_ids: &[Uuid]) -> Result<Vec<post_likes::Model>, DbErr> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        post_likes::Entity::find()
            .filter(post_likes::Column::PostId.is_in(post_ids.iter().copied()))
            .order_by_asc(post_likes::Column::CreatedAt)
            .all(&self.db)
            .await
    }
}

fn newest_first(query: Select<posts::Entity>, page: &PageRequest) -> Select<posts::Entity> {
    query
        .order_by_desc(posts::Column::CreatedAt)
        .order_by_desc(posts::Column::Id)
        .offset(page.offset())
        .limit(page.limit())
}

fn photo_columns(photo: Option<PhotoRef>) -> (Option<String>, Option<String>, Option<String>) {
    match photo {
        Some(photo) => (
            Some(photo.url),
            Some(photo.filename),
            Some(photo.content_type),
        ),
        None => (None, None, None),
    }
}
