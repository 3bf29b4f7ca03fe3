//! Comment repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::comments;

/// Comment repository.
#[derive(Debug, Clone)]
pub struct CommentRepository {
    db: DatabaseConnection,
}

impl CommentRepository {
    /// Creates a new comment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Adds a comment to a post.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        post_id: Uuid,
        posted_by: Uuid,
        content: &str,
    ) -> Result<comments::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let comment = comments::ActiveModel {
            id: Set(Uuid::now_v7()),
            post_id: Set(post_id),
            content: Set(content.to_string()),
            posted_by: Set(posted_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        comment.insert(&self.db).await
    }

    /// Finds a comment by ID, only if it belongs to `post_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_in_post(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<comments::Model>, DbErr> {
        comments::Entity::find_by_id(comment_id)
            .filter(comments::Column::PostId.eq(post_id))
            .one(&self.db)
            .await
    }

    /// Deletes exactly one comment.
    ///
    /// Returns true if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = comments::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    /// Loads the comments of several posts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_posts(&self, post_ids: &[Uuid]) -> Result<Vec<comments::Model>, DbErr> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        comments::Entity::find()
            .filter(comments::Column::PostId.is_in(post_ids.iter().copied()))
            .order_by_asc(comments::Column::CreatedAt)
            .order_by_asc(comments::Column::Id)
            .all(&self.db)
            .await
    }
}
