//! Follow graph repository.
//!
//! Each edge is a single row, so following and unfollowing are one
//! statement each and the two directions can never disagree.

use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::entities::follows;

/// Followers and followees of one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowLists {
    /// Users this user follows.
    pub following: Vec<Uuid>,
    /// Users following this user.
    pub followers: Vec<Uuid>,
}

/// Repository for the follow graph.
#[derive(Debug, Clone)]
pub struct FollowRepository {
    db: DatabaseConnection,
}

impl FollowRepository {
    /// Creates a new follow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records that `follower_id` follows `followee_id`.
    ///
    /// Returns false if the edge already existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool, DbErr> {
        let edge = follows::ActiveModel {
            follower_id: Set(follower_id),
            followee_id: Set(followee_id),
            created_at: Set(chrono::Utc::now().into()),
        };

        let inserted = follows::Entity::insert(edge)
            .on_conflict(
                OnConflict::columns([follows::Column::FollowerId, follows::Column::FolloweeId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(inserted > 0)
    }

    /// Removes the edge if present.
    ///
    /// Returns false if there was nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool, DbErr> {
        let result = follows::Entity::delete_many()
            .filter(follows::Column::FollowerId.eq(follower_id))
            .filter(follows::Column::FolloweeId.eq(followee_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Loads the follow lists of a single user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn lists_for(&self, user_id: Uuid) -> Result<FollowLists, DbErr> {
        let edges = self.edges_touching(&[user_id]).await?;
        Ok(FollowLists::from_edges(user_id, &edges))
    }

    /// Loads every edge in which any of `user_ids` takes part, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn edges_touching(&self, user_ids: &[Uuid]) -> Result<Vec<follows::Model>, DbErr> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        follows::Entity::find()
            .filter(
                Condition::any()
                    .add(follows::Column::FollowerId.is_in(user_ids.iter().copied()))
                    .add(follows::Column::FolloweeId.is_in(user_ids.iter().copied())),
            )
            .order_by_asc(follows::Column::CreatedAt)
            .all(&self.db)
            .await
    }
}

impl FollowLists {
    /// Picks the edges relevant to `user_id` out of a larger batch.
    #[must_use]
    pub fn from_edges(user_id: Uuid, edges: &[follows::Model]) -> Self {
        let mut lists = Self::default();
        for edge in edges {
            if edge.follower_id == user_id {
                lists.following.push(edge.followee_id);
            }
            if edge.followee_id == user_id {
                lists.followers.push(edge.follower_id);
            }
        }
        lists
    }
}
