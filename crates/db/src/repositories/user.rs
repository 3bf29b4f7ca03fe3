//! User repository for database operations.

use agora_core::photo::PhotoRef;
use agora_shared::types::PageRequest;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set,
};
use uuid::Uuid;

use crate::entities::{follows, users};

/// Input for registering a user.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    /// Display name.
    pub name: &'a str,
    /// Normalized email address.
    pub email: &'a str,
    /// Argon2id PHC string.
    pub password_hash: &'a str,
}

/// Profile fields to change. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    /// New display name.
    pub name: Option<String>,
    /// New about text.
    pub about: Option<String>,
    /// Replacement photo.
    pub photo: Option<PhotoRef>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Loads several users at once, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<users::Model>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        users::Entity::find()
            .filter(users::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including a unique violation
    /// on the email column.
    pub async fn create(&self, input: NewUser<'_>) -> Result<users::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(input.name.to_string()),
            email: Set(input.email.to_string()),
            password_hash: Set(input.password_hash.to_string()),
            about: Set(None),
            photo_url: Set(None),
            photo_filename: Set(None),
            photo_content_type: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await
    }

    /// Lists users oldest-first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, page: &PageRequest) -> Result<Vec<users::Model>, DbErr> {
        users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .order_by_asc(users::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
    }

    /// Applies profile changes and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update(
        &self,
        user: users::Model,
        changes: UserChanges,
    ) -> Result<users::Model, DbErr> {
        let mut active = user.into_active_model();

        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(about) = changes.about {
            active.about = Set(Some(about));
        }
        if let Some(photo) = changes.photo {
            active.photo_url = Set(Some(photo.url));
            active.photo_filename = Set(Some(photo.filename));
            active.photo_content_type = Set(Some(photo.content_type));
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(&self.db).await
    }

    /// Deletes a user. Posts, comments, likes and follow edges go with it.
    ///
    /// Returns true if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = users::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    /// Suggests users to follow: everyone except `user_id` and the users
    /// `user_id` already follows, oldest accounts first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_people(
        &self,
        user_id: Uuid,
        limit: u64,
    ) -> Result<Vec<users::Model>, DbErr> {
        let followed = follows::Entity::find()
            .select_only()
            .column(follows::Column::FolloweeId)
            .filter(follows::Column::FollowerId.eq(user_id))
            .into_query();

        users::Entity::find()
            .filter(users::Column::Id.ne(user_id))
            .filter(users::Column::Id.not_in_subquery(followed))
            .order_by_asc(users::Column::CreatedAt)
            .order_by_asc(users::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
    }
}
