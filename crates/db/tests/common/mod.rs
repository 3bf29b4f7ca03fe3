//! Shared setup for repository integration tests.

#![allow(dead_code)]

use std::time::Duration;

use agora_db::migration::{Migrator, MigratorTrait};
use agora_db::{NewUser, UserRepository, entities::users};
use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Opens a fresh in-memory SQLite database with the schema applied.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Registers a user with a random name and email.
pub async fn create_user(db: &DatabaseConnection) -> users::Model {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    let email = format!("{}-{email}", uuid::Uuid::new_v4().simple());

    UserRepository::new(db.clone())
        .create(NewUser {
            name: &name,
            email: &email.to_lowercase(),
            password_hash: "$argon2id$test_hash",
        })
        .await
        .expect("Failed to create user")
}

/// Keeps consecutive inserts from sharing a timestamp.
pub async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}
