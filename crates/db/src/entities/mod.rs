//! `SeaORM` entity definitions.

pub mod prelude;

pub mod comments;
pub mod follows;
pub mod post_likes;
pub mod posts;
pub mod users;
