//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod comment;
pub mod follow;
pub mod post;
pub mod user;

pub use comment::CommentRepository;
pub use follow::{FollowLists, FollowRepository};
pub use post::PostRepository;
pub use user::{NewUser, UserChanges, UserRepository};
