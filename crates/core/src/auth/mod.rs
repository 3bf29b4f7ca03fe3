//! Authentication and password hashing.
//!
//! Passwords are hashed with Argon2id. The salt is generated per hash and
//! embedded in the PHC string, so nothing besides the hash is stored.

mod password;

pub use password::{PasswordError, hash_password, verify_password, verify_password_or_dummy};
