//! Authentication types and request payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Email of the user at sign-in time.
    pub email: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, email: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Sign-in request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignInRequest {
    /// User email.
    #[serde(deserialize_with = "trimmed_lowercase")]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// User password.
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Registration request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// User email.
    #[serde(deserialize_with = "trimmed_lowercase")]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Display name.
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 6, message = "Name must be at least 6 characters"))]
    pub name: String,
    /// User password.
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Profile update payload. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// New display name.
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 6, message = "Name must be at least 6 characters"))]
    pub name: Option<String>,
    /// New "about" text. An empty string clears it.
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 1000, message = "About must be at most 1000 characters"))]
    pub about: Option<String>,
}

/// Post create/update payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostContentRequest {
    /// Post text.
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

/// Comment payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentRequest {
    /// Comment text.
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|s| s.trim().to_string())
}

fn trimmed_lowercase<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|s| s.trim().to_lowercase())
}

fn trimmed_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|s| s.map(|s| s.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sign_in_normalizes_email() {
        let req: SignInRequest = serde_json::from_value(json!({
            "email": "  Alice@Example.COM ",
            "password": "secret1"
        }))
        .unwrap();

        assert_eq!(req.email, "alice@example.com");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_sign_in_rejects_short_password() {
        let req: SignInRequest = serde_json::from_value(json!({
            "email": "alice@example.com",
            "password": "123"
        }))
        .unwrap();

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_user_validation() {
        let valid: CreateUserRequest = serde_json::from_value(json!({
            "email": "bob@example.com",
            "name": "  Bob Builder  ",
            "password": "hunter22"
        }))
        .unwrap();
        assert_eq!(valid.name, "Bob Builder");
        assert!(valid.validate().is_ok());

        let bad_email: CreateUserRequest = serde_json::from_value(json!({
            "email": "not-an-email",
            "name": "Bob Builder",
            "password": "hunter22"
        }))
        .unwrap();
        assert!(bad_email.validate().is_err());

        // Trimming happens before the length check.
        let short_name: CreateUserRequest = serde_json::from_value(json!({
            "email": "bob@example.com",
            "name": "  Bob   ",
            "password": "hunter22"
        }))
        .unwrap();
        assert!(short_name.validate().is_err());
    }

    #[test]
    fn test_update_user_fields_are_optional() {
        let empty: UpdateUserRequest = serde_json::from_value(json!({})).unwrap();
        assert!(empty.name.is_none());
        assert!(empty.about.is_none());
        assert!(empty.validate().is_ok());

        let short: UpdateUserRequest = serde_json::from_value(json!({ "name": "Al" })).unwrap();
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_post_content_required() {
        let empty: PostContentRequest = serde_json::from_value(json!({ "content": "" })).unwrap();
        assert!(empty.validate().is_err());

        assert!(serde_json::from_value::<PostContentRequest>(json!({})).is_err());
    }
}
