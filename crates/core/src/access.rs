//! Ownership and follow rules.
//!
//! Authorization in Agora is a plain identity comparison: the caller may
//! change a resource only when they own it, and may change a profile only
//! when it is their own.

use agora_shared::types::UserId;
use thiserror::Error;

/// Errors raised by access rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The caller does not own the resource.
    #[error("resource belongs to another user")]
    NotOwner,

    /// The caller tried to act on another user's profile.
    #[error("profile belongs to another user")]
    NotSelf,

    /// A user cannot follow or unfollow themselves.
    #[error("users cannot follow themselves")]
    SelfFollow,
}

/// Checks that `caller` owns a resource owned by `owner`.
///
/// # Errors
///
/// Returns `AccessError::NotOwner` on mismatch.
pub fn ensure_owner(owner: UserId, caller: UserId) -> Result<(), AccessError> {
    if owner == caller {
        Ok(())
    } else {
        Err(AccessError::NotOwner)
    }
}

/// Checks that `caller` is the user addressed by `target`.
///
/// # Errors
///
/// Returns `AccessError::NotSelf` on mismatch.
pub fn ensure_self(target: UserId, caller: UserId) -> Result<(), AccessError> {
    if target == caller {
        Ok(())
    } else {
        Err(AccessError::NotSelf)
    }
}

/// Checks that `actor` may follow or unfollow `target`.
///
/// # Errors
///
/// Returns `AccessError::SelfFollow` when both are the same user.
pub fn ensure_can_follow(actor: UserId, target: UserId) -> Result<(), AccessError> {
    if actor == target {
        Err(AccessError::SelfFollow)
    } else {
        Ok(())
    }
}
