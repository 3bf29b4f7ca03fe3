//! Core domain logic for Agora.
//!
//! This crate contains domain rules with ZERO web or database dependencies.
//!
//! # Modules
//!
//! - `auth` - Password hashing and verification
//! - `access` - Ownership and follow rules
//! - `photo` - Photo attachment naming and references
//! - `storage` - Object storage for photo attachments

pub mod access;
pub mod auth;
pub mod photo;
pub mod storage;
