//! Photo storage using Apache OpenDAL.
//!
//! Supported providers:
//! - Google Cloud Storage (objects written publicly readable)
//! - S3-compatible: AWS S3, Cloudflare R2, MinIO
//! - Local filesystem (development and tests)
//!
//! ```text
//! upload(name, bytes) ──► op.write_with(name).content_type(..) ──► PhotoRef { url, filename, content_type }
//! read(name)          ──► op.read(name)
//! delete(name)        ──► op.delete(name)
//! ```

mod config;
mod error;
mod service;

pub use config::StorageConfig;
pub use error::StorageError;
pub use service::{PhotoStorage, PhotoUpload};
