//! Photo storage service implementation using Apache OpenDAL.

use bytes::Bytes;
use chrono::Utc;
use opendal::{Operator, services};
use tracing::{debug, warn};

use agora_shared::config::StorageProvider;

use super::config::StorageConfig;
use super::error::StorageError;
use crate::photo::{PhotoRef, object_name};

/// A file received from a client, not yet stored.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// Filename supplied by the client.
    pub filename: String,
    /// MIME type supplied by the client.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

impl PhotoUpload {
    /// Size of the upload in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Storage service for user and post photos.
#[derive(Debug)]
pub struct PhotoStorage {
    operator: Operator,
    config: StorageConfig,
}

impl PhotoStorage {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::Gcs {
                bucket,
                credential_path,
            } => {
                let mut builder = services::Gcs::default()
                    .bucket(bucket)
                    .predefined_acl("publicRead");
                if let Some(path) = credential_path {
                    builder = builder.credential_path(path);
                }
                Operator::new(builder).map(|b| b.finish())
            }
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                Operator::new(builder).map(|b| b.finish())
            }
            StorageProvider::LocalFs { root, .. } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?;
                Operator::new(services::Fs::default().root(root)).map(|b| b.finish())
            }
        };

        operator.map_err(|e| StorageError::configuration(e.to_string()))
    }

    /// Validate an upload against config constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if file size or MIME type is invalid.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }

        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }

        Ok(())
    }

    /// Store a photo under a fresh time-prefixed object name.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload is rejected or the write fails.
    pub async fn upload(&self, upload: PhotoUpload) -> Result<PhotoRef, StorageError> {
        self.validate_upload(&upload.content_type, upload.size())?;

        let key = object_name(Utc::now(), &upload.filename);
        let mut write = self.operator.write_with(&key, upload.data);
        // The fs service rejects writes that carry a content type.
        if self
            .operator
            .info()
            .full_capability()
            .write_with_content_type
        {
            write = write.content_type(&upload.content_type);
        }
        write.await?;

        debug!(key = %key, provider = self.config.provider_name(), "Stored photo");

        Ok(PhotoRef {
            url: self.config.public_url(&key),
            filename: key,
            content_type: upload.content_type,
        })
    }

    /// Read a stored object.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the object does not exist.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let buffer = self.operator.read(key).await?;
        Ok(buffer.to_vec())
    }

    /// Delete a stored object.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Delete an object, logging instead of failing.
    pub async fn delete_quietly(&self, key: &str) {
        if let Err(e) = self.delete(key).await {
            warn!(key = %key, error = %e, "Failed to delete stored photo");
        }
    }

    /// Check if an object exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        self.operator.exists(key).await.unwrap_or(false)
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider_name()
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &StorageConfig {
        &self.config
    }
}
