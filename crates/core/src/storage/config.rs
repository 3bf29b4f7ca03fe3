//! Storage configuration types.

use agora_shared::config::{StorageProvider, StorageSettings};

use crate::photo::ALLOWED_PHOTO_TYPES;

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Allowed MIME types for upload.
    pub allowed_mime_types: Vec<String>,
}

impl StorageConfig {
    /// Default max file size: 5MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: ALLOWED_PHOTO_TYPES.iter().map(ToString::to_string).collect(),
        }
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Check if a MIME type is allowed.
    #[must_use]
    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.iter().any(|t| t == mime_type)
    }

    /// Public URL under which an object is served.
    #[must_use]
    pub fn public_url(&self, object_name: &str) -> String {
        match &self.provider {
            StorageProvider::Gcs { bucket, .. } => {
                format!("https://storage.googleapis.com/{bucket}/{object_name}")
            }
            StorageProvider::S3 {
                endpoint, bucket, ..
            } => format!("{}/{bucket}/{object_name}", endpoint.trim_end_matches('/')),
            StorageProvider::LocalFs {
                public_base_url, ..
            } => format!("{}/{object_name}", public_base_url.trim_end_matches('/')),
        }
    }

    /// Get the provider name for logging.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            StorageProvider::Gcs { .. } => "gcs",
            StorageProvider::S3 { .. } => "s3",
            StorageProvider::LocalFs { .. } => "local",
        }
    }
}

impl From<StorageSettings> for StorageConfig {
    fn from(settings: StorageSettings) -> Self {
        Self::new(settings.provider).with_max_file_size(settings.max_file_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_gcs() {
        let config = StorageConfig::new(StorageProvider::Gcs {
            bucket: "agora-photos".to_string(),
            credential_path: None,
        });
        assert_eq!(
            config.public_url("1700000000000cat.png"),
            "https://storage.googleapis.com/agora-photos/1700000000000cat.png"
        );
        assert_eq!(config.provider_name(), "gcs");
    }

    #[test]
    fn test_public_url_s3() {
        let config = StorageConfig::new(StorageProvider::S3 {
            endpoint: "https://s3.example.com/".to_string(),
            bucket: "photos".to_string(),
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            region: "auto".to_string(),
        });
        assert_eq!(
            config.public_url("a.png"),
            "https://s3.example.com/photos/a.png"
        );
    }

    #[test]
    fn test_public_url_local() {
        let config = StorageConfig::new(StorageProvider::LocalFs {
            root: "./uploads".into(),
            public_base_url: "http://localhost:8080/uploads/".to_string(),
        });
        assert_eq!(
            config.public_url("a.png"),
            "http://localhost:8080/uploads/a.png"
        );
        assert_eq!(config.provider_name(), "local");
    }

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::new(StorageProvider::LocalFs {
            root: "./uploads".into(),
            public_base_url: "/uploads".to_string(),
        });
        assert_eq!(config.max_file_size, StorageConfig::DEFAULT_MAX_FILE_SIZE);
        assert!(config.is_mime_type_allowed("image/png"));
        assert!(!config.is_mime_type_allowed("application/pdf"));
    }

    #[test]
    fn test_from_settings() {
        let config = StorageConfig::from(StorageSettings {
            provider: StorageProvider::Gcs {
                bucket: "b".to_string(),
                credential_path: None,
            },
            max_file_size: 1024,
        });
        assert_eq!(config.max_file_size, 1024);
    }
}
