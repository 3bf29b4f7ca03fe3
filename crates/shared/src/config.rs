//! Application configuration management.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Object storage configuration. Photo uploads are disabled without it.
    #[serde(default)]
    pub storage: Option<StorageSettings>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
///
/// Each key is given either inline as PEM text or as a path to a PEM file.
/// Inline values win when both are set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwtConfig {
    /// RSA private key (PEM) used to sign tokens.
    #[serde(default)]
    pub private_key: Option<String>,
    /// Path to the RSA private key file.
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
    /// RSA public key (PEM) used to verify tokens.
    #[serde(default)]
    pub public_key: Option<String>,
    /// Path to the RSA public key file.
    #[serde(default)]
    pub public_key_path: Option<PathBuf>,
    /// Token lifetime in seconds.
    #[serde(default = "default_token_expiry")]
    pub expiry_secs: u64,
}

fn default_token_expiry() -> u64 {
    600 // 10 minutes
}

/// Object storage provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// Google Cloud Storage. Objects are written with the `publicRead` ACL.
    Gcs {
        /// Bucket name.
        bucket: String,
        /// Path to a service account credential file. Falls back to the
        /// ambient credentials when absent.
        #[serde(default)]
        credential_path: Option<String>,
    },
    /// S3-compatible storage: AWS S3, Cloudflare R2, MinIO.
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// Bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Local filesystem (development only).
    LocalFs {
        /// Root directory path.
        root: PathBuf,
        /// Base URL under which the root directory is served.
        public_base_url: String,
    },
}

/// Storage section of the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Provider and its connection details.
    pub provider: StorageProvider,
    /// Upload size limit in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_max_file_size() -> u64 {
    5 * 1024 * 1024
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("AGORA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
