//! orinmap.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default lifetime of signed URLs handed out by the latest-view endpoint.
pub const DEFAULT_PRESIGN_TTL_SECS: u64 = 600;

/// Default multipart request body limit (64 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("storage.{0} is required for the s3 backend")]
    MissingStorageField(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OrinmapConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Which object store implementation backs map files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    S3,
    /// Process-local store; contents are lost on restart.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    pub bucket: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores (MinIO, R2, ...).
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Base URL used to build links for the memory backend.
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadConfig {
    #[serde(default = "default_presign_ttl_secs")]
    pub presign_ttl_secs: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconcileConfig {
    /// Seconds between orphan sweeps. Zero disables the sweeper.
    #[serde(default = "default_reconcile_interval_secs")]
    pub interval_secs: u64,
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/orinmap")
}

fn default_presign_ttl_secs() -> u64 {
    DEFAULT_PRESIGN_TTL_SECS
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_reconcile_interval_secs() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            presign_ttl_secs: default_presign_ttl_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_reconcile_interval_secs(),
        }
    }
}

impl OrinmapConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: OrinmapConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check cross-field requirements that serde defaults can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::S3 && self.storage.bucket.is_none() {
            return Err(ConfigError::MissingStorageField("bucket"));
        }
        Ok(())
    }

    pub fn presign_ttl(&self) -> Duration {
        Duration::from_secs(self.upload.presign_ttl_secs)
    }

    pub fn db_path(&self) -> PathBuf {
        self.server.data_dir.join("orinmap.redb")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_s3() {
        let config = OrinmapConfig::from_toml_str(
            r#"
[storage]
bucket = "robot-maps"
region = "ap-northeast-2"
"#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.storage.bucket.as_deref(), Some("robot-maps"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.presign_ttl(), Duration::from_secs(600));
        assert_eq!(config.reconcile.interval_secs, 300);
    }

    #[test]
    fn s3_without_bucket_is_rejected() {
        let err = OrinmapConfig::from_toml_str("[storage]\nregion = \"us-east-1\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingStorageField("bucket")));
    }

    #[test]
    fn memory_backend_needs_no_bucket() {
        let config = OrinmapConfig::from_toml_str(
            r#"
[server]
port = 9000
data_dir = "/tmp/orinmap"

[storage]
backend = "memory"

[upload]
presign_ttl_secs = 60
"#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.db_path(), PathBuf::from("/tmp/orinmap/orinmap.redb"));
        assert_eq!(config.upload.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn from_file_roundtrips_rendered_config() {
        let mut config = OrinmapConfig::default();
        config.storage.bucket = Some("maps".to_string());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orinmap.toml");
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        assert_eq!(OrinmapConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = OrinmapConfig::from_file(Path::new("/nonexistent/orinmap.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/orinmap.toml"));
    }
}
