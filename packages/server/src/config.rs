use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origin(s), comma separated.
    pub allow_origin: String,
    pub max_age: u64,
}

impl CorsConfig {
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.allow_origin
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    20
}

/// Blob directory settings.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding uploaded blobs. Created at startup if missing.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Largest accepted upload in bytes. Default: 100 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("uploads")
}
fn default_max_upload_size() -> u64 {
    100 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

/// Ordering applied by `GET /files`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListOrder {
    /// Ascending by filename.
    #[default]
    Filename,
    /// Whatever order the database returns.
    Unordered,
}

/// Knobs for the two-phase file operations.
#[derive(Debug, Deserialize, Clone)]
pub struct ConsistencyConfig {
    /// Upper bound on a single blob store call. Default: 30s.
    #[serde(default = "default_blob_timeout_ms")]
    pub blob_timeout_ms: u64,
    /// Upper bound on a single metadata statement. Default: 10s.
    #[serde(default = "default_metadata_timeout_ms")]
    pub metadata_timeout_ms: u64,
    /// Serialize operations on the same filename. Default: false, so
    /// concurrent rename/delete of one file may interleave.
    #[serde(default)]
    pub serialize_per_filename: bool,
    #[serde(default)]
    pub list_order: ListOrder,
}

fn default_blob_timeout_ms() -> u64 {
    30_000
}
fn default_metadata_timeout_ms() -> u64 {
    10_000
}

impl ConsistencyConfig {
    pub fn blob_timeout(&self) -> Duration {
        Duration::from_millis(self.blob_timeout_ms)
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_millis(self.metadata_timeout_ms)
    }
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            blob_timeout_ms: default_blob_timeout_ms(),
            metadata_timeout_ms: default_metadata_timeout_ms(),
            serialize_per_filename: false,
            list_order: ListOrder::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub consistency: ConsistencyConfig,
}

/// First set variable among `names`.
fn legacy_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3001)?
            .set_default("server.cors.allow_origin", "http://localhost:3000")?
            .set_default("server.cors.max_age", 3600)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., FILEDESK__DATABASE__URL)
            .add_source(Environment::with_prefix("FILEDESK").separator("__"))
            // Flat names used by existing deployments win over everything else.
            .set_override_option("database.url", legacy_env(&["DATABASE_URL", "db_url"]))?
            .set_override_option(
                "server.cors.allow_origin",
                legacy_env(&["FRONTEND_URL", "front_url"]),
            )?
            .set_override_option("server.port", legacy_env(&["PORT"]))?
            .set_override_option("storage.root", legacy_env(&["UPLOADS_DIR"]))?
            .build()?;

        let cfg: Self = s.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Message("database.url must be set".into()));
        }
        if self.consistency.blob_timeout_ms == 0 || self.consistency.metadata_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "consistency timeouts must be greater than zero".into(),
            ));
        }
        for origin in self.server.cors.origins() {
            if origin == "*" {
                return Err(ConfigError::Message(
                    "server.cors.allow_origin cannot be `*`: credentialed CORS needs explicit origins"
                        .into(),
                ));
            }
            if axum::http::HeaderValue::from_str(origin).is_err() {
                return Err(ConfigError::Message(format!(
                    "invalid CORS origin: {origin:?}"
                )));
            }
        }
        Ok(())
    }
}
