use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
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
    pub max_connections: u32,
    /// Upper bound for the health-check ping.
    pub health_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    S3,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemStorageConfig {
    pub base_path: String,
    pub public_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct S3StorageConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub public_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Per-user ceiling on deduplicated bytes.
    pub quota_bytes: u64,
    /// Maximum accepted request body for uploads.
    pub max_upload_bytes: usize,
    pub backend: StorageBackend,
    /// Upper bound for a single remote upload or destroy call.
    pub remote_timeout_ms: u64,
    pub filesystem: FilesystemStorageConfig,
    pub s3: Option<S3StorageConfig>,
}

impl StorageConfig {
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub requests_per_second: f64,
    pub burst: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuditConfig {
    pub queue_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub rate_limit: RateLimitConfig,
    pub audit: AuditConfig,
}

pub const DEFAULT_QUOTA_BYTES: u64 = 10 * 1024 * 1024;

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.max_connections", 20)?
            .set_default("database.health_timeout_ms", 2000)?
            .set_default("auth.token_ttl_hours", 24)?
            .set_default("storage.quota_bytes", DEFAULT_QUOTA_BYTES)?
            .set_default("storage.max_upload_bytes", 50 * 1024 * 1024)?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.remote_timeout_ms", 30_000)?
            .set_default("storage.filesystem.base_path", "./data/objects")?
            .set_default(
                "storage.filesystem.public_base_url",
                "http://127.0.0.1:8080/objects",
            )?
            .set_default("rate_limit.requests_per_second", 2.0)?
            .set_default("rate_limit.burst", 4)?
            .set_default("audit.queue_capacity", 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., KEYVIA__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("KEYVIA")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
