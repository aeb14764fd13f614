//! Configuration management for Citagraph
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Library file configuration
    pub storage: StorageConfig,

    /// Admin authentication configuration
    pub auth: AuthConfig,

    /// Crossref metadata lookups
    pub crossref: CrossrefConfig,

    /// Graph rendering defaults
    pub render: RenderConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum concurrent requests
    pub max_concurrent_requests: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON library file
    pub data_file: PathBuf,

    /// Take an advisory lock on `<data_file>.lock` around reads and writes
    pub file_locking: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Plain admin password, used when no digest is configured
    pub admin_password: Option<String>,

    /// SHA-256 hex digest of the admin password
    pub admin_password_sha256: Option<String>,

    /// Secret for signing admin tokens; a random one is generated when absent
    pub jwt_secret: Option<String>,

    /// Admin token lifetime in seconds
    pub session_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CrossrefConfig {
    /// API base URL
    pub api_base: String,

    /// Contact address sent in the User-Agent (Crossref "polite pool")
    pub mailto: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum attempts per lookup
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// SVG width in pixels
    pub width: u32,

    /// SVG height in pixels
    pub height: u32,

    /// Layout used when a request names none
    pub default_layout: String,

    /// Color mode used when a request names none
    pub default_color_mode: String,

    /// Iterations for force-directed layouts
    pub layout_iterations: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (e.g. "info", "citagraph=debug")
    pub log_level: String,

    /// Enable JSON logging
    pub json_logging: bool,

    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,

    /// Service name attached to startup logs
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Login attempts allowed per minute
    pub login_per_minute: u32,

    /// Burst capacity for login attempts
    pub login_burst: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8501,
            request_timeout_secs: 30,
            max_concurrent_requests: 64,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("citation_data.json"),
            file_locking: true,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_password: None,
            admin_password_sha256: None,
            jwt_secret: None,
            session_ttl_secs: 8 * 3600,
        }
    }
}

impl Default for CrossrefConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.crossref.org".to_string(),
            mailto: None,
            timeout_secs: 15,
            max_retries: 3,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 800,
            default_layout: "spring".to_string(),
            default_color_mode: "first-author".to_string(),
            layout_iterations: 50,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logging: false,
            metrics_enabled: true,
            service_name: "citagraph".to_string(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_per_minute: 10,
            login_burst: 5,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., APP__STORAGE__DATA_FILE=/var/lib/citagraph/library.json
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific configuration file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Socket address string to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Path of the advisory lock file next to the library
    pub fn lock_file(&self) -> PathBuf {
        let mut name = self.storage.data_file.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }
}
