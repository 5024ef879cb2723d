//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub carrier: CarrierConfig,
    pub reaper: ReaperConfig,
    pub storage: StorageConfig,
    pub admin: AdminConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

/// Redis configuration (job-queue worker registry)
#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,
}

/// Carrier API configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CarrierConfig {
    /// Carrier REST API base URL
    #[serde(default = "default_carrier_base_url")]
    pub base_url: String,

    /// Carrier account identifier
    pub account_sid: String,

    /// Carrier auth token
    pub auth_token: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_carrier_timeout")]
    pub timeout_secs: u64,
}

fn default_carrier_base_url() -> String {
    "https://api.carrier.example.com/2010-04-01".to_string()
}

fn default_carrier_timeout() -> u64 {
    15
}

/// Stale worker reaper configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReaperConfig {
    /// Age in seconds after which a claimed job marks its worker stale
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: i64,

    /// Interval between reap passes in seconds
    #[serde(default = "default_reap_interval")]
    pub interval_secs: u64,
}

fn default_stale_after() -> i64 {
    600
}

fn default_reap_interval() -> u64 {
    60
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after(),
            interval_secs: default_reap_interval(),
        }
    }
}

/// Attachment storage configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for stored attachments
    #[serde(default = "default_storage_root")]
    pub root: String,
}

fn default_storage_root() -> String {
    "storage".to_string()
}

/// Admin dashboard credentials (HTTP basic auth)
#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    /// Basic auth username
    pub username: String,

    /// Basic auth password
    pub password: String,
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("carrier.timeout_secs", 15)?
            .set_default("reaper.stale_after_secs", 600)?
            .set_default("reaper.interval_secs", 60)?
            .set_default("storage.root", "storage")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with CHIBI_ prefix
            .add_source(
                Environment::with_prefix("CHIBI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("CHIBI").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reaper_config() {
        let config = ReaperConfig::default();
        assert_eq!(config.stale_after_secs, 600);
        assert_eq!(config.interval_secs, 60);
    }
}
