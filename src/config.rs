//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::store::FirestoreConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which record store backs the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Cloud Firestore over REST
    Firestore,
    /// In-process store, discarded on exit
    Memory,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "firestore" => Ok(Backend::Firestore),
            "memory" => Ok(Backend::Memory),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: Backend,

    #[serde(default)]
    pub project_id: String,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_backend() -> Backend {
    Backend::Firestore
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_collection() -> String {
    "dengueData".to_string()
}

fn default_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_request_timeout() -> u64 {
    10_000 // 10 seconds
}

fn default_page_size() -> u32 {
    300
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            project_id: String::new(),
            database: default_database(),
            collection: default_collection(),
            api_key: None,
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout(),
            page_size: default_page_size(),
        }
    }
}

impl StoreConfig {
    /// Settings for the Firestore client
    pub fn firestore(&self) -> FirestoreConfig {
        FirestoreConfig {
            base_url: self.base_url.clone(),
            project_id: self.project_id.clone(),
            database: self.database.clone(),
            collection: self.collection.clone(),
            api_key: self.api_key.clone().filter(|k| !k.is_empty()),
            request_timeout_ms: self.request_timeout_ms,
            page_size: self.page_size,
        }
    }
}

/// CSV import configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    8
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("dengue").join("config.toml")),
            Some(PathBuf::from("/etc/dengue/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Store overrides
        if let Some(backend) = var("DENGUE_BACKEND") {
            match backend.parse() {
                Ok(b) => self.store.backend = b,
                Err(e) => tracing::warn!("Ignoring DENGUE_BACKEND: {}", e),
            }
        }
        if let Some(project_id) = var("DENGUE_PROJECT_ID") {
            self.store.project_id = project_id;
        }
        if let Some(api_key) = var("DENGUE_API_KEY") {
            self.store.api_key = Some(api_key);
        }
        if let Some(collection) = var("DENGUE_COLLECTION") {
            self.store.collection = collection;
        }

        // Import overrides
        if let Some(concurrency) = var("DENGUE_IMPORT_CONCURRENCY") {
            if let Ok(n) = concurrency.parse() {
                self.import.max_concurrency = n;
            }
        }

        // Logging overrides
        if let Some(level) = var("DENGUE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("DENGUE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Dengue Case Tracker Configuration
#
# Environment variables override these settings:
# - DENGUE_BACKEND
# - DENGUE_PROJECT_ID
# - DENGUE_API_KEY
# - DENGUE_COLLECTION
# - DENGUE_IMPORT_CONCURRENCY
# - DENGUE_LOG_LEVEL
# - DENGUE_LOG_FORMAT

[store]
# Record store: "firestore" or "memory"
backend = "firestore"

# Google Cloud project holding the Firestore database
project_id = ""

# Firestore database id
database = "(default)"

# Collection holding the records
collection = "dengueData"

# Web API key (optional)
# api_key = ""

# Firestore REST endpoint
base_url = "https://firestore.googleapis.com/v1"

# Request timeout in milliseconds
request_timeout_ms = 10000

# Documents fetched per list request
page_size = 300

[import]
# Concurrent create requests during CSV import
max_concurrency = 8

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store.backend, Backend::Firestore);
        assert_eq!(config.store.collection, "dengueData");
        assert_eq!(config.import.max_concurrency, 8);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.store.backend, Backend::Firestore);
        assert_eq!(config.store.database, "(default)");
        assert_eq!(config.store.request_timeout_ms, 10_000);
        assert!(config.store.api_key.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse("[store]\nbackend = \"memory\"\n").unwrap();
        assert_eq!(config.store.backend, Backend::Memory);
        assert_eq!(config.store.page_size, 300);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store]\nproject_id = \"itd112\"\napi_key = \"k\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        let firestore = config.store.firestore();
        assert_eq!(firestore.project_id, "itd112");
        assert_eq!(firestore.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Io { .. })));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[store\n").unwrap();
        assert!(matches!(Config::load(&broken), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DENGUE_BACKEND", "memory"),
            ("DENGUE_PROJECT_ID", "override"),
            ("DENGUE_IMPORT_CONCURRENCY", "3"),
            ("DENGUE_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.store.backend, Backend::Memory);
        assert_eq!(config.store.project_id, "override");
        assert_eq!(config.import.max_concurrency, 3);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_invalid_backend_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "DENGUE_BACKEND").then(|| "sqlite".to_string()));
        assert_eq!(config.store.backend, Backend::Firestore);
    }

    #[test]
    fn test_empty_api_key_is_dropped() {
        let mut store = StoreConfig::default();
        store.api_key = Some(String::new());
        assert!(store.firestore().api_key.is_none());
    }
}
