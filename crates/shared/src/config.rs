//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Entity store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Document blob storage configuration.
    #[serde(default)]
    pub storage: DocumentStorageConfig,
    /// Document extraction service configuration.
    #[serde(default)]
    pub extraction: ExtractionConfig,
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

/// Entity store configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON snapshot. `None` keeps everything in memory.
    pub snapshot_path: Option<String>,
}

/// Document blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentStorageConfig {
    /// Root directory for locally stored documents.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Maximum upload size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for DocumentStorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_storage_root() -> String {
    "./data/documents".to_string()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10 MB
}

/// Document extraction service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Extraction endpoint URL. Extraction is disabled when absent.
    pub endpoint: Option<String>,
    /// API key sent as a bearer token.
    pub api_key: Option<String>,
    /// Per-attempt timeout in seconds.
    #[serde(default = "default_extraction_timeout")]
    pub timeout_secs: u64,
    /// Retries after the first failed attempt (transient failures only).
    #[serde(default = "default_extraction_retries")]
    pub max_retries: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: default_extraction_timeout(),
            max_retries: default_extraction_retries(),
        }
    }
}

fn default_extraction_timeout() -> u64 {
    60
}

fn default_extraction_retries() -> u32 {
    1
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
            .add_source(config::Environment::with_prefix("GRANTWISE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        temp_env::with_vars_unset(
            [
                "GRANTWISE__SERVER__PORT",
                "GRANTWISE__EXTRACTION__ENDPOINT",
                "GRANTWISE__STORE__SNAPSHOT_PATH",
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.server.host, "0.0.0.0");
                assert!(config.store.snapshot_path.is_none());
                assert!(config.extraction.endpoint.is_none());
                assert_eq!(config.extraction.timeout_secs, 60);
                assert_eq!(config.extraction.max_retries, 1);
                assert_eq!(config.storage.max_file_size, 10 * 1024 * 1024);
            },
        );
    }

    #[test]
    fn test_environment_overrides() {
        temp_env::with_vars(
            [
                ("GRANTWISE__SERVER__PORT", Some("9090")),
                ("GRANTWISE__EXTRACTION__ENDPOINT", Some("http://localhost:7000")),
                ("GRANTWISE__STORE__SNAPSHOT_PATH", Some("/tmp/grantwise.json")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.server.port, 9090);
                assert_eq!(
                    config.extraction.endpoint.as_deref(),
                    Some("http://localhost:7000")
                );
                assert_eq!(
                    config.store.snapshot_path.as_deref(),
                    Some("/tmp/grantwise.json")
                );
            },
        );
    }
}
