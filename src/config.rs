//! Application Configuration
//!
//! This module provides configuration management for the application,
//! supporting a YAML configuration file with sensible defaults plus
//! environment overrides for the folder id and credentials.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use log::{info, warn};

/// Remote file-store backend types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum StoreBackend {
    Drive,
    Mock,
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::Drive
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drive" | "gdrive" | "google" => Ok(StoreBackend::Drive),
            "mock" => Ok(StoreBackend::Mock),
            _ => Err(format!("Unknown store backend: {}", s)),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Bearer-token auth configuration
    pub auth: AuthConfig,
    /// Remote folder configuration
    pub drive: DriveConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Number of worker threads
    pub workers: usize,
    /// Maximum payload size in bytes
    pub max_payload_size: u64,
}

/// Bearer-token auth configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Static API key clients must present as `Bearer <key>`
    pub api_key: String,
}

/// Remote folder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// File-store backend type
    pub backend: StoreBackend,
    /// Id of the folder holding the log files and the index document
    pub folder_id: String,
    /// OAuth2 client id
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: String,
    /// OAuth2 refresh token
    pub refresh_token: String,
    /// OAuth2 token endpoint
    pub token_uri: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Path to log configuration file
    pub config_file: String,
}

impl AppConfig {
    /// Load configuration from `config.yaml`, apply environment overrides
    /// and validate the result
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from("config.yaml")
    }

    /// Load configuration from a specific file, use defaults if not found
    pub fn load_from(config_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = if Path::new(config_path).exists() {
            let content = fs::read_to_string(config_path)?;
            let config: AppConfig = serde_yaml::from_str(&content)?;
            info!("Loaded configuration from {}", config_path);
            config
        } else {
            warn!("Config file not found, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides for the backend selection and the
    /// secrets that never belong in the config file
    fn apply_env_overrides(&mut self) {
        if let Ok(backend_str) = env::var("STORE_BACKEND") {
            match backend_str.parse::<StoreBackend>() {
                Ok(backend) => {
                    info!("Using store backend from environment: {:?}", backend);
                    self.drive.backend = backend;
                }
                Err(e) => {
                    warn!("Invalid store backend in environment: {}. Keeping {:?}.", e, self.drive.backend);
                }
            }
        }
        if let Ok(value) = env::var("API_KEY") {
            self.auth.api_key = value;
        }
        if let Ok(value) = env::var("DRIVE_FOLDER_ID") {
            self.drive.folder_id = value;
        }
        if let Ok(value) = env::var("GDRIVE_CLIENT_ID") {
            self.drive.client_id = value;
        }
        if let Ok(value) = env::var("GDRIVE_CLIENT_SECRET") {
            self.drive.client_secret = value;
        }
        if let Ok(value) = env::var("GDRIVE_REFRESH_TOKEN") {
            self.drive.refresh_token = value;
        }
    }

    /// Reject configurations that cannot authenticate clients or reach the
    /// remote folder
    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.auth.api_key.is_empty() {
            return Err("API_KEY not set".into());
        }
        if self.drive.backend == StoreBackend::Drive {
            if self.drive.folder_id.is_empty() {
                return Err("DRIVE_FOLDER_ID not set".into());
            }
            if self.drive.client_id.is_empty()
                || self.drive.client_secret.is_empty()
                || self.drive.refresh_token.is_empty()
            {
                return Err("GDRIVE_CLIENT_ID / GDRIVE_CLIENT_SECRET / GDRIVE_REFRESH_TOKEN not set".into());
            }
        }
        Ok(())
    }

    /// Create default configuration
    pub fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                workers: 4,
                max_payload_size: 1048576, // 1MB
            },
            auth: AuthConfig {
                api_key: String::new(),
            },
            drive: DriveConfig {
                backend: StoreBackend::Drive,
                folder_id: String::new(),
                client_id: String::new(),
                client_secret: String::new(),
                refresh_token: String::new(),
                token_uri: "https://oauth2.googleapis.com/token".to_string(),
            },
            logging: LoggingConfig {
                config_file: "server_log.yaml".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for name in [
            "STORE_BACKEND",
            "API_KEY",
            "DRIVE_FOLDER_ID",
            "GDRIVE_CLIENT_ID",
            "GDRIVE_CLIENT_SECRET",
            "GDRIVE_REFRESH_TOKEN",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_store_backend_from_str() {
        assert_eq!("drive".parse::<StoreBackend>().unwrap(), StoreBackend::Drive);
        assert_eq!("GDrive".parse::<StoreBackend>().unwrap(), StoreBackend::Drive);
        assert_eq!("mock".parse::<StoreBackend>().unwrap(), StoreBackend::Mock);
        assert_eq!("MOCK".parse::<StoreBackend>().unwrap(), StoreBackend::Mock);

        assert!("invalid".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.drive.backend, StoreBackend::Drive);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.config_file, "server_log.yaml");
    }

    #[test]
    #[serial]
    fn test_validate_rejects_missing_secrets() {
        clear_env();

        // Defaults have no api key and no credentials
        let config = AppConfig::default();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.auth.api_key = "key".to_string();
        assert!(config.validate().is_err());

        config.drive.folder_id = "folder".to_string();
        assert!(config.validate().is_err());

        config.drive.client_id = "id".to_string();
        config.drive.client_secret = "secret".to_string();
        config.drive.refresh_token = "token".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_mock_backend_needs_only_api_key() {
        clear_env();

        let mut config = AppConfig::default();
        config.drive.backend = StoreBackend::Mock;
        assert!(config.validate().is_err());

        config.auth.api_key = "key".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_from_file_with_env_overrides() {
        clear_env();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
server:
  host: "0.0.0.0"
  port: 9000
  workers: 2
  max_payload_size: 65536
auth:
  api_key: "file-key"
drive:
  backend: Mock
  folder_id: "file-folder"
  client_id: ""
  client_secret: ""
  refresh_token: ""
  token_uri: "https://oauth2.googleapis.com/token"
logging:
  config_file: "server_log.yaml"
"#
        )
        .unwrap();

        env::set_var("API_KEY", "env-key");
        env::set_var("DRIVE_FOLDER_ID", "env-folder");

        let config = AppConfig::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.api_key, "env-key");
        assert_eq!(config.drive.folder_id, "env-folder");
        assert_eq!(config.drive.backend, StoreBackend::Mock);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_from_missing_file_uses_defaults() {
        clear_env();
        env::set_var("STORE_BACKEND", "mock");
        env::set_var("API_KEY", "env-key");

        let config = AppConfig::load_from("does_not_exist.yaml").unwrap();
        assert_eq!(config.drive.backend, StoreBackend::Mock);
        assert_eq!(config.auth.api_key, "env-key");

        clear_env();
    }
}
