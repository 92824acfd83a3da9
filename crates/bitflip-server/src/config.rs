//! Configuration management for the bitflip server.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with BITFLIP_ prefix)
//! 3. .env files
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:5000")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Directory holding uploaded blobs
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Maximum upload size in bytes (default: 16 MB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Accepted upload extensions, lowercase, without the dot
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Shots used when a request does not specify any
    #[serde(default = "default_shots")]
    pub default_shots: u32,

    /// Upper bound on shots per request
    #[serde(default = "default_max_shots")]
    pub max_shots: u32,

    /// Allow cross-origin requests from any origin
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

fn default_bind_address() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    ["txt", "json", "qasm", "py", "png", "jpg", "jpeg", "pdf"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_shots() -> u32 {
    1000
}

fn default_max_shots() -> u32 {
    100_000
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            allowed_extensions: default_allowed_extensions(),
            default_shots: default_shots(),
            max_shots: default_max_shots(),
            cors_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: ServerConfig = serde_yaml_ng::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load .env file if it exists
    /// 2. Load from file if provided
    /// 3. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let config = config.merge_env_from(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Only variables that are present override the current values. A present
    /// but unparsable number is an error rather than silently ignored.
    pub fn merge_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BITFLIP_BIND") {
            self.bind_address = v;
        }
        if let Some(v) = lookup("BITFLIP_UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("BITFLIP_MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = parse_var("BITFLIP_MAX_UPLOAD_BYTES", &v)?;
        }
        if let Some(v) = lookup("BITFLIP_DEFAULT_SHOTS") {
            self.default_shots = parse_var("BITFLIP_DEFAULT_SHOTS", &v)?;
        }
        if let Some(v) = lookup("BITFLIP_MAX_SHOTS") {
            self.max_shots = parse_var("BITFLIP_MAX_SHOTS", &v)?;
        }
        if let Some(v) = lookup("BITFLIP_CORS") {
            self.cors_enabled = parse_var("BITFLIP_CORS", &v)?;
        }
        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "max_upload_bytes must be greater than 0".to_string(),
            ));
        }

        if self.default_shots == 0 {
            return Err(ConfigError::ValidationError(
                "default_shots must be greater than 0".to_string(),
            ));
        }

        if self.default_shots > self.max_shots {
            return Err(ConfigError::ValidationError(format!(
                "default_shots ({}) exceeds max_shots ({})",
                self.default_shots, self.max_shots
            )));
        }

        if let Some(bad) = self
            .allowed_extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.contains('.') || ext.chars().any(char::is_uppercase))
        {
            return Err(ConfigError::ValidationError(format!(
                "Invalid extension '{bad}': use lowercase without the dot"
            )));
        }

        Ok(())
    }

    /// Get the parsed bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address.parse().map_err(|_| {
            ConfigError::ValidationError(format!("Invalid bind address: {}", self.bind_address))
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ParseError(format!("{key}: cannot parse '{value}'")))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address, "127.0.0.1:5000");
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.default_shots, 1000);
        assert!(config.allowed_extensions.iter().any(|e| e == "qasm"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_bind_address() {
        let config = ServerConfig {
            bind_address: "not-an-address".into(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_default_shots_above_max_rejected() {
        let config = ServerConfig {
            default_shots: 10,
            max_shots: 5,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extension_with_dot_rejected() {
        let config = ServerConfig {
            allowed_extensions: vec![".txt".into()],
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::default()
            .merge_env_from(vars(&[
                ("BITFLIP_BIND", "0.0.0.0:8080"),
                ("BITFLIP_DEFAULT_SHOTS", "250"),
                ("BITFLIP_CORS", "false"),
            ]))
            .unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.default_shots, 250);
        assert!(!config.cors_enabled);
        assert_eq!(config.max_shots, 100_000);
    }

    #[test]
    fn test_env_bad_number_is_error() {
        let result =
            ServerConfig::default().merge_env_from(vars(&[("BITFLIP_MAX_SHOTS", "lots")]));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_yaml_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_address: \"127.0.0.1:9000\"\nmax_shots: 5000").unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.max_shots, 5000);
        assert_eq!(config.default_shots, 1000);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ServerConfig::from_file("/definitely/not/here.yaml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
