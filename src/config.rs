//! This module provides functionality for loading and handling the
//! application's configuration.
//!
//! It defines the `QuillpadConfig` struct, which holds the configuration
//! parameters, and a `load_config` function to load the configuration from a
//! YAML file. The API credential is deliberately **not** expected in the
//! file: `load_config` resolves it from the `QUILLPAD_API_KEY` environment
//! variable, which overrides any value present in the YAML, and fails fast
//! when the credential is absent everywhere.
//!
//! # Examples
//!
//! Loading the configuration from a file:
//!
//! ```no_run
//! use quillpad::config::{QuillpadConfig, load_config};
//!
//! let config: QuillpadConfig = load_config("/path/to/config.yaml").unwrap();
//! println!("{:?}", config);
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::{env, fs};
use thiserror::Error;
use tracing::{debug, info};

/// Name of the environment variable holding the API credential.
pub const API_KEY_ENV: &str = "QUILLPAD_API_KEY";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("QUILLPAD_API_KEY is required: set it in the environment")]
    MissingApiKey,
}

/// Represents the application's configuration.
///
/// This struct holds the parameters needed to run the application: API
/// credential and base URL, model name, the document store root, the network
/// timeout, and the retry/backoff knobs for rate-limited requests. It is
/// constructed by loading a YAML configuration file with [`load_config`];
/// every field except the credential has a default, so an empty or missing
/// file still yields a usable configuration.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct QuillpadConfig {
    /// The API key used to authenticate requests. Resolved from the
    /// environment; a value in the YAML file is only a fallback.
    #[serde(default)]
    pub api_key: String,

    /// The base URL of the hosted messages API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// The name of the model used for generating feedback.
    #[serde(default = "default_model")]
    pub model: String,

    /// Root directory of the document store. Defaults to the per-platform
    /// data directory + `documents` when unset.
    #[serde(default)]
    pub documents_dir: Option<PathBuf>,

    // Network timeout for a single API request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // Retry policy: total attempts per call, retrying rate limits only.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    // Backoff before retry n is base * 2^(n-1) seconds, capped below.
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,

    #[serde(default = "default_backoff_cap_secs")]
    pub backoff_cap_secs: u64,

    /// Optional cap on the chat transcript; oldest turns are ejected in
    /// pairs once the cap is exceeded. `None` means unbounded.
    #[serde(default)]
    pub history_max_entries: Option<usize>,
}

fn default_api_base() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_model() -> String {
    "claude-3-7-sonnet-20250219".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_secs() -> u64 {
    2
}

fn default_backoff_cap_secs() -> u64 {
    10
}

impl Default for QuillpadConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
            model: default_model(),
            documents_dir: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_base_secs: default_backoff_base_secs(),
            backoff_cap_secs: default_backoff_cap_secs(),
            history_max_entries: None,
        }
    }
}

impl QuillpadConfig {
    /// Resolve the document store root, falling back to the per-platform
    /// data directory when the config does not set one.
    pub fn documents_dir(&self) -> PathBuf {
        match &self.documents_dir {
            Some(dir) => dir.clone(),
            None => crate::data_dir()
                .map(|d| d.join("documents"))
                .unwrap_or_else(|_| PathBuf::from("documents")),
        }
    }

    /// Create the document store root if it does not exist yet.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        let dir = self.documents_dir();
        fs::create_dir_all(&dir)?;
        info!("Ensured documents directory exists: {}", dir.display());
        Ok(())
    }
}

/// Loads the application's configuration from a YAML file.
///
/// This function reads the file at the given path (an absent file is treated
/// as an empty one), parses it as YAML, then resolves the API credential:
/// the `QUILLPAD_API_KEY` environment variable overrides whatever the file
/// contains. A missing credential is a fatal configuration error.
///
/// # Parameters
///
/// - `file`: The path to the YAML configuration file.
///
/// # Returns
///
/// - `Ok(QuillpadConfig)`: The loaded configuration, credential included.
/// - `Err(ConfigError)`: The file could not be read or parsed, or no
///   credential was found.
pub fn load_config(file: &str) -> Result<QuillpadConfig, ConfigError> {
    debug!("Loading config from: {file}");

    let mut config: QuillpadConfig = match fs::read_to_string(file) {
        Ok(content) => serde_yaml::from_str(&content)?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("No config file at {file}, using defaults");
            QuillpadConfig::default()
        }
        Err(err) => return Err(err.into()),
    };

    if let Ok(key) = env::var(API_KEY_ENV) {
        config.api_key = key;
    }

    if config.api_key.trim().is_empty() {
        return Err(ConfigError::MissingApiKey);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    // Serializes access to QUILLPAD_API_KEY across tests.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn test_load_config_valid_file() {
        let _guard = ENV_LOCK.lock().unwrap();
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
api_key: "example_api_key"
api_base: "http://example.com"
model: "example_model"
request_timeout_secs: 30
max_attempts: 5
"#
        )
        .unwrap();

        unsafe { env::remove_var(API_KEY_ENV) };
        let config = load_config(temp_file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.api_key, "example_api_key");
        assert_eq!(config.api_base, "http://example.com");
        assert_eq!(config.model, "example_model");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.backoff_base_secs, 2);
        assert_eq!(config.backoff_cap_secs, 10);
    }

    #[test]
    fn test_env_var_overrides_file() {
        let _guard = ENV_LOCK.lock().unwrap();
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, r#"api_key: "file_key""#).unwrap();

        unsafe { env::set_var(API_KEY_ENV, "env_key") };
        let config = load_config(temp_file.path().to_str().unwrap()).unwrap();
        unsafe { env::remove_var(API_KEY_ENV) };

        assert_eq!(config.api_key, "env_key");
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, r#"model: "example_model""#).unwrap();

        unsafe { env::remove_var(API_KEY_ENV) };
        let config = load_config(temp_file.path().to_str().unwrap());

        assert!(matches!(config, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { env::set_var(API_KEY_ENV, "env_key") };
        let config = load_config("non/existent/path").unwrap();
        unsafe { env::remove_var(API_KEY_ENV) };

        assert_eq!(config.api_base, "https://api.anthropic.com");
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn test_load_config_invalid_format() {
        let _guard = ENV_LOCK.lock().unwrap();
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, r#"invalid: config: format"#).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap());
        assert!(config.is_err());
    }
}
