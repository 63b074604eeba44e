//! Application-level configuration loading: server identity, storage backend and declared options.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::{
    scoped_store::{BackendOptions, StorageBackendKind},
    storage::StorageResult,
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SONOLUS_BACK_CONFIG_PATH";
/// Sonolus protocol version attached to every response unless configured otherwise.
pub const DEFAULT_SONOLUS_VERSION: &str = "1.0.2";
const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq, Deserialize)]
/// Immutable runtime configuration shared across the application.
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub description: Option<String>,
    /// Value of the `Sonolus-Version` response header.
    pub version: String,
    /// Marks every request context as coming from a development server.
    pub dev: bool,
    pub enable_cors: bool,
    pub port: u16,
    pub storage: StorageConfig,
    /// Server options resolved into every request context.
    pub options: Vec<DeclaredOption>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
/// Backend kind plus its options, read once at startup.
pub struct StorageConfig {
    /// Backend name as written in the file; resolved by [`StorageConfig::kind`].
    pub backend: String,
    pub options: BackendOptions,
}

impl StorageConfig {
    /// Resolve the configured backend name; unknown names are unsupported backends.
    pub fn kind(&self) -> StorageResult<StorageBackendKind> {
        self.backend.parse()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::Memory.as_str().into(),
            options: BackendOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
/// Server option a client may set through the query string.
pub struct DeclaredOption {
    /// Query parameter carrying the value.
    pub query: String,
    /// Value used when the request does not carry the parameter.
    #[serde(default)]
    pub default: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        backend = %config.storage.backend,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_env_port()
    }

    fn with_env_port(mut self) -> Self {
        if let Some(port) = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
        {
            self.port = port;
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Sonolus Server".into(),
            description: None,
            version: DEFAULT_SONOLUS_VERSION.into(),
            dev: false,
            enable_cors: true,
            port: DEFAULT_PORT,
            storage: StorageConfig::default(),
            options: Vec::new(),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
