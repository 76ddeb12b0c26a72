//! Application-level configuration loading: storage location, reserved keys and retry bounds.

use std::{
    env, fs,
    io::ErrorKind,
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::state::{
    leaderboard::{DEFAULT_DATA_KEY, DEFAULT_LOCK_KEY, SharedKeyError, StoreKeys},
    retry::RetryPolicy,
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/leaderboard.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LEADERBOARD_CONFIG_PATH";
/// Directory holding the persisted values when none is configured.
const DEFAULT_STORAGE_DIR: &str = "data";
/// Capacity of a browser origin's local storage.
const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Reserved backend keys for the board and its lock.
    pub keys: StoreKeys,
    /// Bound on retries of contended updates.
    pub retry: RetryPolicy,
    /// Directory of the file backend.
    pub storage_dir: PathBuf,
    /// `None` disables the quota.
    pub quota_bytes: Option<usize>,
    /// Address the HTTP surface listens on.
    pub bind_addr: SocketAddr,
}

/// Configuration document that cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Not JSON, or fields of the wrong type or unknown name.
    #[error("invalid config document: {0}")]
    Parse(#[from] serde_json::Error),
    /// Values that parse but cannot work together.
    #[error(transparent)]
    Keys(#[from] SharedKeyError),
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    ///
    /// `PORT` overrides the configured port.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        storage_dir = %config.storage_dir.display(),
                        "loaded leaderboard config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "rejected config; falling back to defaults"
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

        config.with_port_override(env::var("PORT").ok().as_deref())
    }

    /// Parse a JSON document; omitted fields keep their defaults.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<RawConfig>(contents)?.try_into()
    }

    fn with_port_override(mut self, port: Option<&str>) -> Self {
        if let Some(port) = port.and_then(|value| value.parse::<u16>().ok()) {
            self.bind_addr.set_port(port);
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::assemble(RawConfig::default(), StoreKeys::default())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    data_key: Option<String>,
    lock_key: Option<String>,
    retry_delay_ms: Option<u64>,
    max_attempts: Option<u32>,
    storage_dir: Option<PathBuf>,
    /// `0` disables the quota.
    quota_bytes: Option<usize>,
    bind_addr: Option<SocketAddr>,
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(mut value: RawConfig) -> Result<Self, ConfigError> {
        let keys = StoreKeys::new(
            value
                .data_key
                .take()
                .unwrap_or_else(|| DEFAULT_DATA_KEY.to_owned()),
            value
                .lock_key
                .take()
                .unwrap_or_else(|| DEFAULT_LOCK_KEY.to_owned()),
        )?;
        Ok(Self::assemble(value, keys))
    }
}

impl AppConfig {
    fn assemble(value: RawConfig, keys: StoreKeys) -> Self {
        let retry = RetryPolicy::new(
            value
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(RetryPolicy::DEFAULT_DELAY),
            value
                .max_attempts
                .unwrap_or(RetryPolicy::DEFAULT_MAX_ATTEMPTS),
        );
        let quota_bytes = match value.quota_bytes {
            Some(0) => None,
            Some(bytes) => Some(bytes),
            None => Some(DEFAULT_QUOTA_BYTES),
        };

        Self {
            keys,
            retry,
            storage_dir: value
                .storage_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR)),
            quota_bytes,
            bind_addr: value
                .bind_addr
                .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT))),
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
