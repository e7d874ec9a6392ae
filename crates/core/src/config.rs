use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_SERVER_ROOT: &str = "http://127.0.0.1:5000";
pub const DEFAULT_LOG_FILTER: &str = "info";

const CONFIG_FILE_NAME: &str = "client.toml";
const LOG_FILE_NAME: &str = "porthole.log";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default = "default_server_root")]
    pub server_root: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_server_root() -> String {
    DEFAULT_SERVER_ROOT.to_string()
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_root: default_server_root(),
            request_timeout_secs: None,
            log_filter: default_log_filter(),
            log_file: None,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config directory is unavailable for this platform")]
    ConfigDirUnavailable,
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
    config: ClientConfig,
}

impl FileConfigStore {
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path()?;
        Self::load_from_path(path)
    }

    pub fn load_from_path(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                config: ClientConfig::default(),
            });
        }

        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        if raw.trim().is_empty() {
            return Ok(Self {
                path,
                config: ClientConfig::default(),
            });
        }

        let config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

        Ok(Self { path, config })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn into_config(self) -> ClientConfig {
        self.config
    }

    /// Log file from the config, or one next to the config file.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.config.log_file.clone().unwrap_or_else(|| {
            self.path
                .parent()
                .map_or_else(|| PathBuf::from(LOG_FILE_NAME), |dir| dir.join(LOG_FILE_NAME))
        })
    }
}

pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = if let Some(custom) = env::var_os("PORTHOLE_CONFIG_DIR") {
        PathBuf::from(custom)
    } else if cfg!(target_os = "windows") {
        env::var_os("APPDATA")
            .map(PathBuf::from)
            .ok_or(ConfigError::ConfigDirUnavailable)?
    } else if let Some(xdg_config_home) = env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config_home)
    } else {
        let home = env::var_os("HOME").ok_or(ConfigError::ConfigDirUnavailable)?;
        PathBuf::from(home).join(".config")
    };

    Ok(base_dir.join("porthole"))
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(default_config_dir()?.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;

    use tempfile::TempDir;

    use super::{ClientConfig, ConfigError, FileConfigStore, DEFAULT_SERVER_ROOT};

    fn temp_config_path(temp_dir: &TempDir) -> PathBuf {
        temp_dir.path().join("porthole").join("client.toml")
    }

    #[test]
    fn missing_config_file_loads_defaults() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let store =
            FileConfigStore::load_from_path(temp_config_path(&temp_dir)).expect("load defaults");

        assert_eq!(store.config(), &ClientConfig::default());
        assert_eq!(store.config().server_root, DEFAULT_SERVER_ROOT);
        assert!(store.config().request_timeout().is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("client.toml");
        fs::write(&path, "request_timeout_secs = 15\n").expect("write config");

        let store = FileConfigStore::load_from_path(&path).expect("load config");
        assert_eq!(store.config().server_root, DEFAULT_SERVER_ROOT);
        assert_eq!(
            store.config().request_timeout(),
            Some(Duration::from_secs(15))
        );
        assert_eq!(store.log_file(), temp_dir.path().join("porthole.log"));
    }

    #[test]
    fn explicit_log_file_and_root_are_loaded() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("client.toml");
        fs::write(
            &path,
            "server_root = \"https://porthole.internal\"\nlog_file = \"/var/log/porthole.log\"\n",
        )
        .expect("write config");

        let store = FileConfigStore::load_from_path(&path).expect("load config");
        assert_eq!(store.config().server_root, "https://porthole.internal");
        assert_eq!(store.log_file(), PathBuf::from("/var/log/porthole.log"));
    }

    #[test]
    fn invalid_toml_reports_parse_error() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("client.toml");
        fs::write(&path, "server_root = [").expect("write config");

        let err = FileConfigStore::load_from_path(&path).expect_err("parse should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
