use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE: &str = "config.json";
/// Overrides the data directory
pub const HOME_ENV: &str = "BROKERPAD_HOME";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerpadConfig {
    pub data_dir: PathBuf,
    /// Vendor archives for isolation views, `<dir>/<kind>/*.jar`
    pub isolation_dir: Option<PathBuf>,
    pub gradle_command: String,
    pub groovy_command: String,
    pub fetch_timeout_secs: u64,
}

impl Default for BrokerpadConfig {
    fn default() -> Self {
        Self::with_data_dir(default_data_dir())
    }
}

impl BrokerpadConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            isolation_dir: None,
            gradle_command: "gradle".to_string(),
            groovy_command: "groovy".to_string(),
            fetch_timeout_secs: 600,
        }
    }

    /// Config from the data directory named by `BROKERPAD_HOME`, or
    /// `~/.brokerpad`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_data_dir())
    }

    /// Read `config.json` under `data_dir`. A missing file gives the
    /// defaults; the data directory is always `data_dir` unless the file
    /// names another.
    pub fn load_from(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = data_dir.join(CONFIG_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::with_data_dir(data_dir));
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        let mut value: serde_json::Value = serde_json::from_str(&text).map_err(|source| {
            ConfigError::Parse {
                path: path.clone(),
                source,
            }
        })?;
        if let Some(map) = value.as_object_mut() {
            map.entry("data_dir")
                .or_insert_with(|| serde_json::Value::from(data_dir.to_string_lossy().as_ref()));
        }
        serde_json::from_value(value).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn isolation_dir(&self) -> PathBuf {
        self.isolation_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("isolation"))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// Root of the managed jar directories
    pub fn session_dir(&self) -> PathBuf {
        self.data_dir.join("workspace")
    }

    /// Where the generated Gradle project lives
    pub fn fetch_dir(&self) -> PathBuf {
        self.data_dir.join("fetch")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.data_dir.join("project.json")
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn default_data_dir() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV) {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .map(|h| h.join(".brokerpad"))
        .unwrap_or_else(|| PathBuf::from(".brokerpad"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = BrokerpadConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.gradle_command, "gradle");
        assert_eq!(config.groovy_command, "groovy");
        assert_eq!(config.fetch_timeout(), Duration::from_secs(600));
        assert_eq!(config.isolation_dir(), dir.path().join("isolation"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"gradle_command": "./gradlew", "fetch_timeout_secs": 30}"#,
        )
        .unwrap();

        let config = BrokerpadConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.gradle_command, "./gradlew");
        assert_eq!(config.fetch_timeout_secs, 30);
        assert_eq!(config.groovy_command, "groovy");
        assert_eq!(config.data_dir, dir.path());
    }

    #[test]
    fn test_isolation_dir_override() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"isolation_dir": "/opt/brokerpad/isolation"}"#,
        )
        .unwrap();

        let config = BrokerpadConfig::load_from(dir.path()).unwrap();
        assert_eq!(
            config.isolation_dir(),
            PathBuf::from("/opt/brokerpad/isolation")
        );
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        assert!(matches!(
            BrokerpadConfig::load_from(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
