use crate::prelude::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const MIN_POLL_MS: u64 = 50;

/// Console settings loaded from YAML. Keys left out of the file keep their
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Base path of the registry collaborator, e.g. `http://127.0.0.1:8000/api`.
    pub base_url: String,
    pub poll_interval_ms: u64,
    /// Number of activity log entries kept.
    pub history_limit: usize,
    pub request_timeout_ms: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".into(),
            poll_interval_ms: 1000,
            history_limit: 20,
            request_timeout_ms: 5000,
        }
    }
}

impl ConsoleConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path_ref.display().to_string(),
            source,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_MS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"base_url: http://rig:9000/api\npoll_interval_ms: 250\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = ConsoleConfig::load(&path).unwrap();
        assert_eq!(cfg.base_url, "http://rig:9000/api");
        assert_eq!(cfg.poll_interval(), Duration::from_millis(250));
        assert_eq!(cfg.history_limit, 20);
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let cfg = ConsoleConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(cfg.poll_interval(), Duration::from_millis(MIN_POLL_MS));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ConsoleConfig::load("/nonexistent/console.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/console.yaml"));
    }
}
