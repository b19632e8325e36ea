//! Client configuration
//!
//! Loaded from `config.toml` in the platform config directory. Every field
//! has a default, so a missing file or an empty table is a valid config.
//! Environment variables are applied last.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Poll pages are capped so a long disconnect cannot pull an unbounded payload
pub const MAX_POLL_LIMIT: u32 = 50;

/// Lower bound on the poll interval
pub const MIN_POLL_INTERVAL_MS: u64 = 250;

const ENV_API_URL: &str = "PARLEY_API_URL";
const ENV_API_TOKEN: &str = "PARLEY_API_TOKEN";
const ENV_POLL_INTERVAL: &str = "PARLEY_POLL_INTERVAL_MS";

/// Runtime configuration for the chat client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server origin; requests go to `{api_url}/api/v1/...`
    pub api_url: String,
    /// Static bearer token
    pub api_token: String,
    pub poll_interval_ms: u64,
    /// Page size of the initial full load
    pub initial_limit: u32,
    /// Page size of each incremental poll
    pub poll_limit: u32,
    /// How close to the end (in lines) still counts as "at the bottom"
    pub scroll_threshold: u32,
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            api_token: "super-secret-doodle-token".to_string(),
            poll_interval_ms: 3000,
            initial_limit: 100,
            poll_limit: MAX_POLL_LIMIT,
            scroll_threshold: 3,
            request_timeout_ms: 10_000,
        }
    }
}

impl ClientConfig {
    /// Parse configuration from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ClientConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        Ok(config.normalized())
    }

    /// Load from a file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from the explicit path if given, else the platform config file,
    /// then apply environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => match default_config_path() {
                Some(path) => Self::load_from(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN) {
            self.api_token = token;
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL) {
            self.poll_interval_ms = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be an integer, got '{}'", ENV_POLL_INTERVAL, raw))
            })?;
        }
        *self = self.clone().normalized();
        Ok(())
    }

    fn normalized(mut self) -> Self {
        self.api_url = self.api_url.trim_end_matches('/').to_string();
        self.poll_limit = self.poll_limit.clamp(1, MAX_POLL_LIMIT);
        self.poll_interval_ms = self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "onyx", "parley")
}

/// Platform config file location
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Platform data directory (holds the preferences database)
pub fn data_dir() -> Result<PathBuf> {
    let dirs = project_dirs().ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        ))
    })?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ClientConfig::from_toml("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(3));
        assert_eq!(config.scroll_threshold, 3);
    }

    #[test]
    fn test_partial_config() {
        let config = ClientConfig::from_toml(
            r#"
api_url = "https://chat.example.com/"
poll_interval_ms = 1500
"#,
        )
        .unwrap();
        assert_eq!(config.api_url, "https://chat.example.com");
        assert_eq!(config.poll_interval_ms, 1500);
        assert_eq!(config.initial_limit, 100);
    }

    #[test]
    fn test_limits_are_clamped() {
        let config = ClientConfig::from_toml("poll_limit = 500\npoll_interval_ms = 10").unwrap();
        assert_eq!(config.poll_limit, MAX_POLL_LIMIT);
        assert_eq!(config.poll_interval_ms, MIN_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_invalid_toml() {
        let err = ClientConfig::from_toml("poll_limit = \"many\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PARLEY_API_URL", "http://10.0.0.2:8080"),
            ("PARLEY_API_TOKEN", "t0ken"),
            ("PARLEY_POLL_INTERVAL_MS", "5000"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api_url, "http://10.0.0.2:8080");
        assert_eq!(config.api_token, "t0ken");
        assert_eq!(config.poll_interval_ms, 5000);
    }

    #[test]
    fn test_env_bad_interval() {
        let mut config = ClientConfig::default();
        let result = config.apply_env(|k| (k == "PARLEY_POLL_INTERVAL_MS").then(|| "soon".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_token = \"from-file\"\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.api_token, "from-file");
    }
}
