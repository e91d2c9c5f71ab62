//! Multimeter Configuration Module
//!
//! Config is stored in `~/.config/multimeter/config.yaml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Command-line flags
//! 2. Environment variables (`MULTIMETER_EMAIL`, `MULTIMETER_PASSWORD`, ...)
//! 3. Config file
//! 4. Defaults
//!
//! ```yaml
//! email: me@example.com
//! password: hunter2
//! server: https://screeps.com
//! shard: shard3
//! scrollback_lines: 1000
//! handshake_timeout_secs: 10
//! gauge_overflow: overshoot
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_SERVER;
use crate::controller::ControllerOptions;
use crate::error::{MultimeterError, Result};
use crate::session::Credentials;
use crate::tui::console::DEFAULT_SCROLLBACK_LINES;
use crate::tui::gauges::GaugeOverflow;

pub const ENV_EMAIL: &str = "MULTIMETER_EMAIL";
pub const ENV_PASSWORD: &str = "MULTIMETER_PASSWORD";
pub const ENV_SERVER: &str = "MULTIMETER_SERVER";
pub const ENV_SHARD: &str = "MULTIMETER_SHARD";
pub const ENV_LOG: &str = "MULTIMETER_LOG";

const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MultimeterConfig {
    pub email: Option<String>,

    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Server base URL; private servers are supported
    pub server: String,

    /// Shard for console commands (official server only)
    pub shard: Option<String>,

    pub scrollback_lines: usize,

    pub handshake_timeout_secs: u64,

    pub gauge_overflow: GaugeOverflow,

    /// Write tracing output here
    pub log_file: Option<PathBuf>,
}

impl Default for MultimeterConfig {
    fn default() -> Self {
        Self {
            email: None,
            password: None,
            server: DEFAULT_SERVER.to_string(),
            shard: None,
            scrollback_lines: DEFAULT_SCROLLBACK_LINES,
            handshake_timeout_secs: DEFAULT_HANDSHAKE_TIMEOUT_SECS,
            gauge_overflow: GaugeOverflow::default(),
            log_file: None,
        }
    }
}

impl MultimeterConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/multimeter/` on Linux
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("multimeter")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Load from the default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from file
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| MultimeterError::Config {
            reason: format!("Failed to read {}: {}", path.display(), e),
        })?;

        // An empty file parses as null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| MultimeterError::Config {
            reason: format!("Failed to parse {}: {}", path.display(), e),
        })
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over config file values.
    pub fn with_env(self) -> Self {
        self.with_vars(|name| std::env::var(name).ok())
    }

    /// Merge with variables from `lookup`; empty values are ignored
    pub fn with_vars<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(email) = var(ENV_EMAIL) {
            self.email = Some(email);
        }
        if let Some(password) = var(ENV_PASSWORD) {
            self.password = Some(password);
        }
        if let Some(server) = var(ENV_SERVER) {
            self.server = server;
        }
        if let Some(shard) = var(ENV_SHARD) {
            self.shard = Some(shard);
        }
        if let Some(log) = var(ENV_LOG) {
            self.log_file = Some(PathBuf::from(log));
        }

        self
    }

    /// Credentials, or a `Config` error naming what is missing
    pub fn credentials(&self) -> Result<Credentials> {
        let email = self
            .email
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| MultimeterError::Config {
                reason: format!("no email configured (set {} or --email)", ENV_EMAIL),
            })?;
        let password = self
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| MultimeterError::Config {
                reason: format!(
                    "no password configured (set {} or add it to {})",
                    ENV_PASSWORD,
                    Self::config_path().display()
                ),
            })?;
        Ok(Credentials::new(email, password))
    }

    /// Controller settings; a zero handshake timeout is a `Config` error
    pub fn controller_options(&self) -> Result<ControllerOptions> {
        if self.handshake_timeout_secs == 0 {
            return Err(MultimeterError::Config {
                reason: "handshake_timeout_secs must be at least 1".to_string(),
            });
        }
        Ok(ControllerOptions {
            handshake_timeout: Duration::from_secs(self.handshake_timeout_secs),
            scrollback_lines: self.scrollback_lines,
            gauge_overflow: self.gauge_overflow,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_config_path_contains_multimeter() {
        let path = MultimeterConfig::config_path();
        assert!(path.to_string_lossy().contains("multimeter"));
        assert!(path.to_string_lossy().ends_with("config.yaml"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = MultimeterConfig::load_from(&dir.path().join("nope.yaml")).unwrap();
        assert_eq!(config, MultimeterConfig::default());
        assert_eq!(config.server, "https://screeps.com");
        assert_eq!(config.scrollback_lines, 1000);
        assert_eq!(config.handshake_timeout_secs, 10);
        assert_eq!(config.gauge_overflow, GaugeOverflow::Overshoot);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "email: me@example.com\nserver: http://localhost:21025\ngauge_overflow: clamp\n",
        )
        .unwrap();

        let config = MultimeterConfig::load_from(&path).unwrap();
        assert_eq!(config.email.as_deref(), Some("me@example.com"));
        assert_eq!(config.server, "http://localhost:21025");
        assert_eq!(config.gauge_overflow, GaugeOverflow::Clamp);
        assert_eq!(config.scrollback_lines, 1000);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "scrollback_lines: [not, a, number]\n").unwrap();

        let err = MultimeterConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, MultimeterError::Config { .. }));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "\n").unwrap();
        assert_eq!(
            MultimeterConfig::load_from(&path).unwrap(),
            MultimeterConfig::default()
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let config = MultimeterConfig {
            email: Some("file@example.com".to_string()),
            ..Default::default()
        }
        .with_vars(vars(&[
            (ENV_EMAIL, "env@example.com"),
            (ENV_PASSWORD, "secret"),
            (ENV_SHARD, "shard1"),
            (ENV_SERVER, ""),
        ]));

        assert_eq!(config.email.as_deref(), Some("env@example.com"));
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.shard.as_deref(), Some("shard1"));
        // Empty values do not override
        assert_eq!(config.server, DEFAULT_SERVER);
    }

    #[test]
    fn test_credentials_require_email_and_password() {
        let err = MultimeterConfig::default().credentials().unwrap_err();
        assert!(err.to_string().contains(ENV_EMAIL));

        let config = MultimeterConfig::default().with_vars(vars(&[(ENV_EMAIL, "me@example.com")]));
        let err = config.credentials().unwrap_err();
        assert!(err.to_string().contains(ENV_PASSWORD));

        let config = config.with_vars(vars(&[(ENV_PASSWORD, "hunter2")]));
        assert_eq!(
            config.credentials().unwrap(),
            Credentials::new("me@example.com", "hunter2")
        );
    }

    #[test]
    fn test_password_never_serialized() {
        let config = MultimeterConfig {
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("hunter2"));
    }

    #[test]
    fn test_controller_options() {
        let config = MultimeterConfig {
            handshake_timeout_secs: 3,
            scrollback_lines: 50,
            ..Default::default()
        };
        let options = config.controller_options().unwrap();
        assert_eq!(options.handshake_timeout, Duration::from_secs(3));
        assert_eq!(options.scrollback_lines, 50);
    }

    #[test]
    fn test_zero_handshake_timeout_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "handshake_timeout_secs: 0\n").unwrap();

        let config = MultimeterConfig::load_from(&path).unwrap();
        let err = config.controller_options().unwrap_err();
        assert!(matches!(err, MultimeterError::Config { .. }));
        assert!(err.to_string().contains("handshake_timeout_secs"));
    }
}
