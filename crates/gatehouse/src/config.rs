//! Server configuration, loadable from a JSON file.
//!
//! Every section and field has a default, so an empty object `{}` is a
//! valid config and a file only needs to mention what it changes:
//!
//! ```json
//! {
//!   "bind": "0.0.0.0:8080",
//!   "session": { "ttl_secs": 3600 },
//!   "cookie": { "domain": "example.com" },
//!   "store": { "url": "redis://cache:6379/0", "timeout_ms": 100 },
//!   "limits": { "login_window_ms": 2000, "trust_forwarded_for": true }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use gatehouse_session::{ApiKeyConfig, SessionConfig};
use gatehouse_store::StoreConfig;
use serde::{Deserialize, Serialize};

/// Errors from [`GatehouseConfig::load`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// All settings for a Gatehouse server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatehouseConfig {
    /// Address the HTTP listener binds to.
    pub bind: String,
    pub session: SessionConfig,
    pub api_keys: ApiKeyConfig,
    pub cookie: CookieConfig,
    pub store: StoreConfig,
    pub limits: LimitsConfig,
}

impl Default for GatehouseConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            session: SessionConfig::default(),
            api_keys: ApiKeyConfig::default(),
            cookie: CookieConfig::default(),
            store: StoreConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl GatehouseConfig {
    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// How the session cookie is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie name. Default: `session`.
    pub name: String,
    /// `Domain` attribute; omitted when `None`.
    pub domain: Option<String>,
    /// Adds the `Secure` attribute. Default: true. Turn off only for
    /// plain-HTTP development.
    pub secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            domain: None,
            secure: true,
        }
    }
}

/// Rate-limit settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Minimum interval between two `POST /login` calls from one client,
    /// in milliseconds. 0 disables the limit. Default: 1000.
    pub login_window_ms: u64,

    /// Take the client address from the first `X-Forwarded-For` hop
    /// instead of the TCP peer. Only enable behind a proxy that sets it.
    pub trust_forwarded_for: bool,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            login_window_ms: 1000,
            trust_forwarded_for: false,
        }
    }
}

impl LimitsConfig {
    pub fn login_window(&self) -> Duration {
        Duration::from_millis(self.login_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_empty_object_is_default() {
        let config = GatehouseConfig::from_json("{}").unwrap();
        assert_eq!(config, GatehouseConfig::default());
        assert_eq!(config.cookie.name, "session");
        assert!(config.cookie.secure);
        assert_eq!(config.limits.login_window(), Duration::from_secs(1));
    }

    #[test]
    fn test_from_json_nested_partial_override() {
        let config = GatehouseConfig::from_json(
            r#"{"cookie": {"domain": "example.com"}, "store": {"timeout_ms": 50}}"#,
        )
        .unwrap();

        assert_eq!(config.cookie.domain.as_deref(), Some("example.com"));
        assert_eq!(config.cookie.name, "session");
        assert_eq!(config.store.timeout_ms, 50);
        assert_eq!(config.store.retries, StoreConfig::default().retries);
    }

    #[test]
    fn test_from_json_malformed_is_parse_error() {
        assert!(matches!(
            GatehouseConfig::from_json("{bind:"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let result = GatehouseConfig::load("/definitely/not/here.json");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
