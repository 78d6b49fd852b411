//! Session and API-key settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for login sessions.
///
/// Missing fields fall back to [`SessionConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a session stays valid after login, in seconds. Both the
    /// forward and reverse keys are written with this TTL.
    ///
    /// Default: 24 hours.
    pub ttl_secs: u64,

    /// Length of a session token in characters.
    ///
    /// Default: 32 (about 196 bits of entropy).
    pub token_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
            token_length: 32,
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Configuration for API keys. The TTL is chosen per key at issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeyConfig {
    /// Length of an API key token in characters. Keys live longer than
    /// sessions, so they default to a longer secret.
    ///
    /// Default: 48.
    pub token_length: usize,
}

impl Default for ApiKeyConfig {
    fn default() -> Self {
        Self { token_length: 48 }
    }
}
