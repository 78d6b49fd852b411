//! Key layout.
//!
//! Credentials are stored as forward/reverse pairs. The forward key maps a
//! secret token to its record; the reverse key maps a stable id back to the
//! current token, so a credential can be found and revoked without knowing
//! its secret. Both members of a pair always carry the same TTL.
//!
//! | Purpose    | Forward                | Reverse                 |
//! |------------|------------------------|-------------------------|
//! | Session    | `session:<token>`      | `user-session:<userId>` |
//! | API key    | `apikey:<token>`       | `apikey-rev:<id>`       |
//! | Rate limit | `limit:<client>:<route>` | —                     |

/// Prefix of forward session keys; the reverse key holds the rest.
pub const SESSION_PREFIX: &str = "session:";

pub fn session(token: &str) -> String {
    format!("{SESSION_PREFIX}{token}")
}

pub fn user_session(user_id: u64) -> String {
    format!("user-session:{user_id}")
}

pub fn api_key(token: &str) -> String {
    format!("apikey:{token}")
}

pub fn api_key_reverse(key_id: u64) -> String {
    format!("apikey-rev:{key_id}")
}

pub fn rate_limit(client: &str, route: &str) -> String {
    format!("limit:{client}:{route}")
}
