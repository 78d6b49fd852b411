//! Credential issuance and validation for Gatehouse.
//!
//! This crate handles the lifecycle of credentials:
//!
//! 1. **Secrets** — unguessable tokens ([`new_token`])
//! 2. **Sessions** — one login session per user ([`SessionManager`])
//! 3. **API keys** — many long-lived keys per user, each with its own TTL
//!    ([`ApiKeyManager`])
//! 4. **Authentication** — turning a presented secret into an
//!    [`Identity`](gatehouse_protocol::Identity) ([`Authenticator`])
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP Layer (above)   ← gates call Authenticator for every request
//!     ↕
//! Session Layer (this crate)  ← issues, validates, revokes credentials
//!     ↕
//! Store Layer (below)  ← persists forward/reverse key pairs with TTLs
//! ```

mod api_key;
mod auth;
mod config;
mod error;
mod manager;
mod token;

pub use api_key::{ApiKeyManager, IssuedKey};
pub use auth::{Authenticator, Credential, CredentialService};
pub use config::{ApiKeyConfig, SessionConfig};
pub use error::{CredentialError, TokenError};
pub use manager::SessionManager;
pub use token::{ALPHABET, new_token};
