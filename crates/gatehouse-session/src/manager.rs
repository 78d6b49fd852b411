//! The session manager: one login session per user.
//!
//! A session is two store keys that always change together:
//!
//! ```text
//! session:<token>      → "<userId>=<role>"   (forward: who is this token?)
//! user-session:<id>    → "<token>"           (reverse: which token is live?)
//! ```
//!
//! The reverse key is what enforces "one session per user". Logging in
//! again is a single atomic batch that follows the reverse key to the old
//! forward key, deletes it, and writes the new pair. Both keys carry the
//! same TTL, so they also expire together.
//!
//! ## Lifecycle
//!
//! ```text
//!               new_session()           new_session()
//! [NoSession] ───────────────→ [Active] ──────────────→ [Active']
//!      ▲                          │        (old token now NotFound)
//!      └──────────────────────────┘
//!        remove_session() / TTL expiry
//! ```
//!
//! # Concurrency note
//!
//! The manager holds no state of its own; the store is the only copy. The
//! reverse key is read inside the batch ([`Batch::del_referenced`]), never
//! before it, so concurrent logins for the same user serialize in the store
//! and whichever batch lands last leaves the only valid token.

use gatehouse_protocol::{Role, SessionRecord, UserId};
use gatehouse_store::{Batch, CredentialStore, keys};

use crate::{CredentialError, SessionConfig, new_token};

/// Issues, validates and revokes login sessions.
///
/// Generic over the store so that tests run against
/// [`MemoryStore`](gatehouse_store::MemoryStore) and production against
/// Redis, with the same code.
pub struct SessionManager<S> {
    store: S,
    config: SessionConfig,
}

impl<S: CredentialStore> SessionManager<S> {
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Starts a session for `user_id` and returns its token.
    ///
    /// Any previous session of the same user is invalidated in the same
    /// atomic write that creates the new one.
    ///
    /// # Errors
    /// - [`CredentialError::Token`] if no secure token could be generated.
    /// - [`CredentialError::Store`] if the store write failed. In that case
    ///   nothing was written.
    pub async fn new_session(
        &self,
        user_id: UserId,
        role: Role,
    ) -> Result<String, CredentialError> {
        let token = new_token(self.config.token_length)?;
        let reverse = keys::user_session(user_id.0);

        let record = SessionRecord { user_id, role };
        let ttl = Some(self.config.ttl());
        let batch = Batch::new()
            .del_referenced(reverse.as_str(), keys::SESSION_PREFIX)
            .set(keys::session(&token), record.to_compact(), ttl)
            .set(reverse, token.as_str(), ttl);

        self.store.execute(batch).await?;

        tracing::info!(%user_id, %role, "session created");
        Ok(token)
    }

    /// Resolves a session token to its record.
    ///
    /// # Errors
    /// - [`CredentialError::NotFound`] if the token is unknown, revoked or
    ///   expired.
    /// - [`CredentialError::Decode`] if the stored value is corrupted.
    /// - [`CredentialError::Store`] if the store could not answer.
    pub async fn validate(&self, token: &str) -> Result<SessionRecord, CredentialError> {
        let raw = self
            .store
            .get(&keys::session(token))
            .await?
            .ok_or(CredentialError::NotFound)?;

        SessionRecord::from_compact(&raw).map_err(|e| {
            tracing::error!(error = %e, "corrupted session record");
            CredentialError::Decode(e)
        })
    }

    /// Ends the session of `user_id`, if there is one.
    ///
    /// Idempotent: removing a session that does not exist succeeds.
    ///
    /// # Errors
    /// Returns [`CredentialError::Store`] if the store failed.
    pub async fn remove_session(&self, user_id: UserId) -> Result<(), CredentialError> {
        let reverse = keys::user_session(user_id.0);
        let batch = Batch::new()
            .del_referenced(reverse.as_str(), keys::SESSION_PREFIX)
            .del(reverse);
        self.store.execute(batch).await?;

        tracing::info!(%user_id, "session removed");
        Ok(())
    }

    /// The live session token of `user_id`, if any.
    pub async fn current_token(&self, user_id: UserId) -> Result<Option<String>, CredentialError> {
        Ok(self.store.get(&keys::user_session(user_id.0)).await?)
    }
}
