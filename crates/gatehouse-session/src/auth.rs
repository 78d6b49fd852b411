//! The authentication contract: `Authenticate(secret) -> Identity`.
//!
//! The HTTP gates don't know about sessions or API keys. They pull a
//! [`Credential`] out of the request and hand it to an [`Authenticator`],
//! which either returns an [`Identity`] or says why it can't.
//!
//! # Why a trait?
//!
//! The production implementation is [`CredentialService`], backed by the
//! credential store. Tests of the HTTP layer can swap in a fixed
//! authenticator without a store at all.

use std::future::Future;

use gatehouse_protocol::Identity;
use gatehouse_store::CredentialStore;

use crate::{ApiKeyConfig, ApiKeyManager, CredentialError, SessionConfig, SessionManager};

/// A secret presented by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// The value of the session cookie.
    SessionToken(String),
    /// A bearer API key.
    ApiKey(String),
}

/// Resolves a presented credential to the caller's identity.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` because one authenticator is shared by every
/// request task for the lifetime of the server.
pub trait Authenticator: Send + Sync + 'static {
    /// Validates `credential`.
    ///
    /// # Returns
    /// - `Ok(Identity)` if the secret maps to a live record
    /// - `Err(CredentialError::NotFound)` if it does not (401)
    /// - any other error for internal failures (500)
    fn authenticate(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<Identity, CredentialError>> + Send;
}

/// The store-backed [`Authenticator`], owning both credential managers.
///
/// Both managers talk to the same store, so `S` is usually a cheap handle
/// such as `Arc<MemoryStore>` or [`RedisStore`](gatehouse_store::RedisStore).
pub struct CredentialService<S> {
    sessions: SessionManager<S>,
    api_keys: ApiKeyManager<S>,
}

impl<S: CredentialStore + Clone> CredentialService<S> {
    pub fn new(store: S, sessions: SessionConfig, api_keys: ApiKeyConfig) -> Self {
        Self {
            sessions: SessionManager::new(store.clone(), sessions),
            api_keys: ApiKeyManager::new(store, api_keys),
        }
    }
}

impl<S: CredentialStore> CredentialService<S> {
    pub fn sessions(&self) -> &SessionManager<S> {
        &self.sessions
    }

    pub fn api_keys(&self) -> &ApiKeyManager<S> {
        &self.api_keys
    }
}

impl<S: CredentialStore> Authenticator for CredentialService<S> {
    async fn authenticate(&self, credential: &Credential) -> Result<Identity, CredentialError> {
        match credential {
            Credential::SessionToken(token) => {
                Ok(self.sessions.validate(token).await?.into())
            }
            Credential::ApiKey(token) => {
                Ok(self.api_keys.validate_api_key(token).await?.into())
            }
        }
    }
}
