//! Shared server state handed to every request.

use std::sync::Arc;

use gatehouse_limit::RateLimiter;
use gatehouse_session::{ApiKeyManager, CredentialService, SessionManager};
use gatehouse_store::CredentialStore;

use crate::GatehouseConfig;
use crate::directory::UserDirectory;

struct Inner<S, D> {
    credentials: CredentialService<S>,
    limiter: RateLimiter<S>,
    directory: D,
    config: GatehouseConfig,
}

/// Everything a gate or handler needs: the credential managers, the rate
/// limiter, the caller's user directory and the config.
///
/// Cloning is cheap (one `Arc`). There is no other shared state; two
/// `GatehouseState`s built from different stores are fully independent.
pub struct GatehouseState<S, D> {
    inner: Arc<Inner<S, D>>,
}

impl<S, D> Clone for GatehouseState<S, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, D> GatehouseState<S, D>
where
    S: CredentialStore + Clone,
    D: UserDirectory,
{
    pub fn new(store: S, directory: D, config: GatehouseConfig) -> Self {
        let credentials = CredentialService::new(
            store.clone(),
            config.session.clone(),
            config.api_keys.clone(),
        );
        Self {
            inner: Arc::new(Inner {
                credentials,
                limiter: RateLimiter::new(store),
                directory,
                config,
            }),
        }
    }
}

impl<S: CredentialStore, D> GatehouseState<S, D> {
    pub fn credentials(&self) -> &CredentialService<S> {
        &self.inner.credentials
    }

    pub fn sessions(&self) -> &SessionManager<S> {
        self.inner.credentials.sessions()
    }

    pub fn api_keys(&self) -> &ApiKeyManager<S> {
        self.inner.credentials.api_keys()
    }

    pub fn limiter(&self) -> &RateLimiter<S> {
        &self.inner.limiter
    }

    pub fn directory(&self) -> &D {
        &self.inner.directory
    }

    pub fn config(&self) -> &GatehouseConfig {
        &self.inner.config
    }
}
