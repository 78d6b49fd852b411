//! Per-client, per-route rate limiting for Gatehouse.
//!
//! The limiter enforces a minimum interval between two requests from the
//! same client to the same route. It keeps no counters; a request is
//! allowed if and only if it manages to create the marker key
//!
//! ```text
//! limit:<client>:<route> → "1"   (TTL = window)
//! ```
//!
//! Creation is a single insert-if-absent with expiry
//! ([`CredentialStore::set_if_absent`]), so of any number of simultaneous
//! requests exactly one wins. The marker then blocks the pair until its
//! TTL runs out.
//!
//! # Integration
//!
//! The HTTP layer calls [`RateLimiter::limit`] before the handler and
//! answers 429 on [`LimitDecision::Rejected`]:
//!
//! ```ignore
//! match limiter.limit(&client, "/login", window).await? {
//!     LimitDecision::Allowed => next.run(req).await,
//!     LimitDecision::Rejected => StatusCode::TOO_MANY_REQUESTS.into_response(),
//! }
//! ```

use std::time::Duration;

use gatehouse_store::{CredentialStore, StoreError, keys};
use tracing::debug;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDecision {
    /// First request in the window; the marker has been set.
    Allowed,
    /// A marker for this client and route is still live.
    Rejected,
}

impl LimitDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Marker-based rate limiter over a [`CredentialStore`].
pub struct RateLimiter<S> {
    store: S,
}

impl<S: CredentialStore> RateLimiter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Admits at most one request per `window` for `(client, route)`.
    ///
    /// A zero window disables limiting for the call.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the store could not be reached. The
    /// caller decides whether that fails open or closed; the HTTP layer
    /// answers 500.
    pub async fn limit(
        &self,
        client: &str,
        route: &str,
        window: Duration,
    ) -> Result<LimitDecision, StoreError> {
        if window.is_zero() {
            return Ok(LimitDecision::Allowed);
        }

        let key = keys::rate_limit(client, route);
        if self.store.set_if_absent(&key, "1", window).await? {
            Ok(LimitDecision::Allowed)
        } else {
            debug!(client, route, "rate limited");
            Ok(LimitDecision::Rejected)
        }
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_store::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_limit_zero_window_always_allows() {
        let limiter = RateLimiter::new(MemoryStore::new());
        for _ in 0..3 {
            let decision = limiter.limit("c", "/r", Duration::ZERO).await.unwrap();
            assert!(decision.is_allowed());
        }
    }

    #[tokio::test]
    async fn test_limit_routes_and_clients_are_independent() {
        let limiter = RateLimiter::new(MemoryStore::new());
        let window = Duration::from_secs(1);

        assert!(limiter.limit("a", "/x", window).await.unwrap().is_allowed());
        assert!(limiter.limit("a", "/y", window).await.unwrap().is_allowed());
        assert!(limiter.limit("b", "/x", window).await.unwrap().is_allowed());
        assert_eq!(
            limiter.limit("a", "/x", window).await.unwrap(),
            LimitDecision::Rejected
        );
    }
}
