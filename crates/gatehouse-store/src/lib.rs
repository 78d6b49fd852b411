//! Credential store abstraction for Gatehouse.
//!
//! Provides the [`CredentialStore`] trait that the session, API-key and
//! rate-limit layers use to persist their records, plus two
//! implementations:
//!
//! - [`MemoryStore`] — in-process map with TTLs (tests, development)
//! - [`RedisStore`] — Redis via `redis` with a connection manager
//!
//! # Atomicity
//!
//! Every multi-key change (replacing a session, issuing or revoking a key
//! pair) is expressed as one [`Batch`] and applied with
//! [`CredentialStore::execute`]. Implementations must apply a batch as a
//! unit: a concurrent reader sees either none of it or all of it.
//!
//! # Feature Flags
//!
//! - `redis` (default) — [`RedisStore`] backed by the `redis` crate

mod batch;
mod config;
mod error;
pub mod keys;
mod memory;
#[cfg(feature = "redis")]
mod redis_store;

pub use batch::{Batch, Command};
pub use config::{StoreConfig, with_deadline};
pub use error::StoreError;
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A key-value store holding credential and rate-limit records.
///
/// The store is the sole owner of those records. Expiry is the store's job:
/// values written with a TTL simply stop being returned once it elapses.
///
/// Methods return `impl Future + Send` so that generic request handlers
/// built on top of the trait stay `Send` themselves.
pub trait CredentialStore: Send + Sync + 'static {
    /// Reads a single key. Returns `Ok(None)` if absent or expired.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Writes `key = value` with the given TTL only if `key` is absent.
    ///
    /// Returns `Ok(true)` if this call created the key. This is a single
    /// atomic store operation, not a read followed by a write.
    fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Applies every command in `batch` as one atomic unit.
    fn execute(
        &self,
        batch: Batch,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Stores shared through an `Arc` are stores too, so managers can hold
/// either a store or a shared handle to one.
impl<S: CredentialStore> CredentialStore for Arc<S> {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send {
        (**self).get(key)
    }

    fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        (**self).set_if_absent(key, value, ttl)
    }

    fn execute(
        &self,
        batch: Batch,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).execute(batch)
    }
}
