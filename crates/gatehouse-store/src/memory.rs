//! In-process [`CredentialStore`] with TTL support.
//!
//! Backed by a single `HashMap` behind a `tokio::sync::Mutex`. A batch is
//! applied while holding the lock once, which gives the same all-or-nothing
//! visibility as the Redis batch script.
//!
//! Expiry uses `tokio::time::Instant`, so tests can pause and advance the
//! clock (`tokio::time::pause()` / `advance()`) instead of sleeping.
//! Expired entries are dropped when touched, and every
//! `SWEEP_EVERY` writes the whole map is swept, so keys that are never
//! read again (one-off rate-limit markers, abandoned sessions) do not pile
//! up.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{Batch, Command, CredentialStore, StoreError};

/// Writes between two full sweeps of expired entries.
const SWEEP_EVERY: u32 = 1024;

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// A [`CredentialStore`] that keeps everything in memory.
///
/// Suitable for tests and single-process development servers. Nothing
/// survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Entries>,
}

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<String, Entry>,
    writes: u32,
}

impl Entries {
    fn live(&self, key: &str, now: Instant) -> Option<&Entry> {
        self.map.get(key).filter(|e| e.is_live(now))
    }

    /// Counts one write and sweeps expired entries when the count rolls
    /// over.
    fn note_write(&mut self, now: Instant) {
        self.writes += 1;
        if self.writes >= SWEEP_EVERY {
            self.writes = 0;
            let before = self.map.len();
            self.map.retain(|_, e| e.is_live(now));
            tracing::trace!(dropped = before - self.map.len(), "swept expired entries");
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.inner.lock().await;
        entries.map.values().filter(|e| e.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remaining time to live of `key`.
    ///
    /// `None` if the key is absent; `Some(None)` if it never expires.
    pub async fn ttl(&self, key: &str) -> Option<Option<Duration>> {
        let now = Instant::now();
        let entries = self.inner.lock().await;
        let entry = entries.live(key, now)?;
        Some(entry.expires_at.map(|at| at.saturating_duration_since(now)))
    }
}

impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let mut entries = self.inner.lock().await;

        match entries.map.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.map.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut entries = self.inner.lock().await;

        if entries.live(key, now).is_some() {
            return Ok(false);
        }
        entries.note_write(now);
        entries.map.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(now + ttl),
            },
        );
        Ok(true)
    }

    async fn execute(&self, batch: Batch) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entries = self.inner.lock().await;
        entries.note_write(now);

        for command in batch {
            match command {
                Command::Set { key, value, ttl } => {
                    entries.map.insert(
                        key,
                        Entry {
                            value,
                            expires_at: ttl.map(|ttl| now + ttl),
                        },
                    );
                }
                Command::Del { key } => {
                    entries.map.remove(&key);
                }
                Command::DelReferenced { pointer, prefix } => {
                    let target = entries
                        .live(&pointer, now)
                        .map(|e| format!("{prefix}{}", e.value));
                    if let Some(target) = target {
                        entries.map.remove(&target);
                    }
                }
            }
        }
        Ok(())
    }
}
