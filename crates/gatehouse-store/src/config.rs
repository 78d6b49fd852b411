//! Store connection settings and the per-call deadline/retry policy.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Configuration for talking to the key-value store.
///
/// Every field has a default, so a config file only needs the fields it
/// changes (`#[serde(default)]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Connection URL, e.g. `redis://127.0.0.1:6379/0`.
    pub url: String,

    /// Deadline for a single store call, in milliseconds. A call that
    /// exceeds it is abandoned and reported as [`StoreError::Timeout`].
    pub timeout_ms: u64,

    /// Extra attempts for idempotent calls after a retryable failure.
    /// 0 disables retries.
    pub retries: u32,

    /// Pause between attempts, in milliseconds.
    pub retry_backoff_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            timeout_ms: 250,
            retries: 2,
            retry_backoff_ms: 20,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Runs one store call under `config`'s deadline, retrying if allowed.
///
/// `call` is invoked once per attempt and must build a fresh future each
/// time. Only `idempotent` calls are retried, and only after a retryable
/// error ([`StoreError::is_retryable`]); an insert-if-absent must never be
/// retried because a lost reply would turn a win into a loss.
pub async fn with_deadline<T, F, Fut>(
    config: &StoreConfig,
    op: &'static str,
    idempotent: bool,
    mut call: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let attempts = if idempotent { config.retries + 1 } else { 1 };
    let mut attempt = 0;

    loop {
        attempt += 1;
        let outcome = match tokio::time::timeout(config.timeout(), call()).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                op,
                after: config.timeout(),
            }),
        };

        match outcome {
            Err(e) if e.is_retryable() && attempt < attempts => {
                tracing::warn!(op, attempt, error = %e, "store call failed, retrying");
                tokio::time::sleep(config.retry_backoff()).await;
            }
            Err(e) => {
                tracing::error!(op, attempt, error = %e, "store call failed");
                return Err(e);
            }
            ok => return ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn config(retries: u32) -> StoreConfig {
        StoreConfig {
            timeout_ms: 50,
            retries,
            retry_backoff_ms: 1,
            ..StoreConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_slow_call_times_out() {
        let result: Result<(), _> = with_deadline(&config(0), "GET", true, || async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(StoreError::Timeout { op: "GET", .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_retries_idempotent_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = with_deadline(&config(2), "GET", true, || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(StoreError::Unavailable("connection reset".into()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_gives_up_after_configured_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), _> = with_deadline(&config(1), "EXEC", true, || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Unavailable("down".into()))
            }
        })
        .await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_never_retries_non_idempotent() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<bool, _> = with_deadline(&config(5), "SET NX", false, || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Unavailable("down".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_deadline_does_not_retry_rejections() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), _> = with_deadline(&config(3), "GET", true, || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Rejected("WRONGTYPE".into()))
            }
        })
        .await;

        assert!(matches!(result, Err(StoreError::Rejected(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_store_config_default_values() {
        let config = StoreConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(250));
        assert_eq!(config.retries, 2);
    }
}
