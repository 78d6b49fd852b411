use std::time::Duration;

/// Errors that can occur talking to the credential store.
///
/// None of these mean "the credential is invalid". A store failure is
/// always surfaced as an internal error, never as a missing record.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached, or the connection dropped mid-call.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with an error reply (bad command, wrong type).
    #[error("store rejected command: {0}")]
    Rejected(String),

    /// The call did not complete within the configured deadline.
    #[error("store call {op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
}

impl StoreError {
    /// Returns `true` if repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout { .. })
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_dropped()
            || err.is_connection_refusal()
            || err.is_timeout()
        {
            Self::Unavailable(err.to_string())
        } else {
            Self::Rejected(err.to_string())
        }
    }
}
