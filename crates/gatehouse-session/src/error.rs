//! Error types for the session layer.

use gatehouse_protocol::ProtocolError;
use gatehouse_store::StoreError;

/// Errors that can occur while issuing, validating, or revoking
/// credentials.
///
/// Only [`CredentialError::NotFound`] means "this secret is not valid".
/// Every other variant is an internal failure and must never be reported
/// to a client as a bad credential.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// No record exists for the presented token: it was never issued, was
    /// revoked, or expired in the store.
    #[error("credential not found")]
    NotFound,

    /// The stored record could not be parsed. This is corruption, not an
    /// invalid credential, and is never replaced by a default record.
    #[error("stored credential is corrupted: {0}")]
    Decode(#[from] ProtocolError),

    /// The store could not be reached or answered with an error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A new secret could not be generated.
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Errors from the token generator.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The operating system's random source failed. Fatal to the request
    /// that needed the token; retrying in a loop will not help.
    #[error("secure random source failed: {0}")]
    Generation(String),
}
