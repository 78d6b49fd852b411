//! Error types for the protocol layer.
//!
//! Each crate in Gatehouse defines its own error enum. When you see a
//! `ProtocolError`, the problem is in how a credential record was
//! represented, not in the store or in the authorization decision.

/// Errors that can occur while encoding or decoding credential records.
///
/// A decode failure means the stored payload is corrupted or was written
/// by an incompatible version. Callers must treat it as a hard failure and
/// never fall back to a default record.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a record into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (malformed JSON, missing fields, wrong types).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload parsed but does not describe a valid record, e.g. a
    /// compact session value without the `=` separator.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The record was written with a version this build does not read.
    #[error("unsupported record version {0}")]
    UnsupportedVersion(u8),

    /// A role level outside `1..=4`.
    #[error("unknown role level {0}")]
    UnknownRole(u8),
}
