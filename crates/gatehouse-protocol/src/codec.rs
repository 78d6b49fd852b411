//! Codec trait and the versioned record envelope.
//!
//! A codec converts between Rust types and raw bytes. Records with more
//! than two fields (API keys) are never stored as delimited strings: they
//! go through a [`Codec`] wrapped in a small envelope that carries a
//! version tag, so fields can be added later without parser ambiguity.
//!
//! ```text
//! ApiKeyRecord { id: 7, user_id: 42, role: Admin }
//!     → {"v":1,"id":7,"user_id":42,"role":3}
//! ```

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// The record envelope version written by this build.
pub const RECORD_VERSION: u8 = 1;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because managers holding a codec are shared
/// across request tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns a [`ProtocolError`] if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns a [`ProtocolError`] if the bytes are malformed or do not
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON is a tagged text encoding: every field is named, so decoding never
/// depends on field position. Stored values stay readable with
/// `redis-cli GET`, which helps when debugging a revoked key.
///
/// ## Example
///
/// ```rust
/// use gatehouse_protocol::{ApiKeyId, ApiKeyRecord, JsonCodec, Role, UserId};
/// use gatehouse_protocol::{decode_record, encode_record};
///
/// let record = ApiKeyRecord { id: ApiKeyId(7), user_id: UserId(42), role: Role::Admin };
/// let stored = encode_record(&JsonCodec, &record).unwrap();
/// let back: ApiKeyRecord = decode_record(&JsonCodec, &stored).unwrap();
/// assert_eq!(back, record);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// Versioned envelope
// ---------------------------------------------------------------------------

/// Borrowing form used on the encode path.
#[derive(Serialize)]
struct VersionedRef<'a, T> {
    v: u8,
    #[serde(flatten)]
    record: &'a T,
}

/// Owning form used on the decode path.
#[derive(Deserialize)]
struct Versioned<T> {
    v: u8,
    #[serde(flatten)]
    record: T,
}

/// Encodes `record` inside a version-tagged envelope, as a store value.
///
/// # Errors
/// Propagates codec errors; returns [`ProtocolError::InvalidRecord`] if the
/// codec produced bytes that are not UTF-8 (store values are strings).
pub fn encode_record<C, T>(codec: &C, record: &T) -> Result<String, ProtocolError>
where
    C: Codec,
    T: Serialize,
{
    let bytes = codec.encode(&VersionedRef {
        v: RECORD_VERSION,
        record,
    })?;
    String::from_utf8(bytes)
        .map_err(|e| ProtocolError::InvalidRecord(format!("codec output is not UTF-8: {e}")))
}

/// Decodes a store value written by [`encode_record`].
///
/// # Errors
/// - Codec errors for malformed payloads.
/// - [`ProtocolError::UnsupportedVersion`] if the envelope version is not
///   [`RECORD_VERSION`].
pub fn decode_record<C, T>(codec: &C, stored: &str) -> Result<T, ProtocolError>
where
    C: Codec,
    T: DeserializeOwned,
{
    let envelope: Versioned<T> = codec.decode(stored.as_bytes())?;
    if envelope.v != RECORD_VERSION {
        return Err(ProtocolError::UnsupportedVersion(envelope.v));
    }
    Ok(envelope.record)
}
