//! Shared vocabulary for Gatehouse.
//!
//! This crate defines the types every other layer speaks:
//!
//! - **Identity types** ([`UserId`], [`ApiKeyId`], [`TeamId`], [`Identity`]) —
//!   who is making a request and how they proved it.
//! - **Role model** ([`Role`]) — the four ordered privilege tiers.
//! - **Records** ([`SessionRecord`], [`ApiKeyRecord`]) — what the key-value
//!   store keeps behind each secret token.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how records become bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while decoding.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about the store, HTTP, or sessions. It
//! only knows how credentials are represented.
//!
//! ```text
//! Store (strings) → Protocol (records) → Session (managers) → HTTP (gates)
//! ```

mod codec;
mod error;
mod role;
mod types;

pub use codec::{Codec, RECORD_VERSION, decode_record, encode_record};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use role::Role;
pub use types::{
    ApiKeyId, ApiKeyRecord, CredentialKind, Identity, SessionRecord, TeamId,
    UserId,
};
