//! Identity and record types.
//!
//! Records are what the key-value store keeps behind a secret token. The
//! store is their only owner; the application never keeps a durable copy.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ProtocolError, Role};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A user's id in the relational store.
///
/// Newtype over `u64` so a `UserId` can never be passed where an
/// [`ApiKeyId`] or [`TeamId`] is expected. `#[serde(transparent)]` keeps
/// the wire form a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// An API key's id, assigned by the relational store before issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKeyId(pub u64);

impl fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "K-{}", self.0)
    }
}

/// A team's id in the relational store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// What a session token resolves to.
///
/// Stored in the compact `userId=role` form (two integers joined by `=`),
/// e.g. user 42 with role Admin is `42=3`. The format is fixed; new fields
/// belong in a record with a tagged encoding like [`ApiKeyRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub role: Role,
}

impl SessionRecord {
    /// Encodes the record as `userId=role`.
    pub fn to_compact(&self) -> String {
        format!("{}={}", self.user_id.0, self.role.level())
    }

    /// Parses the `userId=role` form.
    ///
    /// # Errors
    /// - [`ProtocolError::InvalidRecord`] if the separator is missing or
    ///   either side is not an unsigned integer.
    /// - [`ProtocolError::UnknownRole`] if the role level is out of range.
    pub fn from_compact(raw: &str) -> Result<Self, ProtocolError> {
        let (user, role) = raw.split_once('=').ok_or_else(|| {
            ProtocolError::InvalidRecord(format!("missing '=' in session value {raw:?}"))
        })?;

        let user_id = user.parse::<u64>().map_err(|e| {
            ProtocolError::InvalidRecord(format!("bad user id {user:?}: {e}"))
        })?;
        let level = role.parse::<u8>().map_err(|e| {
            ProtocolError::InvalidRecord(format!("bad role level {role:?}: {e}"))
        })?;

        Ok(Self {
            user_id: UserId(user_id),
            role: Role::from_level(level)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ApiKeyRecord
// ---------------------------------------------------------------------------

/// What an API key token resolves to.
///
/// The role is a snapshot of the owner's role at issuance; it is not
/// refreshed until the key is reissued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub id: ApiKeyId,
    pub user_id: UserId,
    pub role: Role,
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Which kind of credential produced an [`Identity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialKind {
    /// A login session cookie.
    Session,
    /// An API key, with its id.
    ApiKey { id: ApiKeyId },
}

/// An authenticated caller, resolved from a validated credential.
///
/// This is the only place authorization reads a role from. Roles carried
/// in request bodies or query strings are never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
    pub via: CredentialKind,
}

impl From<SessionRecord> for Identity {
    fn from(record: SessionRecord) -> Self {
        Self {
            user_id: record.user_id,
            role: record.role,
            via: CredentialKind::Session,
        }
    }
}

impl From<ApiKeyRecord> for Identity {
    fn from(record: ApiKeyRecord) -> Self {
        Self {
            user_id: record.user_id,
            role: record.role,
            via: CredentialKind::ApiKey { id: record.id },
        }
    }
}
