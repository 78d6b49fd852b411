//! The role model: four ordered privilege tiers.
//!
//! Every authorization decision in Gatehouse is a comparison between two
//! [`Role`] values. Roles are a closed enum rather than bare integers so
//! that nothing can be compared against an unvalidated number by accident:
//! the only way to get a `Role` out of untrusted input is
//! [`Role::from_level`], and the gates only ever read roles from validated
//! session or API-key records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// A privilege tier, strictly ordered:
///
/// ```text
/// Viewer < TeamsManager < Admin < Master
/// ```
///
/// `PartialOrd`/`Ord` are derived, which orders variants by declaration
/// order. The explicit discriminants are the levels persisted in the store.
///
/// On the wire (inside API-key records) a role is its integer level:
/// `#[serde(into = "u8", try_from = "u8")]` routes serialization through
/// the `From`/`TryFrom` impls below.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum Role {
    /// Read-only access.
    Viewer = 1,
    /// May manage the teams they belong to.
    TeamsManager = 2,
    /// May manage users and force their logout.
    Admin = 3,
    /// Unrestricted.
    Master = 4,
}

impl Role {
    /// All roles, lowest first.
    pub const ALL: [Role; 4] =
        [Role::Viewer, Role::TeamsManager, Role::Admin, Role::Master];

    /// The persisted integer level (1 through 4).
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Parses a persisted level.
    ///
    /// # Errors
    /// Returns [`ProtocolError::UnknownRole`] for anything outside `1..=4`.
    pub fn from_level(level: u8) -> Result<Self, ProtocolError> {
        match level {
            1 => Ok(Self::Viewer),
            2 => Ok(Self::TeamsManager),
            3 => Ok(Self::Admin),
            4 => Ok(Self::Master),
            other => Err(ProtocolError::UnknownRole(other)),
        }
    }

    /// Returns `true` if this role grants at least the privileges of `min`.
    pub fn at_least(self, min: Role) -> bool {
        self >= min
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        role.level()
    }
}

impl TryFrom<u8> for Role {
    type Error = ProtocolError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::from_level(level)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Viewer => write!(f, "Viewer"),
            Self::TeamsManager => write!(f, "TeamsManager"),
            Self::Admin => write!(f, "Admin"),
            Self::Master => write!(f, "Master"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_order_is_total_and_strict() {
        assert!(Role::Viewer < Role::TeamsManager);
        assert!(Role::TeamsManager < Role::Admin);
        assert!(Role::Admin < Role::Master);

        let mut shuffled = vec![Role::Admin, Role::Viewer, Role::Master, Role::TeamsManager];
        shuffled.sort();
        assert_eq!(shuffled, Role::ALL.to_vec());
    }

    #[test]
    fn test_role_at_least() {
        assert!(Role::Admin.at_least(Role::Admin));
        assert!(Role::Master.at_least(Role::Admin));
        assert!(!Role::TeamsManager.at_least(Role::Admin));
        assert!(Role::Viewer.at_least(Role::Viewer));
    }

    #[test]
    fn test_from_level_accepts_known_levels() {
        for role in Role::ALL {
            assert_eq!(Role::from_level(role.level()).unwrap(), role);
        }
        assert_eq!(Role::Viewer.level(), 1);
        assert_eq!(Role::Master.level(), 4);
    }

    #[test]
    fn test_from_level_rejects_unknown_levels() {
        assert!(matches!(Role::from_level(0), Err(ProtocolError::UnknownRole(0))));
        assert!(matches!(Role::from_level(5), Err(ProtocolError::UnknownRole(5))));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_role_serializes_as_level() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "3");
        let parsed: Role = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, Role::TeamsManager);
        assert!(serde_json::from_str::<Role>("9").is_err());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::TeamsManager.to_string(), "TeamsManager");
    }
}
