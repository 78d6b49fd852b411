//! The user directory: what Gatehouse needs from the relational store.
//!
//! Gatehouse owns credentials, not users. Accounts, roles, team
//! memberships and API-key rows live in the caller's database, and the
//! caller exposes them through [`UserDirectory`]. The calls are kept
//! narrow so the core never writes anything else there.

use std::future::Future;

use gatehouse_authz::MembershipSource;
use gatehouse_protocol::{ApiKeyId, Role, UserId};

/// A failed directory call (database down, query error).
#[derive(Debug, thiserror::Error)]
#[error("user directory error: {0}")]
pub struct DirectoryError(pub String);

/// A user whose password checked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserAccount {
    pub user_id: UserId,
    pub role: Role,
}

/// Account lookups and API-key rows, plus team membership via the
/// [`MembershipSource`] supertrait.
pub trait UserDirectory: MembershipSource {
    /// Checks a username/password pair. `Ok(None)` means the credentials
    /// are wrong; the caller does not learn which half was.
    fn verify_login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<Option<UserAccount>, DirectoryError>> + Send;

    /// The current role of `user_id`, or `None` if there is no such user.
    fn user_role(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<Role>, DirectoryError>> + Send;

    /// Creates the relational row for a new API key and returns its id.
    fn create_api_key(
        &self,
        user_id: UserId,
        ttl_hours: u32,
    ) -> impl Future<Output = Result<ApiKeyId, DirectoryError>> + Send;

    /// Deletes the row of `key_id` if it belongs to `user_id`. Returns
    /// whether a row was deleted.
    fn delete_api_key(
        &self,
        user_id: UserId,
        key_id: ApiKeyId,
    ) -> impl Future<Output = Result<bool, DirectoryError>> + Send;
}
