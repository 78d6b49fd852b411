//! The team-membership contract.

use std::future::Future;
use std::sync::Arc;

use gatehouse_protocol::{TeamId, UserId};

use crate::MembershipError;

/// Answers "is this user a member of this team?".
///
/// Gatehouse never stores memberships; the relational store is the
/// authority and the caller implements this trait on top of it.
pub trait MembershipSource: Send + Sync + 'static {
    fn team_member_exists(
        &self,
        team_id: TeamId,
        user_id: UserId,
    ) -> impl Future<Output = Result<bool, MembershipError>> + Send;
}

impl<M: MembershipSource> MembershipSource for Arc<M> {
    fn team_member_exists(
        &self,
        team_id: TeamId,
        user_id: UserId,
    ) -> impl Future<Output = Result<bool, MembershipError>> + Send {
        (**self).team_member_exists(team_id, user_id)
    }
}
