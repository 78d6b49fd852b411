//! The gates and their decision procedure.

use gatehouse_protocol::{Identity, Role, TeamId, UserId};

use crate::{AuthzError, MembershipSource};

/// An authorization requirement attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Role must be at least `min`.
    Protect { min: Role },

    /// Role must be at least `min`, unless the caller is the target user.
    SelfOrRole { min: Role },

    /// Roles at or above `free_pass` always pass. Below `min` never pass.
    /// In between, the caller must be a member of the target team.
    Team { min: Role, free_pass: Role },
}

/// What a request is about, taken from its path parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Target {
    pub user_id: Option<UserId>,
    pub team_id: Option<TeamId>,
}

impl Gate {
    pub fn protect(min: Role) -> Self {
        Self::Protect { min }
    }

    pub fn self_or_role(min: Role) -> Self {
        Self::SelfOrRole { min }
    }

    pub fn team(min: Role, free_pass: Role) -> Self {
        Self::Team { min, free_pass }
    }

    /// Decides whether `identity` may access `target`.
    ///
    /// Checks run cheapest first and stop at the first decision, so the
    /// membership source is only consulted by [`Gate::Team`] for roles
    /// between `min` and `free_pass`.
    ///
    /// # Errors
    /// - [`AuthzError::Forbidden`] if the identity does not qualify.
    /// - [`AuthzError::MissingTarget`] if a team gate has no team id.
    /// - [`AuthzError::Membership`] if the lookup failed.
    pub async fn authorize<M: MembershipSource>(
        &self,
        identity: &Identity,
        target: &Target,
        membership: &M,
    ) -> Result<(), AuthzError> {
        match *self {
            Gate::Protect { min } => require(identity, min),

            Gate::SelfOrRole { min } => {
                if target.user_id == Some(identity.user_id) {
                    return Ok(());
                }
                require(identity, min)
            }

            Gate::Team { min, free_pass } => {
                if identity.role.at_least(free_pass) {
                    return Ok(());
                }
                require(identity, min)?;

                let team_id = target.team_id.ok_or(AuthzError::MissingTarget("team_id"))?;
                let is_member = membership
                    .team_member_exists(team_id, identity.user_id)
                    .await
                    .inspect_err(|e| {
                        tracing::warn!(%team_id, user_id = %identity.user_id, error = %e, "membership lookup failed");
                    })?;

                if is_member {
                    Ok(())
                } else {
                    tracing::debug!(%team_id, user_id = %identity.user_id, "not a team member");
                    Err(AuthzError::Forbidden)
                }
            }
        }
    }
}

/// Whether `actor` may act on a user holding `target_role` (force logout,
/// key management on someone else's behalf). Requires Admin, and the
/// target may not outrank the actor.
pub fn may_manage(actor: &Identity, target_role: Role) -> Result<(), AuthzError> {
    require(actor, Role::Admin)?;
    if target_role > actor.role {
        tracing::debug!(user_id = %actor.user_id, %target_role, "target outranks actor");
        return Err(AuthzError::Forbidden);
    }
    Ok(())
}

fn require(identity: &Identity, min: Role) -> Result<(), AuthzError> {
    if identity.role.at_least(min) {
        Ok(())
    } else {
        tracing::debug!(user_id = %identity.user_id, role = %identity.role, %min, "role too low");
        Err(AuthzError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_protocol::CredentialKind;

    use super::*;
    use crate::MembershipError;

    struct NoMembers;

    impl MembershipSource for NoMembers {
        async fn team_member_exists(&self, _: TeamId, _: UserId) -> Result<bool, MembershipError> {
            Ok(false)
        }
    }

    fn who(user: u64, role: Role) -> Identity {
        Identity {
            user_id: UserId(user),
            role,
            via: CredentialKind::Session,
        }
    }

    #[tokio::test]
    async fn test_protect_admin_rejects_teams_manager() {
        let gate = Gate::protect(Role::Admin);
        let target = Target::default();

        assert!(matches!(
            gate.authorize(&who(1, Role::TeamsManager), &target, &NoMembers).await,
            Err(AuthzError::Forbidden)
        ));
        assert!(gate.authorize(&who(1, Role::Admin), &target, &NoMembers).await.is_ok());
        assert!(gate.authorize(&who(1, Role::Master), &target, &NoMembers).await.is_ok());
    }

    #[tokio::test]
    async fn test_self_or_role_allows_self_below_min() {
        let gate = Gate::self_or_role(Role::Admin);
        let own = Target {
            user_id: Some(UserId(5)),
            team_id: None,
        };
        let other = Target {
            user_id: Some(UserId(6)),
            ..own
        };

        assert!(gate.authorize(&who(5, Role::Viewer), &own, &NoMembers).await.is_ok());
        assert!(matches!(
            gate.authorize(&who(5, Role::Viewer), &other, &NoMembers).await,
            Err(AuthzError::Forbidden)
        ));
        assert!(gate.authorize(&who(7, Role::Admin), &other, &NoMembers).await.is_ok());
    }

    #[tokio::test]
    async fn test_team_gate_without_team_id_is_missing_target() {
        let gate = Gate::team(Role::Viewer, Role::Master);
        assert!(matches!(
            gate.authorize(&who(1, Role::Viewer), &Target::default(), &NoMembers).await,
            Err(AuthzError::MissingTarget("team_id"))
        ));
    }

    #[test]
    fn test_may_manage_rules() {
        let admin = who(1, Role::Admin);
        assert!(may_manage(&admin, Role::Viewer).is_ok());
        assert!(may_manage(&admin, Role::Admin).is_ok());
        assert!(matches!(may_manage(&admin, Role::Master), Err(AuthzError::Forbidden)));
        assert!(matches!(
            may_manage(&who(2, Role::TeamsManager), Role::Viewer),
            Err(AuthzError::Forbidden)
        ));
        assert!(may_manage(&who(3, Role::Master), Role::Master).is_ok());
    }
}
