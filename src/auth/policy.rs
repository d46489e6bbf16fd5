//! Authorization policy: pure decision functions over the principal and the
//! target resource's ownership attributes. No I/O happens here; orchestration
//! maps every denial to the error taxonomy.

use uuid::Uuid;

use crate::auth::principal::Principal;
use crate::types::Role;

/// Rank comparison against the role hierarchy (GUEST < USER < MANAGER < ADMIN)
pub fn has_role(principal: &Principal, required: Role) -> bool {
    principal.role.rank() >= required.rank()
}

pub fn can_create_team(principal: &Principal) -> bool {
    has_role(principal, Role::Admin)
}

pub fn can_manage_team(principal: &Principal) -> bool {
    has_role(principal, Role::Admin)
}

/// How the owning team is resolved when creating a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectTeamResolution {
    /// MANAGER: the project lands in the manager's own team
    FromOwnTeam,
    /// ADMIN: a team code supplied in the request names the team
    FromTeamCode,
    Denied,
}

pub fn can_create_project(principal: &Principal) -> ProjectTeamResolution {
    match principal.role {
        Role::Admin => ProjectTeamResolution::FromTeamCode,
        Role::Manager => ProjectTeamResolution::FromOwnTeam,
        Role::User | Role::Guest => ProjectTeamResolution::Denied,
    }
}

/// Task creation requires MANAGER or above; a MANAGER is further confined to
/// projects of their own team.
pub fn can_create_task(principal: &Principal, project_team_id: Uuid) -> bool {
    if !has_role(principal, Role::Manager) {
        return false;
    }
    if principal.role == Role::Manager {
        return principal.team_id == Some(project_team_id);
    }
    true
}

/// A task assignee must be an ADMIN or a member of the project's team
pub fn can_assign_task_to(
    candidate_role: Role,
    candidate_team_id: Option<Uuid>,
    project_team_id: Uuid,
) -> bool {
    candidate_role == Role::Admin || candidate_team_id == Some(project_team_id)
}

/// ADMIN may view any team's members; everyone else only their own team's
pub fn can_view_team_members(principal: &Principal, team_id: Uuid) -> bool {
    if has_role(principal, Role::Admin) {
        return true;
    }
    principal.team_id == Some(team_id)
}

/// Outcome of the role-assignment authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAssignDecision {
    Allowed,
    NotAdmin,
    /// Self-role-change is forbidden regardless of the admin count rules
    SelfChange,
}

pub fn can_assign_role(principal: &Principal, target_user_id: Uuid) -> RoleAssignDecision {
    if !has_role(principal, Role::Admin) {
        return RoleAssignDecision::NotAdmin;
    }
    if principal.id == target_user_id {
        return RoleAssignDecision::SelfChange;
    }
    RoleAssignDecision::Allowed
}

/// Scoping filter applied to the user listing. Query filters supplied by the
/// caller are ANDed on top of this, never substituted for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserListScope {
    /// ADMIN: no scope restriction
    All,
    /// MANAGER: own team members, plus USER-role rows from anywhere.
    /// Other teams' managers and admins stay invisible.
    TeamOrUsers { team_id: Uuid },
    /// USER/GUEST: own team only, ADMIN rows excluded
    TeamExcludingAdmins { team_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeDenied {
    ManagerWithoutTeam,
    UserWithoutTeam,
}

pub fn scope_user_list(principal: &Principal) -> Result<UserListScope, ScopeDenied> {
    match principal.role {
        Role::Admin => Ok(UserListScope::All),
        Role::Manager => principal
            .team_id
            .map(|team_id| UserListScope::TeamOrUsers { team_id })
            .ok_or(ScopeDenied::ManagerWithoutTeam),
        Role::User | Role::Guest => principal
            .team_id
            .map(|team_id| UserListScope::TeamExcludingAdmins { team_id })
            .ok_or(ScopeDenied::UserWithoutTeam),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn principal(role: Role, team_id: Option<Uuid>) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            role,
            team_id,
            created_at: Utc::now(),
        }
    }

    const ROLES: [Role; 4] = [Role::Guest, Role::User, Role::Manager, Role::Admin];

    #[test]
    fn has_role_matches_rank_comparison_for_all_pairs() {
        for actual in ROLES {
            for required in ROLES {
                let p = principal(actual, None);
                assert_eq!(
                    has_role(&p, required),
                    actual.rank() >= required.rank(),
                    "actual={:?} required={:?}",
                    actual,
                    required
                );
            }
        }
    }

    #[test]
    fn only_admins_create_and_manage_teams() {
        assert!(can_create_team(&principal(Role::Admin, None)));
        assert!(!can_create_team(&principal(Role::Manager, None)));
        assert!(!can_create_team(&principal(Role::User, None)));
        assert!(can_manage_team(&principal(Role::Admin, None)));
        assert!(!can_manage_team(&principal(Role::Guest, None)));
    }

    #[test]
    fn project_team_resolution_per_role() {
        let team = Uuid::new_v4();
        assert_eq!(
            can_create_project(&principal(Role::Admin, None)),
            ProjectTeamResolution::FromTeamCode
        );
        assert_eq!(
            can_create_project(&principal(Role::Manager, Some(team))),
            ProjectTeamResolution::FromOwnTeam
        );
        assert_eq!(
            can_create_project(&principal(Role::User, Some(team))),
            ProjectTeamResolution::Denied
        );
        assert_eq!(
            can_create_project(&principal(Role::Guest, None)),
            ProjectTeamResolution::Denied
        );
    }

    #[test]
    fn managers_create_tasks_only_in_their_own_team() {
        let team_a = Uuid::new_v4();
        let team_b = Uuid::new_v4();

        assert!(can_create_task(&principal(Role::Manager, Some(team_a)), team_a));
        assert!(!can_create_task(&principal(Role::Manager, Some(team_a)), team_b));
        assert!(!can_create_task(&principal(Role::Manager, None), team_a));
        // Admins are not team-confined
        assert!(can_create_task(&principal(Role::Admin, None), team_b));
        assert!(!can_create_task(&principal(Role::User, Some(team_a)), team_a));
    }

    #[test]
    fn assignee_must_be_admin_or_project_team_member() {
        let team_a = Uuid::new_v4();
        let team_b = Uuid::new_v4();

        assert!(can_assign_task_to(Role::Admin, None, team_a));
        assert!(can_assign_task_to(Role::Admin, Some(team_b), team_a));
        assert!(can_assign_task_to(Role::User, Some(team_a), team_a));
        assert!(!can_assign_task_to(Role::User, Some(team_b), team_a));
        assert!(!can_assign_task_to(Role::Manager, None, team_a));
    }

    #[test]
    fn team_member_visibility_is_team_scoped() {
        let team_a = Uuid::new_v4();
        let team_b = Uuid::new_v4();

        assert!(can_view_team_members(&principal(Role::Admin, None), team_a));
        assert!(can_view_team_members(&principal(Role::Manager, Some(team_a)), team_a));
        assert!(!can_view_team_members(&principal(Role::Manager, Some(team_b)), team_a));
        assert!(can_view_team_members(&principal(Role::User, Some(team_a)), team_a));
        assert!(!can_view_team_members(&principal(Role::User, None), team_a));
        assert!(!can_view_team_members(&principal(Role::Guest, Some(team_b)), team_a));
    }

    #[test]
    fn role_assignment_requires_admin_and_forbids_self() {
        let admin = principal(Role::Admin, None);
        assert_eq!(
            can_assign_role(&admin, Uuid::new_v4()),
            RoleAssignDecision::Allowed
        );
        assert_eq!(can_assign_role(&admin, admin.id), RoleAssignDecision::SelfChange);
        assert_eq!(
            can_assign_role(&principal(Role::Manager, None), Uuid::new_v4()),
            RoleAssignDecision::NotAdmin
        );
    }

    #[test]
    fn user_list_scope_per_role() {
        let team = Uuid::new_v4();

        assert_eq!(
            scope_user_list(&principal(Role::Admin, None)),
            Ok(UserListScope::All)
        );
        assert_eq!(
            scope_user_list(&principal(Role::Manager, Some(team))),
            Ok(UserListScope::TeamOrUsers { team_id: team })
        );
        assert_eq!(
            scope_user_list(&principal(Role::User, Some(team))),
            Ok(UserListScope::TeamExcludingAdmins { team_id: team })
        );
        assert_eq!(
            scope_user_list(&principal(Role::Guest, Some(team))),
            Ok(UserListScope::TeamExcludingAdmins { team_id: team })
        );
    }

    #[test]
    fn user_list_scope_denied_without_team() {
        assert_eq!(
            scope_user_list(&principal(Role::Manager, None)),
            Err(ScopeDenied::ManagerWithoutTeam)
        );
        assert_eq!(
            scope_user_list(&principal(Role::User, None)),
            Err(ScopeDenied::UserWithoutTeam)
        );
    }
}
