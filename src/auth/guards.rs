//! Domain invariant guards expressed over plain data, so the check-then-act
//! bodies are unit-testable without a database. The transactional context
//! (advisory lock + consistent admin count) is the caller's responsibility.

use crate::types::Role;

/// Typed outcome of the role-reassignment invariant check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChangeViolation {
    /// Promoting would exceed the configured ADMIN ceiling
    AdminCeilingExceeded,
    /// Demoting would leave the system without any ADMIN
    LastAdminProtected,
}

/// Role reassignment guard. `admin_count` must be observed inside the same
/// transaction that applies the update.
pub fn check_role_change(
    target_current_role: Role,
    new_role: Role,
    admin_count: i64,
    max_admins: i64,
) -> Result<(), RoleChangeViolation> {
    if new_role == Role::Admin && admin_count >= max_admins {
        return Err(RoleChangeViolation::AdminCeilingExceeded);
    }
    if target_current_role == Role::Admin && new_role != Role::Admin && admin_count <= 1 {
        return Err(RoleChangeViolation::LastAdminProtected);
    }
    Ok(())
}

/// Role granted at registration: the first user in an empty system becomes
/// ADMIN, every later registration yields USER regardless of input.
pub fn registration_role(user_count: i64) -> Role {
    if user_count == 0 {
        Role::Admin
    } else {
        Role::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_fails_at_the_admin_ceiling() {
        assert_eq!(
            check_role_change(Role::User, Role::Admin, 3, 3),
            Err(RoleChangeViolation::AdminCeilingExceeded)
        );
        assert_eq!(
            check_role_change(Role::User, Role::Admin, 4, 3),
            Err(RoleChangeViolation::AdminCeilingExceeded)
        );
    }

    #[test]
    fn promotion_succeeds_below_the_ceiling() {
        assert_eq!(check_role_change(Role::User, Role::Admin, 2, 3), Ok(()));
        assert_eq!(check_role_change(Role::Guest, Role::Admin, 0, 3), Ok(()));
    }

    #[test]
    fn demoting_the_last_admin_fails() {
        assert_eq!(
            check_role_change(Role::Admin, Role::Manager, 1, 3),
            Err(RoleChangeViolation::LastAdminProtected)
        );
        assert_eq!(
            check_role_change(Role::Admin, Role::User, 0, 3),
            Err(RoleChangeViolation::LastAdminProtected)
        );
    }

    #[test]
    fn demotion_succeeds_with_another_admin_left() {
        assert_eq!(check_role_change(Role::Admin, Role::User, 2, 3), Ok(()));
    }

    #[test]
    fn lateral_changes_below_admin_are_unconstrained() {
        assert_eq!(check_role_change(Role::User, Role::Manager, 3, 3), Ok(()));
        assert_eq!(check_role_change(Role::Manager, Role::Guest, 1, 3), Ok(()));
    }

    #[test]
    fn first_registration_is_admin_rest_are_users() {
        assert_eq!(registration_role(0), Role::Admin);
        assert_eq!(registration_role(1), Role::User);
        assert_eq!(registration_role(42), Role::User);
    }
}
