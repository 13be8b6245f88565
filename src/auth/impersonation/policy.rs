//! The impersonation predicate.
//!
//! Pure functions over two principals. The same check gates the button in
//! the user list and the start transition.

use serde::Serialize;
use std::fmt;

use crate::identity::Principal;
use crate::rbac::Permission;

/// Why an impersonation attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    SelfImpersonation,
    MissingPermission,
    /// Target ranks equal to or above the actor.
    InsufficientRank,
    TargetInactive,
    /// The session is already impersonating someone.
    AlreadyImpersonating,
}

impl DenialReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelfImpersonation => "self_impersonation",
            Self::MissingPermission => "missing_permission",
            Self::InsufficientRank => "insufficient_rank",
            Self::TargetInactive => "target_inactive",
            Self::AlreadyImpersonating => "already_impersonating",
        }
    }

    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::SelfImpersonation => "Cannot impersonate yourself",
            Self::MissingPermission => "You are not allowed to impersonate users",
            Self::InsufficientRank => "Cannot impersonate a user with an equal or higher role",
            Self::TargetInactive => "Cannot impersonate an inactive user",
            Self::AlreadyImpersonating => "Leave the current impersonation first",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide whether `actor` may impersonate `target`, naming the first rule
/// that fails.
pub fn check(actor: &Principal, target: &Principal) -> Result<(), DenialReason> {
    if actor.id == target.id {
        return Err(DenialReason::SelfImpersonation);
    }
    if !actor.has_permission(Permission::ImpersonateUsers) {
        return Err(DenialReason::MissingPermission);
    }
    if target.rank() >= actor.rank() {
        return Err(DenialReason::InsufficientRank);
    }
    if !target.is_active() {
        return Err(DenialReason::TargetInactive);
    }
    Ok(())
}

#[must_use]
pub fn can_impersonate(actor: &Principal, target: &Principal) -> bool {
    check(actor, target).is_ok()
}

/// How the impersonate action is offered for one row of the user list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpersonationAffordance {
    Enabled,
    Disabled,
    Hidden,
}

/// Affordance for `target` as seen by `viewer`.
///
/// Hidden on the viewer's own row and while the viewer is already
/// impersonating; otherwise follows [`can_impersonate`].
#[must_use]
pub fn affordance(
    viewer: &Principal,
    target: &Principal,
    viewer_is_impersonating: bool,
) -> ImpersonationAffordance {
    if viewer.id == target.id || viewer_is_impersonating {
        ImpersonationAffordance::Hidden
    } else if can_impersonate(viewer, target) {
        ImpersonationAffordance::Enabled
    } else {
        ImpersonationAffordance::Disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PrincipalStatus;
    use crate::rbac::Role;

    fn principal(id: &str, role: Option<Role>) -> Principal {
        let p = Principal::new(id, format!("User {id}"));
        match role {
            Some(r) => p.with_role(r),
            None => p,
        }
    }

    #[test]
    fn test_self_impersonation_always_denied() {
        for role in [Some(Role::SuperAdmin), Some(Role::Admin), Some(Role::User), None] {
            let p = principal("1", role);
            assert_eq!(check(&p, &p), Err(DenialReason::SelfImpersonation));
        }
    }

    #[test]
    fn test_admin_cannot_impersonate_peers_or_superiors() {
        let admin = principal("1", Some(Role::Admin));
        let other_admin = principal("2", Some(Role::Admin));
        let root = principal("3", Some(Role::SuperAdmin));

        assert_eq!(check(&admin, &other_admin), Err(DenialReason::InsufficientRank));
        assert_eq!(check(&admin, &root), Err(DenialReason::InsufficientRank));
        assert!(can_impersonate(&admin, &principal("4", Some(Role::User))));
    }

    #[test]
    fn test_super_admin_reaches_every_lower_rank() {
        let root = principal("1", Some(Role::SuperAdmin));
        assert!(can_impersonate(&root, &principal("2", Some(Role::Admin))));
        assert!(can_impersonate(&root, &principal("3", Some(Role::User))));
        assert!(can_impersonate(&root, &principal("4", None)));
        assert!(!can_impersonate(&root, &principal("5", Some(Role::SuperAdmin))));
    }

    #[test]
    fn test_user_lacks_permission() {
        let user = principal("1", Some(Role::User));
        assert_eq!(
            check(&user, &principal("2", None)),
            Err(DenialReason::MissingPermission)
        );
    }

    #[test]
    fn test_direct_grant_still_needs_rank() {
        let helper = principal("1", Some(Role::User)).with_permission(Permission::ImpersonateUsers);
        assert!(can_impersonate(&helper, &principal("2", None)));
        assert_eq!(
            check(&helper, &principal("3", Some(Role::User))),
            Err(DenialReason::InsufficientRank)
        );
    }

    #[test]
    fn test_inactive_targets_denied() {
        let root = principal("1", Some(Role::SuperAdmin));
        for status in [
            PrincipalStatus::Inactive,
            PrincipalStatus::Suspended,
            PrincipalStatus::Deleted,
        ] {
            let target = principal("2", Some(Role::User)).with_status(status);
            assert_eq!(check(&root, &target), Err(DenialReason::TargetInactive));
        }
    }

    #[test]
    fn test_affordance() {
        let admin = principal("1", Some(Role::Admin));
        let user = principal("2", Some(Role::User));
        let root = principal("3", Some(Role::SuperAdmin));

        assert_eq!(affordance(&admin, &admin, false), ImpersonationAffordance::Hidden);
        assert_eq!(affordance(&admin, &user, false), ImpersonationAffordance::Enabled);
        assert_eq!(affordance(&admin, &root, false), ImpersonationAffordance::Disabled);
        assert_eq!(affordance(&admin, &user, true), ImpersonationAffordance::Hidden);
        assert_eq!(affordance(&user, &admin, false), ImpersonationAffordance::Disabled);
    }
}
