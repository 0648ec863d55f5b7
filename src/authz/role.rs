use std::fmt;

use uuid::Uuid;

use super::AuthzError;
use crate::models::{Account, Role};

/// A fixed set of roles, usable in `const` position.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleSet(u8);

/// Staff roles: may manage companies, tags and role assignments, and see every record.
pub const STAFF: RoleSet = RoleSet::of(&[Role::Admin, Role::Spoc]);

/// Moderation roles: may verify records and work the unverified queues.
pub const MODERATORS: RoleSet = RoleSet::of(&[Role::Admin, Role::Spoc, Role::Pr]);

impl RoleSet {
    pub const EMPTY: RoleSet = RoleSet(0);

    pub const fn of(roles: &[Role]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < roles.len() {
            bits |= Self::bit(roles[i]);
            i += 1;
        }
        RoleSet(bits)
    }

    const fn bit(role: Role) -> u8 {
        match role {
            Role::Student => 1,
            Role::Spoc => 1 << 1,
            Role::Pr => 1 << 2,
            Role::Admin => 1 << 3,
        }
    }

    pub const fn contains(self, role: Role) -> bool {
        self.0 & Self::bit(role) != 0
    }

    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |r| self.contains(*r))
    }

    /// Fail with `AccessDenied` unless the actor holds one of the roles.
    pub fn require(self, actor: &Actor) -> Result<(), AuthzError> {
        if self.contains(actor.role) {
            Ok(())
        } else {
            Err(AuthzError::access_denied(format!(
                "This action requires one of the roles: {self}"
            )))
        }
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|r| r.as_str()).collect();
        f.write_str(&names.join(", "))
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// The authenticated account behind a request, as the policy sees it.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub email: String,
}

impl Actor {
    pub fn is(&self, roles: RoleSet) -> bool {
        roles.contains(self.role)
    }
}

impl From<&Account> for Actor {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            role: account.role,
            email: account.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn actor(role: Role) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
            email: "someone@college.edu".into(),
        }
    }

    #[rstest]
    #[case::student(Role::Student, false, false)]
    #[case::pr(Role::Pr, false, true)]
    #[case::spoc(Role::Spoc, true, true)]
    #[case::admin(Role::Admin, true, true)]
    fn test_named_sets(#[case] role: Role, #[case] staff: bool, #[case] moderator: bool) {
        assert_eq!(STAFF.contains(role), staff);
        assert_eq!(MODERATORS.contains(role), moderator);
        assert_eq!(STAFF.require(&actor(role)).is_ok(), staff);
    }

    #[test]
    fn test_empty_set_contains_nothing() {
        assert!(Role::ALL.iter().all(|r| !RoleSet::EMPTY.contains(*r)));
    }

    #[test]
    fn test_display_lists_roles_in_canonical_order() {
        assert_eq!(MODERATORS.to_string(), "spoc, pr, admin");
    }

    #[test]
    fn test_require_error_names_roles() {
        let err = STAFF.require(&actor(Role::Pr)).unwrap_err();
        assert!(err.to_string().contains("spoc, admin"));
    }
}
