use serde::{Deserialize, Serialize};

use stockroom_core::UserId;

use crate::{Permission, Role, role_permissions};

/// The identity collaborator: who is calling and which roles they hold.
///
/// Authentication happens outside this crate; the presentation layer hands
/// an implementation of this trait to every facade call.
pub trait Identity {
    /// `None` for anonymous callers.
    fn current_user_id(&self) -> Option<UserId>;

    fn is_in_role(&self, role: Role) -> bool;

    /// Any of the supervisory roles.
    fn is_privileged(&self) -> bool {
        Role::ALL
            .into_iter()
            .filter(|r| r.is_privileged())
            .any(|r| self.is_in_role(r))
    }
}

/// A fully resolved, authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new(user_id: UserId, roles: impl IntoIterator<Item = Role>) -> Self {
        let mut roles: Vec<Role> = roles.into_iter().collect();
        roles.sort();
        roles.dedup();
        Self { user_id, roles }
    }

    /// Resolve any identity into a principal. `None` for anonymous callers.
    pub fn from_identity(identity: &(impl Identity + ?Sized)) -> Option<Self> {
        let user_id = identity.current_user_id()?;
        Some(Self::new(
            user_id,
            Role::ALL.into_iter().filter(|r| identity.is_in_role(*r)),
        ))
    }

    /// Union of the permissions granted by every role held.
    pub fn permissions(&self) -> Vec<Permission> {
        let mut perms: Vec<Permission> = self
            .roles
            .iter()
            .flat_map(|r| role_permissions(*r))
            .collect();
        perms.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        perms.dedup();
        perms
    }
}

impl Identity for Principal {
    fn current_user_id(&self) -> Option<UserId> {
        Some(self.user_id)
    }

    fn is_in_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Unauthenticated caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct Anonymous;

impl Identity for Anonymous {
    fn current_user_id(&self) -> Option<UserId> {
        None
    }

    fn is_in_role(&self, _role: Role) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_dedupes_roles() {
        let p = Principal::new(UserId::new(), [Role::User, Role::Manager, Role::User]);
        assert_eq!(p.roles, vec![Role::Manager, Role::User]);
        assert!(p.is_privileged());
    }

    #[test]
    fn anonymous_resolves_to_no_principal() {
        assert!(Principal::from_identity(&Anonymous).is_none());
    }
}
