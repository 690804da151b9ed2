use thiserror::Error;

use crate::{Identity, Permission, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not signed in")]
    Unauthenticated,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize an identity for a single permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(
    identity: &(impl Identity + ?Sized),
    required: &Permission,
) -> Result<Principal, AuthzError> {
    let principal = Principal::from_identity(identity).ok_or(AuthzError::Unauthenticated)?;

    if principal.permissions().iter().any(|p| p.grants(required)) {
        Ok(principal)
    } else {
        tracing::debug!(
            user_id = %principal.user_id,
            permission = %required,
            "authorization denied"
        );
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Succeeds if any one of `required` is granted.
pub fn authorize_any(
    identity: &(impl Identity + ?Sized),
    required: &[Permission],
) -> Result<Principal, AuthzError> {
    let principal = Principal::from_identity(identity).ok_or(AuthzError::Unauthenticated)?;
    let held = principal.permissions();

    if required.iter().any(|r| held.iter().any(|p| p.grants(r))) {
        Ok(principal)
    } else {
        let names: Vec<&str> = required.iter().map(Permission::as_str).collect();
        Err(AuthzError::Forbidden(names.join(" | ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::*;
    use crate::{Anonymous, Role};
    use stockroom_core::UserId;

    fn principal(roles: &[Role]) -> Principal {
        Principal::new(UserId::new(), roles.iter().copied())
    }

    #[test]
    fn super_admin_wildcard_allows_anything() {
        let admin = principal(&[Role::SuperAdmin]);
        assert!(authorize(&admin, &PARTS_DELETE).is_ok());
        assert!(authorize(&admin, &Permission::new("anything.at_all")).is_ok());
    }

    #[test]
    fn manager_cannot_delete_parts() {
        let manager = principal(&[Role::Manager]);
        assert!(authorize(&manager, &REQUESTS_ISSUE).is_ok());
        match authorize(&manager, &PARTS_DELETE) {
            Err(AuthzError::Forbidden(p)) => assert_eq!(p, "parts.delete"),
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn plain_user_can_request_but_not_approve() {
        let user = principal(&[Role::User]);
        assert!(authorize(&user, &REQUESTS_CREATE).is_ok());
        assert!(authorize(&user, &COUNTS_RECORD).is_ok());
        assert!(authorize(&user, &REQUESTS_APPROVE).is_err());
        assert!(authorize(&user, &COUNTS_COMPLETE).is_err());
    }

    #[test]
    fn anonymous_is_unauthenticated() {
        assert_eq!(
            authorize(&Anonymous, &PARTS_READ),
            Err(AuthzError::Unauthenticated)
        );
    }

    #[test]
    fn authorize_any_accepts_one_match() {
        let user = principal(&[Role::User]);
        assert!(authorize_any(&user, &[REQUESTS_APPROVE, REQUESTS_READ]).is_ok());
        assert!(authorize_any(&user, &[REQUESTS_APPROVE, REQUESTS_ISSUE]).is_err());
    }
}
