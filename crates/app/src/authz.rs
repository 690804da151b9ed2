//! Facade-side authorization guard.
//!
//! Checks run before any service call, so services and aggregates stay
//! unaware of roles.

use stockroom_auth::permissions::REQUESTS_READ_ALL;
use stockroom_auth::{Identity, Permission, Principal, authorize};
use stockroom_requisition::MaterialRequest;

use crate::app::errors::{AppError, AppResult};

/// Resolve the caller and require `permission`.
pub fn require(identity: &(impl Identity + ?Sized), permission: &Permission) -> AppResult<Principal> {
    authorize(identity, permission).map_err(AppError::from)
}

/// Whether the caller may read requests raised by other users.
pub fn sees_all_requests(principal: &Principal) -> bool {
    principal.is_privileged()
        || principal
            .permissions()
            .iter()
            .any(|p| p.grants(&REQUESTS_READ_ALL))
}

/// Requests are private to their requester unless the viewer is supervisory.
pub fn ensure_visible(principal: &Principal, request: &MaterialRequest) -> AppResult<()> {
    if request.is_visible_to(principal.user_id, sees_all_requests(principal)) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %principal.user_id,
            request_no = request.request_no(),
            "request hidden from caller"
        );
        Err(AppError::Forbidden(format!(
            "request {} belongs to another user",
            request.request_no()
        )))
    }
}
