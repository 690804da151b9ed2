use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_auth::{AuthzError, DirectoryError};
use stockroom_core::Shortage;
use stockroom_infra::ServiceError;
use stockroom_infra::reports::ExportError;

pub type AppResult<T> = Result<T, AppError>;

/// Failure of a facade call.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not signed in")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

impl From<AuthzError> for AppError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Unauthenticated => AppError::Unauthenticated,
            AuthzError::Forbidden(permission) => {
                AppError::Forbidden(format!("missing permission '{permission}'"))
            }
        }
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "unauthenticated",
            AppError::Forbidden(_) => "forbidden",
            AppError::Service(e) => e.code(),
            AppError::Directory(DirectoryError::NotFound) => "not_found",
            AppError::Directory(DirectoryError::DuplicateEmail(_)) => "conflict",
            AppError::Directory(DirectoryError::Validation(_)) => "validation",
            AppError::Directory(DirectoryError::Unavailable) => "storage",
            AppError::Export(_) => "export",
        }
    }

    /// Per-part shortfalls when an issuance ran short.
    pub fn shortages(&self) -> &[Shortage] {
        match self {
            AppError::Service(ServiceError::InsufficientStock(shortages)) => shortages,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionError {
    pub code: String,
    pub message: String,
}

/// Result shape handed to presentation: expected failures become
/// `success: false` with a code and message instead of a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
}

impl<T> ActionOutcome<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(err: &AppError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ActionError {
                code: err.code().to_string(),
                message: err.to_string(),
            }),
        }
    }
}

impl<T> From<AppResult<T>> for ActionOutcome<T> {
    fn from(value: AppResult<T>) -> Self {
        match value {
            Ok(data) => ActionOutcome::ok(data),
            Err(err) => ActionOutcome::failed(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_infra::StoreError;

    #[test]
    fn outcome_serializes_error_detail() {
        let outcome: ActionOutcome<()> =
            Err(AppError::Service(ServiceError::InvalidState("request is PENDING".into()))).into();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "invalid_state");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn storage_failures_keep_their_own_code() {
        let err = AppError::from(ServiceError::from(StoreError::Unavailable("down".into())));
        assert_eq!(err.code(), "storage");

        let err = AppError::from(AuthzError::Forbidden("parts.delete".into()));
        assert_eq!(err.code(), "forbidden");
        assert_eq!(err.to_string(), "forbidden: missing permission 'parts.delete'");
    }

    #[test]
    fn success_carries_data() {
        let outcome = ActionOutcome::from(Ok::<_, AppError>(7));
        assert!(outcome.success);
        assert_eq!(outcome.data, Some(7));
        assert!(outcome.error.is_none());
    }
}
