use thiserror::Error;

use stockroom_core::{DomainError, Shortage};

use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of a workflow operation.
///
/// Business-rule failures (`Validation`, `InvalidState`, `InsufficientStock`)
/// are distinguishable from persistence failures (`Conflict`, `Store`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("insufficient stock: {}", format_shortages(.0))]
    InsufficientStock(Vec<Shortage>),

    /// Stale version, duplicate document number or referential restriction.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    /// Stable machine-readable code for presentation.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Validation(_) => "validation",
            ServiceError::InvalidState(_) => "invalid_state",
            ServiceError::InsufficientStock(_) => "insufficient_stock",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Store(_) => "storage",
        }
    }

    /// Log at a level matching the failure kind. Persistence failures are errors;
    /// rejected commands are warnings.
    pub(crate) fn log(&self, operation: &'static str) {
        match self {
            ServiceError::Store(e) => {
                tracing::error!(operation, error = %e, "persistence failure");
            }
            ServiceError::Conflict(msg) => {
                tracing::warn!(operation, reason = %msg, "write conflict");
            }
            other => {
                tracing::warn!(operation, code = other.code(), reason = %other, "command rejected");
            }
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::InvalidState(msg) => ServiceError::InvalidState(msg),
            DomainError::InsufficientStock(shortages) => ServiceError::InsufficientStock(shortages),
            DomainError::NotFound => ServiceError::NotFound("record".to_string()),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) | StoreError::Constraint(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Store(other),
        }
    }
}

fn format_shortages(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::SparePartId;

    #[test]
    fn store_failures_stay_distinguishable() {
        let conflict: ServiceError = StoreError::Constraint("part 1 is referenced".into()).into();
        assert_eq!(conflict.code(), "conflict");

        let down: ServiceError = StoreError::Unavailable("lock poisoned".into()).into();
        assert!(matches!(down, ServiceError::Store(_)));
        assert_eq!(down.code(), "storage");
    }

    #[test]
    fn shortages_survive_mapping() {
        let err: ServiceError = DomainError::InsufficientStock(vec![Shortage {
            part_id: SparePartId::new(7),
            available: Some(5),
            required: 10,
        }])
        .into();
        assert_eq!(
            err.to_string(),
            "insufficient stock: part 7 has 5 in stock, 10 required"
        );
    }
}
