//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::SparePartId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// One part that cannot cover the quantity a document asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortage {
    pub part_id: SparePartId,
    /// `None` when the part no longer exists.
    pub available: Option<i64>,
    pub required: i64,
}

impl core::fmt::Display for Shortage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.available {
            Some(available) => write!(
                f,
                "part {} has {} in stock, {} required",
                self.part_id, available, self.required
            ),
            None => write!(f, "part {} does not exist", self.part_id),
        }
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested transition is not allowed from the current status.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Stock cannot cover the requested quantities.
    #[error("insufficient stock: {}", format_shortages(.0))]
    InsufficientStock(Vec<Shortage>),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. stale version / duplicate document number).
    #[error("conflict: {0}")]
    Conflict(String),
}

fn format_shortages(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_lists_every_shortage() {
        let err = DomainError::InsufficientStock(vec![
            Shortage {
                part_id: SparePartId::new(3),
                available: Some(5),
                required: 10,
            },
            Shortage {
                part_id: SparePartId::new(9),
                available: None,
                required: 1,
            },
        ]);

        assert_eq!(
            err.to_string(),
            "insufficient stock: part 3 has 5 in stock, 10 required; part 9 does not exist"
        );
    }
}
