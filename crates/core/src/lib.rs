//! `stockroom-core`: domain building blocks shared by every stockroom crate.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod numbering;
pub mod page;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::Entity;
pub use error::{DomainError, DomainResult, Shortage};
pub use id::{
    CountDetailId, RequestDetailId, RequestId, SparePartId, StockCountId, TransactionId, UserId,
};
pub use numbering::{DocumentKind, DocumentNumber};
pub use page::{Page, PageRequest};

/// Reject values longer than `max` characters.
///
/// Field limits mirror the column widths of the backing schema.
pub fn ensure_max_len(field: &str, value: &str, max: usize) -> DomainResult<()> {
    if value.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}
