//! Stock count reconciliation domain.
//!
//! A count snapshots the recorded quantity of selected parts, collects the
//! physically counted quantities and, on completion, yields the corrections
//! the caller applies to the registry.

pub mod count;

pub use count::{
    CompleteCount, CountCommand, CountCompleted, CountEvent, CountFilter, CountLineDraft, CountOpened,
    CountState, CountStatus, Correction, OpenCount, QuantityCounted, RecordCount, StockCount,
    StockCountDetail, newest_first,
};
