//! Spare-part registry domain.
//!
//! Business rules for stockable parts and the quantity ledger, implemented
//! purely as deterministic domain logic (no IO, no storage).

pub mod part;
pub mod search;
pub mod transaction;

pub use part::{
    AdjustQuantity, DetailsRevised, PartCommand, PartDetails, PartEvent, PartRegistered,
    PartRetired, RegisterPart, RetirePart, RevisePart, SparePart, movements,
};
pub use search::{PartSearch, TransactionFilter, location_order, newest_first};
pub use transaction::{InventoryTransaction, StockMovement, TransactionType, replay_quantity};
