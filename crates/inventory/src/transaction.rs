//! Inventory transaction log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{SparePartId, TransactionId, UserId};

/// Kind of quantity change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Stock received (initial registration).
    In,
    /// Stock leaving the stockroom (issuance, removal).
    Out,
    /// Correction to a known quantity.
    Adjust,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::In => "IN",
            TransactionType::Out => "OUT",
            TransactionType::Adjust => "ADJUST",
        }
    }
}

impl core::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A quantity change decided by the domain but not yet written to the log.
///
/// The store assigns the [`TransactionId`] when the movement is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub part_id: SparePartId,
    pub kind: TransactionType,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub occurred_at: DateTime<Utc>,
    pub user_id: UserId,
    pub reason: String,
    /// Document that caused the movement (request or count number).
    pub reference_no: Option<String>,
}

impl StockMovement {
    pub fn delta(&self) -> i64 {
        self.new_quantity - self.previous_quantity
    }
}

/// Immutable, committed ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: TransactionId,
    pub part_id: SparePartId,
    pub kind: TransactionType,
    /// Signed change: `new_quantity - previous_quantity`.
    pub quantity: i64,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub occurred_at: DateTime<Utc>,
    pub user_id: UserId,
    pub reason: String,
    pub reference_no: Option<String>,
}

impl InventoryTransaction {
    pub fn commit(id: TransactionId, movement: StockMovement) -> Self {
        let quantity = movement.delta();
        Self {
            id,
            part_id: movement.part_id,
            kind: movement.kind,
            quantity,
            previous_quantity: movement.previous_quantity,
            new_quantity: movement.new_quantity,
            occurred_at: movement.occurred_at,
            user_id: movement.user_id,
            reason: movement.reason,
            reference_no: movement.reference_no,
        }
    }
}

/// Rebuild a part's quantity by summing its ledger deltas from zero.
///
/// `None` if consecutive rows do not chain (a row's previous quantity differs
/// from the new quantity of the row before it).
pub fn replay_quantity<'a>(
    transactions: impl IntoIterator<Item = &'a InventoryTransaction>,
) -> Option<i64> {
    let mut quantity = 0i64;
    for txn in transactions {
        if txn.previous_quantity != quantity {
            return None;
        }
        quantity += txn.quantity;
    }
    Some(quantity)
}
