//! Flat activity listings, one row per ledger entry, request or count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{SparePartId, UserId};
use stockroom_inventory::{InventoryTransaction, SparePart, TransactionType};
use stockroom_requisition::{MaterialRequest, RequestStatus};
use stockroom_stocktake::{CountStatus, StockCount};

use super::export::Sheet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub occurred_at: DateTime<Utc>,
    pub part_id: SparePartId,
    /// Empty once the part has been deleted.
    pub part_description: String,
    pub kind: TransactionType,
    pub quantity: i64,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub user_id: UserId,
    pub reason: String,
    pub reference_no: Option<String>,
}

impl TransactionRow {
    pub fn from_transaction(txn: &InventoryTransaction, part: Option<&SparePart>) -> Self {
        Self {
            occurred_at: txn.occurred_at,
            part_id: txn.part_id,
            part_description: part.map(|p| p.description().to_string()).unwrap_or_default(),
            kind: txn.kind,
            quantity: txn.quantity,
            previous_quantity: txn.previous_quantity,
            new_quantity: txn.new_quantity,
            user_id: txn.user_id,
            reason: txn.reason.clone(),
            reference_no: txn.reference_no.clone(),
        }
    }

    pub fn sheet(rows: &[TransactionRow], name_of: impl Fn(UserId) -> String) -> Sheet {
        let mut sheet = Sheet::new(
            "Inventory Report",
            &[
                "Transaction Date",
                "Spare Part No",
                "Description",
                "Type",
                "Quantity",
                "Previous Quantity",
                "New Quantity",
                "User",
                "Reason",
                "Reference No",
            ],
        );
        for row in rows {
            sheet.push(vec![
                row.occurred_at.into(),
                row.part_id.get().into(),
                row.part_description.clone().into(),
                row.kind.as_str().into(),
                row.quantity.into(),
                row.previous_quantity.into(),
                row.new_quantity.into(),
                name_of(row.user_id).into(),
                row.reason.clone().into(),
                row.reference_no.clone().unwrap_or_default().into(),
            ]);
        }
        sheet
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRow {
    pub requested_at: DateTime<Utc>,
    pub request_no: String,
    pub requester: Option<UserId>,
    pub department: String,
    pub status: RequestStatus,
    pub line_count: u64,
}

impl RequestRow {
    pub fn from_request(request: &MaterialRequest) -> Self {
        Self {
            requested_at: request.requested_at(),
            request_no: request.request_no().to_string(),
            requester: request.requester(),
            department: request.department().to_string(),
            status: request.status(),
            line_count: request.lines().len() as u64,
        }
    }

    pub fn sheet(rows: &[RequestRow], name_of: impl Fn(UserId) -> String) -> Sheet {
        let mut sheet = Sheet::new(
            "Material Request Report",
            &[
                "Request Date",
                "Request Number",
                "Requester",
                "Department",
                "Status",
                "Total Items",
            ],
        );
        for row in rows {
            sheet.push(vec![
                row.requested_at.into(),
                row.request_no.clone().into(),
                row.requester.map(&name_of).unwrap_or_default().into(),
                row.department.clone().into(),
                row.status.as_str().into(),
                row.line_count.into(),
            ]);
        }
        sheet
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRow {
    pub counted_at: DateTime<Utc>,
    pub count_no: String,
    pub counter: Option<UserId>,
    pub status: CountStatus,
    pub items: u64,
    pub system_quantity: i64,
    pub counted_quantity: i64,
    /// `counted_quantity - system_quantity`.
    pub variance: i64,
}

impl CountRow {
    pub fn from_count(count: &StockCount) -> Self {
        let system_quantity = count.system_total();
        let counted_quantity = count.counted_total();
        Self {
            counted_at: count.counted_at(),
            count_no: count.count_no().to_string(),
            counter: count.counter(),
            status: count.status(),
            items: count.details().len() as u64,
            system_quantity,
            counted_quantity,
            variance: counted_quantity - system_quantity,
        }
    }

    pub fn sheet(rows: &[CountRow], name_of: impl Fn(UserId) -> String) -> Sheet {
        let mut sheet = Sheet::new(
            "Stock Count Report",
            &[
                "Count Date",
                "Count Number",
                "Counter",
                "Status",
                "Total Items",
                "System Quantity",
                "Counted Quantity",
                "Variance",
            ],
        );
        for row in rows {
            sheet.push(vec![
                row.counted_at.into(),
                row.count_no.clone().into(),
                row.counter.map(&name_of).unwrap_or_default().into(),
                row.status.as_str().into(),
                row.items.into(),
                row.system_quantity.into(),
                row.counted_quantity.into(),
                row.variance.into(),
            ]);
        }
        sheet
    }
}
