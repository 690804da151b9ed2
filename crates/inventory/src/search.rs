//! Query criteria for parts and ledger rows.
//!
//! Criteria are plain predicates so any store backend can evaluate them the
//! same way (the in-memory store calls `matches` directly).

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{PageRequest, SparePartId};

use crate::part::SparePart;
use crate::transaction::{InventoryTransaction, TransactionType};

/// Part search: every non-blank field is a case-insensitive substring filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSearch {
    pub plant: Option<String>,
    pub position: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub specification: Option<String>,
    /// Include parts with zero stock (excluded by default).
    pub include_zero_stock: bool,
    pub page: PageRequest,
}

fn contains(haystack: &str, needle: &Option<String>) -> bool {
    match needle.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
    }
}

impl PartSearch {
    pub fn matches(&self, part: &SparePart) -> bool {
        (self.include_zero_stock || part.quantity() > 0)
            && contains(part.plant(), &self.plant)
            && contains(part.position(), &self.position)
            && contains(part.category(), &self.category)
            && contains(part.description(), &self.description)
            && contains(part.specification(), &self.specification)
    }
}

/// Registry ordering: plant, position, sub-position, then part number.
pub fn location_order(a: &SparePart, b: &SparePart) -> Ordering {
    a.plant()
        .cmp(b.plant())
        .then_with(|| a.position().cmp(b.position()))
        .then_with(|| a.sub_position().cmp(b.sub_position()))
        .then_with(|| a.id_typed().cmp(&b.id_typed()))
}

/// Ledger query. Results are returned newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub part_id: Option<SparePartId>,
    pub kind: Option<TransactionType>,
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub until: Option<DateTime<Utc>>,
    pub reference_no: Option<String>,
    pub limit: Option<usize>,
}

impl TransactionFilter {
    pub fn for_part(part_id: SparePartId) -> Self {
        Self {
            part_id: Some(part_id),
            ..Self::default()
        }
    }

    pub fn recent(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn between(from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            until: Some(until),
            ..Self::default()
        }
    }

    pub fn matches(&self, txn: &InventoryTransaction) -> bool {
        self.part_id.is_none_or(|id| txn.part_id == id)
            && self.kind.is_none_or(|k| txn.kind == k)
            && self.from.is_none_or(|from| txn.occurred_at >= from)
            && self.until.is_none_or(|until| txn.occurred_at < until)
            && self
                .reference_no
                .as_deref()
                .is_none_or(|r| txn.reference_no.as_deref() == Some(r))
    }
}

/// Newest first; ties broken by log position so same-instant rows keep
/// their write order reversed.
pub fn newest_first(a: &InventoryTransaction, b: &InventoryTransaction) -> Ordering {
    b.occurred_at
        .cmp(&a.occurred_at)
        .then_with(|| b.id.cmp(&a.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::{PartCommand, PartDetails, RegisterPart};
    use crate::transaction::StockMovement;
    use chrono::Duration;
    use stockroom_core::{Aggregate, TransactionId, UserId};

    fn part(id: i64, plant: &str, position: &str, quantity: i64) -> SparePart {
        let id = SparePartId::new(id);
        let (part, _) = SparePart::empty(id)
            .execute(&PartCommand::Register(RegisterPart {
                part_id: id,
                details: PartDetails {
                    plant: plant.to_string(),
                    position: position.to_string(),
                    category: "Seals".to_string(),
                    description: "O-Ring Kit".to_string(),
                    ..PartDetails::default()
                },
                quantity,
                actor: UserId::new(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        part
    }

    #[test]
    fn zero_stock_is_hidden_unless_requested() {
        let empty = part(1, "P1", "A", 0);
        let mut search = PartSearch::default();
        assert!(!search.matches(&empty));
        search.include_zero_stock = true;
        assert!(search.matches(&empty));
    }

    #[test]
    fn filters_are_case_insensitive_substrings() {
        let p = part(1, "P1", "A", 3);
        let search = PartSearch {
            description: Some("o-ring".to_string()),
            category: Some("  ".to_string()),
            ..PartSearch::default()
        };
        assert!(search.matches(&p));

        let search = PartSearch {
            plant: Some("P2".to_string()),
            ..PartSearch::default()
        };
        assert!(!search.matches(&p));
    }

    #[test]
    fn location_order_sorts_plant_then_position() {
        let mut parts = vec![part(1, "P2", "A", 1), part(2, "P1", "B", 1), part(3, "P1", "A", 1)];
        parts.sort_by(location_order);
        let ids: Vec<i64> = parts.iter().map(|p| p.id_typed().get()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn transaction_window_is_half_open() {
        let at = Utc::now();
        let txn = InventoryTransaction::commit(
            TransactionId::new(1),
            StockMovement {
                part_id: SparePartId::new(1),
                kind: TransactionType::Out,
                previous_quantity: 5,
                new_quantity: 3,
                occurred_at: at,
                user_id: UserId::new(),
                reason: "issued".to_string(),
                reference_no: Some("MR20250604001".to_string()),
            },
        );

        assert!(TransactionFilter::between(at, at + Duration::seconds(1)).matches(&txn));
        assert!(!TransactionFilter::between(at - Duration::seconds(1), at).matches(&txn));

        let by_ref = TransactionFilter {
            reference_no: Some("MR20250604001".to_string()),
            ..TransactionFilter::default()
        };
        assert!(by_ref.matches(&txn));
    }
}
