use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stockroom_inventory::{InventoryTransaction, SparePart};

/// Landing-page summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub total_parts: u64,
    pub total_quantity: i64,
    pub zero_stock_parts: u64,
    /// Parts with `0 < quantity <= threshold`.
    pub low_stock_parts: u64,
    pub pending_requests: u64,
    pub transactions_today: u64,
    /// Units handed out by requests issued since the first of the month.
    pub issued_this_month: i64,
    pub recent_transactions: Vec<InventoryTransaction>,
    /// Part count per category.
    pub parts_by_category: BTreeMap<String, u64>,
}

impl Dashboard {
    pub fn compute(
        parts: &[SparePart],
        low_stock_threshold: i64,
        pending_requests: u64,
        transactions_today: u64,
        issued_this_month: i64,
        recent_transactions: Vec<InventoryTransaction>,
    ) -> Self {
        let mut parts_by_category: BTreeMap<String, u64> = BTreeMap::new();
        for part in parts {
            *parts_by_category
                .entry(part.category().to_string())
                .or_default() += 1;
        }

        Self {
            total_parts: parts.len() as u64,
            total_quantity: parts.iter().map(SparePart::quantity).sum(),
            zero_stock_parts: parts.iter().filter(|p| p.quantity() == 0).count() as u64,
            low_stock_parts: parts
                .iter()
                .filter(|p| p.quantity() > 0 && p.quantity() <= low_stock_threshold)
                .count() as u64,
            pending_requests,
            transactions_today,
            issued_this_month,
            recent_transactions,
            parts_by_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockroom_core::{Aggregate, SparePartId, UserId};
    use stockroom_inventory::{PartCommand, PartDetails, RegisterPart};

    fn part(id: i64, category: &str, quantity: i64) -> SparePart {
        let id = SparePartId::new(id);
        let (part, _) = SparePart::empty(id)
            .execute(&PartCommand::Register(RegisterPart {
                part_id: id,
                details: PartDetails {
                    category: category.to_string(),
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
    fn counts_stock_levels_and_categories() {
        let parts = vec![
            part(1, "Bearings", 0),
            part(2, "Bearings", 3),
            part(3, "Seals", 5),
            part(4, "Seals", 6),
        ];
        let dashboard = Dashboard::compute(&parts, 5, 2, 7, 7, vec![]);

        assert_eq!(dashboard.total_parts, 4);
        assert_eq!(dashboard.total_quantity, 14);
        assert_eq!(dashboard.zero_stock_parts, 1);
        assert_eq!(dashboard.low_stock_parts, 2);
        assert_eq!(dashboard.pending_requests, 2);
        assert_eq!(dashboard.transactions_today, 7);
        assert_eq!(dashboard.issued_this_month, 7);
        assert_eq!(dashboard.parts_by_category.get("Seals"), Some(&2));
    }
}
