use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use stockroom_core::SparePartId;
use stockroom_inventory::SparePart;
use stockroom_stocktake::{CountStatus, StockCount};

use super::export::{Cell, Sheet, Workbook};
use super::{DateRange, category_of};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCountStat {
    pub category: String,
    pub counted_items: u64,
    pub difference_items: u64,
    /// `difference_items / counted_items * 100`, two decimal places.
    pub difference_percentage: Decimal,
}

/// A counted line whose quantity disagreed with the system snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifferenceLine {
    pub count_no: String,
    pub counted_at: DateTime<Utc>,
    pub part_id: SparePartId,
    pub description: String,
    pub specification: String,
    pub system_quantity: i64,
    pub counted_quantity: i64,
    pub difference: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCountReport {
    pub range: DateRange,
    pub total: u64,
    pub completed: u64,
    pub in_progress: u64,
    /// Lines with a nonzero difference.
    pub difference_items: u64,
    /// Sum of positive differences (surplus).
    pub positive_difference: i64,
    /// Magnitude of the sum of negative differences (shortfall).
    pub negative_difference: i64,
    /// Sorted by category name.
    pub categories: Vec<CategoryCountStat>,
    /// Largest absolute difference first.
    pub differences: Vec<DifferenceLine>,
}

impl StockCountReport {
    pub fn compute(
        range: DateRange,
        counts: &[StockCount],
        parts: &BTreeMap<SparePartId, SparePart>,
    ) -> Self {
        let mut categories: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        let mut differences = Vec::new();
        for count in counts {
            for detail in count.details() {
                let diff = detail.difference();
                let entry = categories
                    .entry(category_of(parts, detail.part_id()))
                    .or_default();
                entry.0 += 1;
                if diff == 0 {
                    continue;
                }
                entry.1 += 1;

                let part = parts.get(&detail.part_id());
                differences.push(DifferenceLine {
                    count_no: count.count_no().to_string(),
                    counted_at: count.counted_at(),
                    part_id: detail.part_id(),
                    description: part.map(|p| p.description().to_string()).unwrap_or_default(),
                    specification: part
                        .map(|p| p.specification().to_string())
                        .unwrap_or_default(),
                    system_quantity: detail.system_quantity(),
                    counted_quantity: detail.counted_quantity(),
                    difference: diff,
                });
            }
        }
        // Stable sort keeps count order among equal magnitudes.
        differences.sort_by_key(|d| std::cmp::Reverse(d.difference.abs()));

        let status_count =
            |status: CountStatus| counts.iter().filter(|c| c.status() == status).count() as u64;

        Self {
            range,
            total: counts.len() as u64,
            completed: status_count(CountStatus::Completed),
            in_progress: status_count(CountStatus::InProgress),
            difference_items: differences.len() as u64,
            positive_difference: differences
                .iter()
                .filter(|d| d.difference > 0)
                .map(|d| d.difference)
                .sum(),
            negative_difference: differences
                .iter()
                .filter(|d| d.difference < 0)
                .map(|d| d.difference)
                .sum::<i64>()
                .abs(),
            categories: categories
                .into_iter()
                .map(|(category, (counted, differing))| CategoryCountStat {
                    category,
                    counted_items: counted,
                    difference_items: differing,
                    difference_percentage: percentage(differing, counted),
                })
                .collect(),
            differences,
        }
    }
}

impl StockCountReport {
    /// Summary, category and difference sheets.
    pub fn to_workbook(&self) -> Workbook {
        let mut summary = Sheet::new("Summary", &["Metric", "Value"]);
        summary.push(vec!["From".into(), self.range.start.to_string().into()]);
        summary.push(vec!["To".into(), self.range.end.to_string().into()]);
        for (label, value) in [
            ("Total Counts", self.total as i64),
            ("Completed", self.completed as i64),
            ("In Progress", self.in_progress as i64),
            ("Difference Items", self.difference_items as i64),
            ("Positive Difference", self.positive_difference),
            ("Negative Difference", self.negative_difference),
        ] {
            summary.push(vec![label.into(), value.into()]);
        }

        let mut categories = Sheet::new(
            "By Category",
            &["Category", "Counted Items", "Difference Items", "Difference %"],
        );
        for c in &self.categories {
            categories.push(vec![
                c.category.clone().into(),
                c.counted_items.into(),
                c.difference_items.into(),
                Cell::Decimal(c.difference_percentage.to_f64().unwrap_or_default()),
            ]);
        }

        let mut differences = Sheet::new(
            "Differences",
            &[
                "Count Number",
                "Count Date",
                "Spare Part No",
                "Description",
                "Specification",
                "System Quantity",
                "Counted Quantity",
                "Difference",
            ],
        );
        for d in &self.differences {
            differences.push(vec![
                d.count_no.clone().into(),
                d.counted_at.into(),
                d.part_id.get().into(),
                d.description.clone().into(),
                d.specification.clone().into(),
                d.system_quantity.into(),
                d.counted_quantity.into(),
                d.difference.into(),
            ]);
        }

        Workbook::new(vec![summary, categories, differences])
    }
}

fn percentage(part: u64, whole: u64) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_two_places() {
        assert_eq!(percentage(1, 3), Decimal::new(3333, 2));
        assert_eq!(percentage(2, 3), Decimal::new(6667, 2));
        assert_eq!(percentage(0, 0), Decimal::ZERO);
        assert_eq!(percentage(4, 4), Decimal::ONE_HUNDRED);
    }
}
