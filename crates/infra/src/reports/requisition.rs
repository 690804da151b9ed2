use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stockroom_core::SparePartId;
use stockroom_inventory::SparePart;
use stockroom_requisition::{MaterialRequest, RequestStatus};

use super::export::{Sheet, Workbook};
use super::{DateRange, category_of};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRequestStat {
    pub department: String,
    pub requests: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub issued: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRequestStat {
    pub category: String,
    pub requested_quantity: i64,
    pub approved_quantity: i64,
    pub issued_quantity: i64,
}

/// Requests placed within a range, rolled up by status, department and category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequisitionReport {
    pub range: DateRange,
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub issued: u64,
    /// Sorted by department name.
    pub departments: Vec<DepartmentRequestStat>,
    /// Sorted by category name.
    pub categories: Vec<CategoryRequestStat>,
}

impl RequisitionReport {
    pub fn compute(
        range: DateRange,
        requests: &[MaterialRequest],
        parts: &BTreeMap<SparePartId, SparePart>,
    ) -> Self {
        let count = |status: RequestStatus| {
            requests.iter().filter(|r| r.status() == status).count() as u64
        };

        let mut departments: BTreeMap<&str, DepartmentRequestStat> = BTreeMap::new();
        let mut categories: BTreeMap<String, CategoryRequestStat> = BTreeMap::new();
        for request in requests {
            let stat = departments
                .entry(request.department())
                .or_insert_with(|| DepartmentRequestStat {
                    department: request.department().to_string(),
                    ..DepartmentRequestStat::default()
                });
            stat.requests += 1;
            match request.status() {
                RequestStatus::Pending => stat.pending += 1,
                RequestStatus::Approved => stat.approved += 1,
                RequestStatus::Rejected => stat.rejected += 1,
                RequestStatus::Issued => stat.issued += 1,
            }

            for line in request.lines() {
                let category = category_of(parts, line.part_id);
                let stat = categories
                    .entry(category.clone())
                    .or_insert_with(|| CategoryRequestStat {
                        category,
                        ..CategoryRequestStat::default()
                    });
                stat.requested_quantity += line.requested_quantity;
                stat.approved_quantity += line.approved_quantity;
                stat.issued_quantity += line.issued_quantity;
            }
        }

        Self {
            range,
            total: requests.len() as u64,
            pending: count(RequestStatus::Pending),
            approved: count(RequestStatus::Approved),
            rejected: count(RequestStatus::Rejected),
            issued: count(RequestStatus::Issued),
            departments: departments.into_values().collect(),
            categories: categories.into_values().collect(),
        }
    }
}

impl RequisitionReport {
    /// Summary, department and category sheets.
    pub fn to_workbook(&self) -> Workbook {
        let mut summary = Sheet::new("Summary", &["Metric", "Value"]);
        summary.push(vec!["From".into(), self.range.start.to_string().into()]);
        summary.push(vec!["To".into(), self.range.end.to_string().into()]);
        for (label, value) in [
            ("Total Requests", self.total),
            ("Pending", self.pending),
            ("Approved", self.approved),
            ("Rejected", self.rejected),
            ("Issued", self.issued),
        ] {
            summary.push(vec![label.into(), value.into()]);
        }

        let mut departments = Sheet::new(
            "By Department",
            &["Department", "Requests", "Pending", "Approved", "Rejected", "Issued"],
        );
        for d in &self.departments {
            departments.push(vec![
                d.department.clone().into(),
                d.requests.into(),
                d.pending.into(),
                d.approved.into(),
                d.rejected.into(),
                d.issued.into(),
            ]);
        }

        let mut categories = Sheet::new(
            "By Category",
            &["Category", "Requested", "Approved", "Issued"],
        );
        for c in &self.categories {
            categories.push(vec![
                c.category.clone().into(),
                c.requested_quantity.into(),
                c.approved_quantity.into(),
                c.issued_quantity.into(),
            ]);
        }

        Workbook::new(vec![summary, departments, categories])
    }
}
