//! Read-only reporting over parts, the ledger, requests and counts.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{Clock, SparePartId};
use stockroom_inventory::{SparePart, TransactionFilter};
use stockroom_requisition::{MaterialRequest, RequestFilter, RequestStatus};
use stockroom_stocktake::CountFilter;

use crate::services::{ServiceContext, ServiceError, ServiceResult};
use crate::store::Store;

pub mod activity;
pub mod dashboard;
pub mod export;
pub mod requisition;
pub mod stock_count;

pub use activity::{CountRow, RequestRow, TransactionRow};
pub use dashboard::Dashboard;
pub use export::{Cell, ExportError, Sheet, Workbook};
pub use requisition::{CategoryRequestStat, DepartmentRequestStat, RequisitionReport};
pub use stock_count::{CategoryCountStat, DifferenceLine, StockCountReport};

/// Inclusive range of whole UTC days.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> ServiceResult<Self> {
        if start > end {
            return Err(ServiceError::Validation(format!(
                "report range starts after it ends ({start} > {end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// The `days` days ending with `today`.
    pub fn trailing(today: NaiveDate, days: u32) -> Self {
        let back = i64::from(days.max(1)) - 1;
        Self {
            start: today - Duration::days(back),
            end: today,
        }
    }

    /// `[start 00:00, end + 1 day 00:00)` in UTC.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            start_of_day(self.start),
            start_of_day(self.end + Duration::days(1)),
        )
    }

    /// Compact label used in export file names, e.g. `20250501_20250531`.
    pub fn label(&self) -> String {
        format!("{}_{}", self.start.format("%Y%m%d"), self.end.format("%Y%m%d"))
    }
}

pub(crate) fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

pub(crate) fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// Units handed out by requests issued at or after `since`.
pub(crate) fn issued_since(requests: &[MaterialRequest], since: DateTime<Utc>) -> i64 {
    requests
        .iter()
        .filter(|r| r.state().issued_at().is_some_and(|at| at >= since))
        .flat_map(|r| r.lines())
        .map(|line| line.issued_quantity)
        .sum()
}

/// Category of a part, or a placeholder once the part is gone.
pub(crate) fn category_of(parts: &BTreeMap<SparePartId, SparePart>, id: SparePartId) -> String {
    parts
        .get(&id)
        .map(|p| p.category().to_string())
        .unwrap_or_else(|| "(deleted)".to_string())
}

/// Report queries. Each takes an optional range and falls back to the
/// configured trailing window ending today.
#[derive(Clone)]
pub struct Reports {
    ctx: Arc<ServiceContext>,
}

impl Reports {
    pub(crate) fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    pub fn default_range(&self) -> DateRange {
        DateRange::trailing(self.ctx.clock.today(), self.ctx.settings.report_window_days)
    }

    fn resolve(&self, range: Option<DateRange>) -> DateRange {
        range.unwrap_or_else(|| self.default_range())
    }

    async fn parts_by_id(&self) -> ServiceResult<BTreeMap<SparePartId, SparePart>> {
        Ok(self
            .ctx
            .store
            .list_parts()
            .await?
            .into_iter()
            .map(|p| (p.id_typed(), p))
            .collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn dashboard(&self) -> ServiceResult<Dashboard> {
        let store = &self.ctx.store;
        let settings = &self.ctx.settings;
        let now = self.ctx.clock.now();
        let today = now.date_naive();

        let parts = store.list_parts().await?;
        let pending = store
            .list_requests(&RequestFilter::with_status(RequestStatus::Pending))
            .await?
            .len();
        let today_rows = store
            .list_transactions(&TransactionFilter::between(
                start_of_day(today),
                start_of_day(today + Duration::days(1)),
            ))
            .await?;
        let issued = store
            .list_requests(&RequestFilter::with_status(RequestStatus::Issued))
            .await?;
        let recent = store
            .list_transactions(&TransactionFilter::recent(settings.recent_transactions))
            .await?;

        Ok(Dashboard::compute(
            &parts,
            settings.low_stock_threshold,
            pending as u64,
            today_rows.len() as u64,
            issued_since(&issued, start_of_day(first_of_month(today))),
            recent,
        ))
    }

    #[tracing::instrument(skip(self))]
    pub async fn requisitions(&self, range: Option<DateRange>) -> ServiceResult<RequisitionReport> {
        let range = self.resolve(range);
        let (from, until) = range.bounds();
        let requests = self
            .ctx
            .store
            .list_requests(&RequestFilter {
                from: Some(from),
                until: Some(until),
                ..RequestFilter::default()
            })
            .await?;
        let parts = self.parts_by_id().await?;
        Ok(RequisitionReport::compute(range, &requests, &parts))
    }

    #[tracing::instrument(skip(self))]
    pub async fn stock_counts(&self, range: Option<DateRange>) -> ServiceResult<StockCountReport> {
        let range = self.resolve(range);
        let (from, until) = range.bounds();
        let counts = self
            .ctx
            .store
            .list_counts(&CountFilter {
                from: Some(from),
                until: Some(until),
                ..CountFilter::default()
            })
            .await?;
        let parts = self.parts_by_id().await?;
        Ok(StockCountReport::compute(range, &counts, &parts))
    }

    /// Flat ledger rows in range, oldest first.
    pub async fn transaction_rows(
        &self,
        range: Option<DateRange>,
    ) -> ServiceResult<Vec<TransactionRow>> {
        let (from, until) = self.resolve(range).bounds();
        let mut rows = self
            .ctx
            .store
            .list_transactions(&TransactionFilter::between(from, until))
            .await?;
        rows.reverse();
        let parts = self.parts_by_id().await?;
        Ok(rows
            .iter()
            .map(|t| TransactionRow::from_transaction(t, parts.get(&t.part_id)))
            .collect())
    }

    /// One summary row per request in range, oldest first.
    pub async fn request_rows(&self, range: Option<DateRange>) -> ServiceResult<Vec<RequestRow>> {
        let (from, until) = self.resolve(range).bounds();
        let mut requests = self
            .ctx
            .store
            .list_requests(&RequestFilter {
                from: Some(from),
                until: Some(until),
                ..RequestFilter::default()
            })
            .await?;
        requests.reverse();
        Ok(requests.iter().map(RequestRow::from_request).collect())
    }

    /// One summary row per count in range, oldest first.
    pub async fn count_rows(&self, range: Option<DateRange>) -> ServiceResult<Vec<CountRow>> {
        let (from, until) = self.resolve(range).bounds();
        let mut counts = self
            .ctx
            .store
            .list_counts(&CountFilter {
                from: Some(from),
                until: Some(until),
                ..CountFilter::default()
            })
            .await?;
        counts.reverse();
        Ok(counts.iter().map(CountRow::from_count).collect())
    }
}
