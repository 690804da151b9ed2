use std::collections::HashMap;

use stockroom_auth::Identity;
use stockroom_auth::permissions::{REPORTS_EXPORT, REPORTS_READ};
use stockroom_core::UserId;
use stockroom_infra::reports::{
    CountRow, Dashboard, DateRange, RequestRow, RequisitionReport, StockCountReport,
    TransactionRow, Workbook,
};

use super::Application;
use super::dto::ExportFile;
use super::errors::AppResult;
use crate::authz::require;

impl Application {
    pub async fn dashboard(&self, caller: &impl Identity) -> AppResult<Dashboard> {
        require(caller, &REPORTS_READ)?;
        Ok(self.services.reports().dashboard().await?)
    }

    pub async fn requisition_report(
        &self,
        caller: &impl Identity,
        range: Option<DateRange>,
    ) -> AppResult<RequisitionReport> {
        require(caller, &REPORTS_READ)?;
        Ok(self.services.reports().requisitions(range).await?)
    }

    pub async fn stock_count_report(
        &self,
        caller: &impl Identity,
        range: Option<DateRange>,
    ) -> AppResult<StockCountReport> {
        require(caller, &REPORTS_READ)?;
        Ok(self.services.reports().stock_counts(range).await?)
    }

    pub async fn transaction_report(
        &self,
        caller: &impl Identity,
        range: Option<DateRange>,
    ) -> AppResult<Vec<TransactionRow>> {
        require(caller, &REPORTS_READ)?;
        Ok(self.services.reports().transaction_rows(range).await?)
    }

    pub async fn export_transactions(
        &self,
        caller: &impl Identity,
        range: Option<DateRange>,
    ) -> AppResult<ExportFile> {
        require(caller, &REPORTS_EXPORT)?;
        let range = self.resolve_range(range);
        let rows = self.services.reports().transaction_rows(Some(range)).await?;
        let names = self.display_names()?;
        let sheet = TransactionRow::sheet(&rows, |id| name_of(&names, id));
        self.render("InventoryReport", &range, Workbook::new(vec![sheet]))
    }

    pub async fn export_requests(
        &self,
        caller: &impl Identity,
        range: Option<DateRange>,
    ) -> AppResult<ExportFile> {
        require(caller, &REPORTS_EXPORT)?;
        let range = self.resolve_range(range);
        let rows = self.services.reports().request_rows(Some(range)).await?;
        let names = self.display_names()?;
        let sheet = RequestRow::sheet(&rows, |id| name_of(&names, id));
        self.render("MaterialRequestReport", &range, Workbook::new(vec![sheet]))
    }

    pub async fn export_counts(
        &self,
        caller: &impl Identity,
        range: Option<DateRange>,
    ) -> AppResult<ExportFile> {
        require(caller, &REPORTS_EXPORT)?;
        let range = self.resolve_range(range);
        let rows = self.services.reports().count_rows(Some(range)).await?;
        let names = self.display_names()?;
        let sheet = CountRow::sheet(&rows, |id| name_of(&names, id));
        self.render("StockCountReport", &range, Workbook::new(vec![sheet]))
    }

    pub async fn export_requisition_report(
        &self,
        caller: &impl Identity,
        range: Option<DateRange>,
    ) -> AppResult<ExportFile> {
        require(caller, &REPORTS_EXPORT)?;
        let report = self.services.reports().requisitions(range).await?;
        self.render("RequisitionAnalysis", &report.range, report.to_workbook())
    }

    pub async fn export_stock_count_report(
        &self,
        caller: &impl Identity,
        range: Option<DateRange>,
    ) -> AppResult<ExportFile> {
        require(caller, &REPORTS_EXPORT)?;
        let report = self.services.reports().stock_counts(range).await?;
        self.render("StockCountAnalysis", &report.range, report.to_workbook())
    }

    fn resolve_range(&self, range: Option<DateRange>) -> DateRange {
        range.unwrap_or_else(|| self.services.reports().default_range())
    }

    fn display_names(&self) -> AppResult<HashMap<UserId, String>> {
        Ok(self
            .directory
            .list()?
            .into_iter()
            .map(|a| (a.id, a.display_name))
            .collect())
    }

    fn render(&self, stem: &str, range: &DateRange, workbook: Workbook) -> AppResult<ExportFile> {
        let bytes = workbook.to_xlsx()?;
        tracing::info!(stem, range = %range.label(), bytes = bytes.len(), "report exported");
        Ok(ExportFile::xlsx(stem, &range.label(), bytes))
    }
}

/// Unknown users (e.g. removed accounts) fall back to their id.
fn name_of(names: &HashMap<UserId, String>, id: UserId) -> String {
    names.get(&id).cloned().unwrap_or_else(|| id.to_string())
}
