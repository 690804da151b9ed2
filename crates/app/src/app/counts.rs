use stockroom_auth::Identity;
use stockroom_auth::permissions::{COUNTS_COMPLETE, COUNTS_OPEN, COUNTS_READ, COUNTS_RECORD};
use stockroom_core::{CountDetailId, SparePartId, StockCountId};
use stockroom_infra::services::Completion;
use stockroom_stocktake::{CountFilter, StockCount};

use super::Application;
use super::errors::AppResult;
use crate::authz::require;

impl Application {
    pub async fn open_count(
        &self,
        caller: &impl Identity,
        part_ids: &[SparePartId],
        remarks: &str,
    ) -> AppResult<StockCount> {
        let principal = require(caller, &COUNTS_OPEN)?;
        Ok(self
            .services
            .counts()
            .open(part_ids, remarks, principal.user_id)
            .await?)
    }

    pub async fn record_count(
        &self,
        caller: &impl Identity,
        detail_id: CountDetailId,
        counted_quantity: i64,
        remarks: Option<String>,
    ) -> AppResult<StockCount> {
        require(caller, &COUNTS_RECORD)?;
        Ok(self
            .services
            .counts()
            .record(detail_id, counted_quantity, remarks)
            .await?)
    }

    pub async fn complete_count(
        &self,
        caller: &impl Identity,
        id: StockCountId,
    ) -> AppResult<Completion> {
        let principal = require(caller, &COUNTS_COMPLETE)?;
        Ok(self.services.counts().complete(id, principal.user_id).await?)
    }

    pub async fn count(&self, caller: &impl Identity, id: StockCountId) -> AppResult<StockCount> {
        require(caller, &COUNTS_READ)?;
        Ok(self.services.counts().get(id).await?)
    }

    pub async fn list_counts(
        &self,
        caller: &impl Identity,
        filter: CountFilter,
    ) -> AppResult<Vec<StockCount>> {
        require(caller, &COUNTS_READ)?;
        Ok(self.services.counts().list(&filter).await?)
    }
}
