use std::sync::Arc;

use chrono::{DateTime, Utc};

use stockroom_core::{Aggregate, Clock, ExpectedVersion, Page, PageRequest, SparePartId, UserId};
use stockroom_inventory::{
    AdjustQuantity, InventoryTransaction, PartCommand, PartDetails, PartSearch, RegisterPart,
    RetirePart, RevisePart, SparePart, TransactionFilter, TransactionType, movements,
};

use super::{ServiceContext, ServiceResult, loaded};
use crate::store::{IdKind, Store, WriteBatch};

/// Spare part registry and its transaction ledger.
#[derive(Clone)]
pub struct PartRegistry {
    ctx: Arc<ServiceContext>,
}

impl PartRegistry {
    pub(crate) fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Page size is capped at the configured maximum.
    pub async fn search(&self, mut search: PartSearch) -> ServiceResult<Page<SparePart>> {
        search.page = PageRequest::new(
            search.page.index,
            search.page.size,
            self.ctx.settings.max_page_size,
        );
        let page = self
            .ctx
            .store
            .search_parts(&search)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "part search failed"))?;
        Ok(page)
    }

    /// Every part in location order.
    pub async fn all(&self) -> ServiceResult<Vec<SparePart>> {
        Ok(self.ctx.store.list_parts().await?)
    }

    pub async fn get(&self, id: SparePartId) -> ServiceResult<SparePart> {
        self.ctx.load_part(id).await
    }

    #[tracing::instrument(skip(self, details), fields(category = %details.category))]
    pub async fn register(
        &self,
        details: PartDetails,
        quantity: i64,
        actor: UserId,
    ) -> ServiceResult<SparePart> {
        self.try_register(details, quantity, actor)
            .await
            .inspect_err(|e| e.log("parts.register"))
    }

    async fn try_register(
        &self,
        details: PartDetails,
        quantity: i64,
        actor: UserId,
    ) -> ServiceResult<SparePart> {
        // Validate before reserving an id.
        details.validate()?;
        let id = SparePartId::new(self.ctx.store.next_id(IdKind::Part).await?);

        let (part, events) = SparePart::empty(id).execute(&PartCommand::Register(RegisterPart {
            part_id: id,
            details,
            quantity,
            actor,
            occurred_at: self.ctx.clock.now(),
        }))?;

        self.ctx
            .store
            .commit(
                WriteBatch::new()
                    .put_part(part.clone(), ExpectedVersion::Absent)
                    .append(movements(&events)),
            )
            .await?;

        tracing::info!(part_id = %id, quantity, actor = %actor, "part registered");
        Ok(part)
    }

    #[tracing::instrument(skip(self, details))]
    pub async fn revise(
        &self,
        id: SparePartId,
        details: PartDetails,
        quantity: i64,
        actor: UserId,
    ) -> ServiceResult<SparePart> {
        self.try_revise(id, details, quantity, actor)
            .await
            .inspect_err(|e| e.log("parts.revise"))
    }

    async fn try_revise(
        &self,
        id: SparePartId,
        details: PartDetails,
        quantity: i64,
        actor: UserId,
    ) -> ServiceResult<SparePart> {
        let current = self.ctx.load_part(id).await?;
        let (part, events) = current.execute(&PartCommand::Revise(RevisePart {
            part_id: id,
            details,
            quantity,
            actor,
            occurred_at: self.ctx.clock.now(),
        }))?;

        self.ctx
            .store
            .commit(
                WriteBatch::new()
                    .put_part(part.clone(), loaded(&current))
                    .append(movements(&events)),
            )
            .await?;

        tracing::info!(
            part_id = %id,
            previous = current.quantity(),
            quantity = part.quantity(),
            actor = %actor,
            "part revised"
        );
        Ok(part)
    }

    /// Set a part's quantity with an `ADJUST` ledger row.
    ///
    /// Returns `None` when the quantity is already `new_quantity` (nothing written).
    #[tracing::instrument(skip(self, reason))]
    pub async fn adjust(
        &self,
        id: SparePartId,
        new_quantity: i64,
        reason: &str,
        actor: UserId,
    ) -> ServiceResult<Option<InventoryTransaction>> {
        self.try_adjust(id, new_quantity, reason, actor)
            .await
            .inspect_err(|e| e.log("parts.adjust"))
    }

    async fn try_adjust(
        &self,
        id: SparePartId,
        new_quantity: i64,
        reason: &str,
        actor: UserId,
    ) -> ServiceResult<Option<InventoryTransaction>> {
        let current = self.ctx.load_part(id).await?;
        let (part, events) = current.execute(&PartCommand::Adjust(AdjustQuantity {
            part_id: id,
            new_quantity,
            kind: TransactionType::Adjust,
            reason: reason.to_string(),
            reference_no: None,
            actor,
            occurred_at: self.ctx.clock.now(),
        }))?;
        if events.is_empty() {
            tracing::debug!(part_id = %id, quantity = new_quantity, "adjustment is a no-op");
            return Ok(None);
        }

        let rows = self
            .ctx
            .store
            .commit(
                WriteBatch::new()
                    .put_part(part, loaded(&current))
                    .append(movements(&events)),
            )
            .await?;

        tracing::info!(
            part_id = %id,
            previous = current.quantity(),
            quantity = new_quantity,
            actor = %actor,
            "part quantity adjusted"
        );
        Ok(rows.into_iter().next())
    }

    /// Zero the part with an `OUT` row (when it holds stock) and remove it.
    ///
    /// Fails with `Conflict` while any request or count still references the part.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: SparePartId, actor: UserId) -> ServiceResult<()> {
        self.try_delete(id, actor)
            .await
            .inspect_err(|e| e.log("parts.delete"))
    }

    async fn try_delete(&self, id: SparePartId, actor: UserId) -> ServiceResult<()> {
        let current = self.ctx.load_part(id).await?;
        let (_, events) = current.execute(&PartCommand::Retire(RetirePart {
            part_id: id,
            actor,
            occurred_at: self.ctx.clock.now(),
        }))?;

        self.ctx
            .store
            .commit(
                WriteBatch::new()
                    .append(movements(&events))
                    .remove_part(id, loaded(&current)),
            )
            .await?;

        tracing::info!(part_id = %id, quantity = current.quantity(), actor = %actor, "part deleted");
        Ok(())
    }

    /// Ledger rows of one part, newest first. Rows outlive the part itself.
    pub async fn history(&self, id: SparePartId) -> ServiceResult<Vec<InventoryTransaction>> {
        Ok(self
            .ctx
            .store
            .list_transactions(&TransactionFilter::for_part(id))
            .await?)
    }

    pub async fn recent(&self, count: usize) -> ServiceResult<Vec<InventoryTransaction>> {
        Ok(self
            .ctx
            .store
            .list_transactions(&TransactionFilter::recent(count))
            .await?)
    }

    /// All ledger rows in `[from, until)`, newest first. Open bounds are unbounded.
    pub async fn transactions(
        &self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> ServiceResult<Vec<InventoryTransaction>> {
        let filter = TransactionFilter {
            from,
            until,
            ..TransactionFilter::default()
        };
        Ok(self.ctx.store.list_transactions(&filter).await?)
    }
}
