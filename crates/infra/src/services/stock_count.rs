use std::collections::HashSet;
use std::sync::Arc;

use stockroom_core::{
    Aggregate, Clock, CountDetailId, DocumentKind, DocumentNumber, ExpectedVersion, SparePartId,
    StockCountId, UserId,
};
use stockroom_inventory::{
    AdjustQuantity, InventoryTransaction, PartCommand, TransactionType, movements,
};
use stockroom_stocktake::{
    CompleteCount, CountCommand, CountEvent, CountFilter, CountLineDraft, CountStatus, OpenCount,
    RecordCount, StockCount,
};

use super::{ServiceContext, ServiceError, ServiceResult, loaded};
use crate::store::{IdKind, Store, WriteBatch};

/// A committed count completion and the corrective `ADJUST` rows it wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub count: StockCount,
    pub transactions: Vec<InventoryTransaction>,
}

/// Stock count reconciliation: open, record, complete.
#[derive(Clone)]
pub struct StockCounts {
    ctx: Arc<ServiceContext>,
}

impl StockCounts {
    pub(crate) fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    async fn load(&self, id: StockCountId) -> ServiceResult<StockCount> {
        self.ctx
            .store
            .get_count(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("count {id}")))
    }

    /// Open an `IN_PROGRESS` count numbered `SC<YYYYMMDD><seq>`, snapshotting
    /// each part's current quantity.
    ///
    /// Duplicate ids are collapsed and ids of parts that no longer exist are
    /// skipped; at least one existing part is required.
    #[tracing::instrument(skip(self, part_ids, remarks), fields(parts = part_ids.len()))]
    pub async fn open(
        &self,
        part_ids: &[SparePartId],
        remarks: &str,
        counter: UserId,
    ) -> ServiceResult<StockCount> {
        self.try_open(part_ids, remarks, counter)
            .await
            .inspect_err(|e| e.log("counts.open"))
    }

    async fn try_open(
        &self,
        part_ids: &[SparePartId],
        remarks: &str,
        counter: UserId,
    ) -> ServiceResult<StockCount> {
        let store = &self.ctx.store;

        let mut seen = HashSet::with_capacity(part_ids.len());
        let mut snapshot = Vec::with_capacity(part_ids.len());
        for &part_id in part_ids {
            if !seen.insert(part_id) {
                continue;
            }
            match store.get_part(part_id).await? {
                Some(part) => snapshot.push((part_id, part.quantity())),
                None => tracing::warn!(part_id = %part_id, "skipping unknown part"),
            }
        }
        if snapshot.is_empty() {
            return Err(ServiceError::Validation(
                "a count needs at least one existing part".to_string(),
            ));
        }

        let count_id = StockCountId::new(store.next_id(IdKind::Count).await?);
        let mut lines = Vec::with_capacity(snapshot.len());
        for (part_id, system_quantity) in snapshot {
            lines.push(CountLineDraft {
                detail_id: CountDetailId::new(store.next_id(IdKind::CountDetail).await?),
                part_id,
                system_quantity,
            });
        }

        let now = self.ctx.clock.now();
        let day = now.date_naive();
        let kind = DocumentKind::StockCount;
        let sequence = store.next_sequence(&kind.prefix(day)).await?;
        let count_no = DocumentNumber::new(kind, day, sequence)?.to_string();

        let (opened, _) = StockCount::empty(count_id).execute(&CountCommand::Open(OpenCount {
            count_id,
            count_no,
            counter,
            remarks: remarks.to_string(),
            lines,
            occurred_at: now,
        }))?;

        store
            .commit(WriteBatch::new().put_count(opened.clone(), ExpectedVersion::Absent))
            .await?;

        tracing::info!(
            count_no = opened.count_no(),
            counter = %counter,
            lines = opened.details().len(),
            "stock count opened"
        );
        Ok(opened)
    }

    /// Record the counted quantity of one detail line.
    #[tracing::instrument(skip(self, remarks))]
    pub async fn record(
        &self,
        detail_id: CountDetailId,
        counted_quantity: i64,
        remarks: Option<String>,
    ) -> ServiceResult<StockCount> {
        self.try_record(detail_id, counted_quantity, remarks)
            .await
            .inspect_err(|e| e.log("counts.record"))
    }

    async fn try_record(
        &self,
        detail_id: CountDetailId,
        counted_quantity: i64,
        remarks: Option<String>,
    ) -> ServiceResult<StockCount> {
        let current = self
            .ctx
            .store
            .find_count_by_detail(detail_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("count detail {detail_id}")))?;

        let (counted, _) = current.execute(&CountCommand::Record(RecordCount {
            count_id: current.id_typed(),
            detail_id,
            counted_quantity,
            remarks,
            occurred_at: self.ctx.clock.now(),
        }))?;

        self.ctx
            .store
            .commit(WriteBatch::new().put_count(counted.clone(), loaded(&current)))
            .await?;

        tracing::info!(count_no = counted.count_no(), detail_id = %detail_id, counted_quantity, "count recorded");
        Ok(counted)
    }

    /// Complete an `IN_PROGRESS` count: every line whose counted quantity
    /// differs from its snapshot sets the part to the counted quantity with an
    /// `ADJUST` row referencing the count number.
    #[tracing::instrument(skip(self))]
    pub async fn complete(&self, id: StockCountId, actor: UserId) -> ServiceResult<Completion> {
        self.try_complete(id, actor)
            .await
            .inspect_err(|e| e.log("counts.complete"))
    }

    async fn try_complete(&self, id: StockCountId, actor: UserId) -> ServiceResult<Completion> {
        let current = self.load(id).await?;
        let now = self.ctx.clock.now();
        let (completed, events) = current.execute(&CountCommand::Complete(CompleteCount {
            count_id: id,
            actor,
            occurred_at: now,
        }))?;

        let corrections = events.into_iter().flat_map(|e| match e {
            CountEvent::Completed(e) => e.corrections,
            _ => Vec::new(),
        });

        let count_no = current.count_no();
        let mut batch = WriteBatch::new();
        for correction in corrections {
            let Some(part) = self.ctx.store.get_part(correction.part_id).await? else {
                tracing::warn!(
                    count_no,
                    part_id = %correction.part_id,
                    "counted part no longer exists; no correction written"
                );
                continue;
            };
            // The part may have moved since the snapshot; it still ends at the
            // counted quantity, and an already-matching part writes nothing.
            let (adjusted, part_events) = part.execute(&PartCommand::Adjust(AdjustQuantity {
                part_id: correction.part_id,
                new_quantity: correction.counted_quantity,
                kind: TransactionType::Adjust,
                reason: format!("Stock count {count_no} adjustment"),
                reference_no: Some(count_no.to_string()),
                actor,
                occurred_at: now,
            }))?;
            if part_events.is_empty() {
                continue;
            }
            batch = batch
                .put_part(adjusted, loaded(&part))
                .append(movements(&part_events));
        }
        batch = batch.put_count(completed.clone(), loaded(&current));

        let transactions = self.ctx.store.commit(batch).await?;

        tracing::info!(
            count_no,
            actor = %actor,
            transactions = transactions.len(),
            "stock count completed"
        );
        Ok(Completion {
            count: completed,
            transactions,
        })
    }

    pub async fn get(&self, id: StockCountId) -> ServiceResult<StockCount> {
        self.load(id).await
    }

    /// Counts matching the filter, newest first.
    pub async fn list(&self, filter: &CountFilter) -> ServiceResult<Vec<StockCount>> {
        Ok(self.ctx.store.list_counts(filter).await?)
    }

    pub async fn in_progress(&self) -> ServiceResult<Vec<StockCount>> {
        self.list(&CountFilter::with_status(CountStatus::InProgress))
            .await
    }

    pub async fn completed(&self) -> ServiceResult<Vec<StockCount>> {
        self.list(&CountFilter::with_status(CountStatus::Completed))
            .await
    }
}
