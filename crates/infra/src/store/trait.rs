use std::sync::Arc;

use thiserror::Error;

use stockroom_core::{
    CountDetailId, ExpectedVersion, Page, RequestId, SparePartId, StockCountId,
};
use stockroom_inventory::{
    InventoryTransaction, PartSearch, SparePart, StockMovement, TransactionFilter,
};
use stockroom_requisition::{MaterialRequest, RequestFilter};
use stockroom_stocktake::{CountFilter, StockCount};

/// Store operation error.
///
/// These are infrastructure failures, as opposed to domain errors
/// (validation, invalid state) which never reach the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Optimistic concurrency check failed or a unique key is taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A write would break a referential rule (e.g. removing a referenced part).
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The backend could not be reached or failed mid-operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Identifier sequences handed out by the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IdKind {
    Part,
    Request,
    RequestDetail,
    Count,
    CountDetail,
}

/// One record-level write inside a batch.
#[derive(Debug, Clone)]
pub enum Write {
    PutPart {
        part: SparePart,
        expected: ExpectedVersion,
    },
    /// Delete the part row. Its ledger rows stay.
    RemovePart {
        id: SparePartId,
        expected: ExpectedVersion,
    },
    /// Append a ledger row; the store assigns the transaction id.
    AppendTransaction(StockMovement),
    PutRequest {
        request: MaterialRequest,
        expected: ExpectedVersion,
    },
    PutCount {
        count: StockCount,
        expected: ExpectedVersion,
    },
}

/// Writes committed atomically, in order.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_part(mut self, part: SparePart, expected: ExpectedVersion) -> Self {
        self.writes.push(Write::PutPart { part, expected });
        self
    }

    pub fn remove_part(mut self, id: SparePartId, expected: ExpectedVersion) -> Self {
        self.writes.push(Write::RemovePart { id, expected });
        self
    }

    pub fn append(mut self, movements: impl IntoIterator<Item = StockMovement>) -> Self {
        self.writes
            .extend(movements.into_iter().map(Write::AppendTransaction));
        self
    }

    pub fn put_request(mut self, request: MaterialRequest, expected: ExpectedVersion) -> Self {
        self.writes.push(Write::PutRequest { request, expected });
        self
    }

    pub fn put_count(mut self, count: StockCount, expected: ExpectedVersion) -> Self {
        self.writes.push(Write::PutCount { count, expected });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// Record store for parts, the transaction ledger, requests and counts.
///
/// Implementations must:
/// - check every `ExpectedVersion` in a batch against the stored version
/// - keep request and count numbers unique
/// - refuse to remove a part that a request line or count detail references
/// - apply a batch atomically (all writes or none)
/// - assign transaction ids in commit order
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn get_part(&self, id: SparePartId) -> StoreResult<Option<SparePart>>;

    /// Parts matching the search, in location order, sliced to the requested page.
    async fn search_parts(&self, search: &PartSearch) -> StoreResult<Page<SparePart>>;

    /// Every part in location order.
    async fn list_parts(&self) -> StoreResult<Vec<SparePart>>;

    /// Ledger rows matching the filter, newest first, truncated to `filter.limit`.
    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<InventoryTransaction>>;

    async fn get_request(&self, id: RequestId) -> StoreResult<Option<MaterialRequest>>;

    /// Requests matching the filter, newest first.
    async fn list_requests(&self, filter: &RequestFilter) -> StoreResult<Vec<MaterialRequest>>;

    async fn get_count(&self, id: StockCountId) -> StoreResult<Option<StockCount>>;

    /// The count owning a detail line.
    async fn find_count_by_detail(&self, id: CountDetailId) -> StoreResult<Option<StockCount>>;

    /// Counts matching the filter, newest first.
    async fn list_counts(&self, filter: &CountFilter) -> StoreResult<Vec<StockCount>>;

    /// Reserve the next identifier of a kind.
    async fn next_id(&self, kind: IdKind) -> StoreResult<i64>;

    /// Reserve the next document sequence under a prefix such as `MR20250604`.
    ///
    /// Starts above the highest suffix already stored under the prefix; two
    /// concurrent callers never receive the same value.
    async fn next_sequence(&self, prefix: &str) -> StoreResult<u32>;

    /// Apply a batch atomically and return the ledger rows it appended.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<Vec<InventoryTransaction>>;
}

#[async_trait::async_trait]
impl<S> Store for Arc<S>
where
    S: Store + ?Sized,
{
    async fn get_part(&self, id: SparePartId) -> StoreResult<Option<SparePart>> {
        (**self).get_part(id).await
    }

    async fn search_parts(&self, search: &PartSearch) -> StoreResult<Page<SparePart>> {
        (**self).search_parts(search).await
    }

    async fn list_parts(&self) -> StoreResult<Vec<SparePart>> {
        (**self).list_parts().await
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<InventoryTransaction>> {
        (**self).list_transactions(filter).await
    }

    async fn get_request(&self, id: RequestId) -> StoreResult<Option<MaterialRequest>> {
        (**self).get_request(id).await
    }

    async fn list_requests(&self, filter: &RequestFilter) -> StoreResult<Vec<MaterialRequest>> {
        (**self).list_requests(filter).await
    }

    async fn get_count(&self, id: StockCountId) -> StoreResult<Option<StockCount>> {
        (**self).get_count(id).await
    }

    async fn find_count_by_detail(&self, id: CountDetailId) -> StoreResult<Option<StockCount>> {
        (**self).find_count_by_detail(id).await
    }

    async fn list_counts(&self, filter: &CountFilter) -> StoreResult<Vec<StockCount>> {
        (**self).list_counts(filter).await
    }

    async fn next_id(&self, kind: IdKind) -> StoreResult<i64> {
        (**self).next_id(kind).await
    }

    async fn next_sequence(&self, prefix: &str) -> StoreResult<u32> {
        (**self).next_sequence(prefix).await
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<Vec<InventoryTransaction>> {
        (**self).commit(batch).await
    }
}
