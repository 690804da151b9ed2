use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use stockroom_core::{
    AggregateRoot, CountDetailId, DocumentNumber, ExpectedVersion, Page, RequestId, SparePartId,
    StockCountId, TransactionId,
};
use stockroom_inventory::{
    InventoryTransaction, PartSearch, SparePart, TransactionFilter, location_order,
};
use stockroom_requisition::{MaterialRequest, RequestFilter};
use stockroom_stocktake::{CountFilter, StockCount};

use super::r#trait::{IdKind, Store, StoreError, StoreResult, Write, WriteBatch};

#[derive(Debug, Clone, Default)]
struct State {
    parts: BTreeMap<SparePartId, SparePart>,
    transactions: Vec<InventoryTransaction>,
    requests: BTreeMap<RequestId, MaterialRequest>,
    counts: BTreeMap<StockCountId, StockCount>,
    ids: HashMap<IdKind, i64>,
    sequences: HashMap<String, u32>,
}

impl State {
    fn check(
        what: &str,
        expected: ExpectedVersion,
        actual: Option<u64>,
    ) -> StoreResult<()> {
        if expected.matches(actual) {
            Ok(())
        } else {
            Err(StoreError::Conflict(format!(
                "{what}: expected {expected:?}, found {actual:?}"
            )))
        }
    }

    fn apply(&mut self, write: Write, appended: &mut Vec<InventoryTransaction>) -> StoreResult<()> {
        match write {
            Write::PutPart { part, expected } => {
                let id = part.id_typed();
                Self::check(
                    &format!("part {id}"),
                    expected,
                    self.parts.get(&id).map(|r| r.version()),
                )?;
                self.parts.insert(id, part);
            }
            Write::RemovePart { id, expected } => {
                Self::check(
                    &format!("part {id}"),
                    expected,
                    self.parts.get(&id).map(|r| r.version()),
                )?;
                if let Some(request) = self
                    .requests
                    .values()
                    .find(|r| r.part_ids().any(|p| p == id))
                {
                    return Err(StoreError::Constraint(format!(
                        "part {id} is referenced by request {}",
                        request.request_no()
                    )));
                }
                if let Some(count) = self.counts.values().find(|c| c.part_ids().any(|p| p == id)) {
                    return Err(StoreError::Constraint(format!(
                        "part {id} is referenced by count {}",
                        count.count_no()
                    )));
                }
                self.parts.remove(&id);
            }
            Write::AppendTransaction(movement) => {
                let id = TransactionId::new(self.transactions.len() as i64 + 1);
                let txn = InventoryTransaction::commit(id, movement);
                self.transactions.push(txn.clone());
                appended.push(txn);
            }
            Write::PutRequest { request, expected } => {
                let id = request.id_typed();
                Self::check(
                    &format!("request {id}"),
                    expected,
                    self.requests.get(&id).map(|r| r.version()),
                )?;
                if self
                    .requests
                    .values()
                    .any(|r| r.id_typed() != id && r.request_no() == request.request_no())
                {
                    return Err(StoreError::Conflict(format!(
                        "request number {} is already taken",
                        request.request_no()
                    )));
                }
                self.requests.insert(id, request);
            }
            Write::PutCount { count, expected } => {
                let id = count.id_typed();
                Self::check(
                    &format!("count {id}"),
                    expected,
                    self.counts.get(&id).map(|r| r.version()),
                )?;
                if self
                    .counts
                    .values()
                    .any(|c| c.id_typed() != id && c.count_no() == count.count_no())
                {
                    return Err(StoreError::Conflict(format!(
                        "count number {} is already taken",
                        count.count_no()
                    )));
                }
                self.counts.insert(id, count);
            }
        }
        Ok(())
    }

    fn highest_sequence(&self, prefix: &str) -> u32 {
        let requests = self.requests.values().map(MaterialRequest::request_no);
        let counts = self.counts.values().map(StockCount::count_no);
        requests
            .chain(counts)
            .filter_map(|no| DocumentNumber::sequence_under(prefix, no))
            .max()
            .unwrap_or(0)
    }
}

/// In-memory record store.
///
/// Intended for tests/dev. Not optimized for performance: a commit clones the
/// whole state, applies the batch to the copy and swaps it in only if every
/// write succeeded.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> StoreResult<T> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(f(&state))
    }

    fn write<T>(&self, f: impl FnOnce(&mut State) -> StoreResult<T>) -> StoreResult<T> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        f(&mut state)
    }
}

#[async_trait::async_trait]
impl Store for InMemoryStore {
    async fn get_part(&self, id: SparePartId) -> StoreResult<Option<SparePart>> {
        self.read(|s| s.parts.get(&id).cloned())
    }

    async fn search_parts(&self, search: &PartSearch) -> StoreResult<Page<SparePart>> {
        let mut matches = self.read(|s| {
            s.parts
                .values()
                .filter(|p| search.matches(p))
                .cloned()
                .collect::<Vec<_>>()
        })?;
        matches.sort_by(location_order);
        Ok(Page::from_sorted(matches, search.page))
    }

    async fn list_parts(&self) -> StoreResult<Vec<SparePart>> {
        let mut parts = self.read(|s| s.parts.values().cloned().collect::<Vec<_>>())?;
        parts.sort_by(location_order);
        Ok(parts)
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<InventoryTransaction>> {
        let mut rows = self.read(|s| {
            s.transactions
                .iter()
                .filter(|t| filter.matches(t))
                .cloned()
                .collect::<Vec<_>>()
        })?;
        rows.sort_by(stockroom_inventory::newest_first);
        if let Some(limit) = filter.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn get_request(&self, id: RequestId) -> StoreResult<Option<MaterialRequest>> {
        self.read(|s| s.requests.get(&id).cloned())
    }

    async fn list_requests(&self, filter: &RequestFilter) -> StoreResult<Vec<MaterialRequest>> {
        let mut requests = self.read(|s| {
            s.requests
                .values()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect::<Vec<_>>()
        })?;
        requests.sort_by(stockroom_requisition::newest_first);
        Ok(requests)
    }

    async fn get_count(&self, id: StockCountId) -> StoreResult<Option<StockCount>> {
        self.read(|s| s.counts.get(&id).cloned())
    }

    async fn find_count_by_detail(&self, id: CountDetailId) -> StoreResult<Option<StockCount>> {
        self.read(|s| {
            s.counts
                .values()
                .find(|c| c.detail(id).is_some())
                .cloned()
        })
    }

    async fn list_counts(&self, filter: &CountFilter) -> StoreResult<Vec<StockCount>> {
        let mut counts = self.read(|s| {
            s.counts
                .values()
                .filter(|c| filter.matches(c))
                .cloned()
                .collect::<Vec<_>>()
        })?;
        counts.sort_by(stockroom_stocktake::newest_first);
        Ok(counts)
    }

    async fn next_id(&self, kind: IdKind) -> StoreResult<i64> {
        self.write(|s| {
            let next = s.ids.entry(kind).or_insert(0);
            *next += 1;
            Ok(*next)
        })
    }

    async fn next_sequence(&self, prefix: &str) -> StoreResult<u32> {
        self.write(|s| {
            let floor = s.highest_sequence(prefix);
            let current = s.sequences.entry(prefix.to_string()).or_insert(0);
            *current = (*current).max(floor) + 1;
            Ok(*current)
        })
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<Vec<InventoryTransaction>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        self.write(|s| {
            let mut next = s.clone();
            let mut appended = Vec::new();
            for write in batch.into_writes() {
                next.apply(write, &mut appended)?;
            }
            *s = next;
            Ok(appended)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use stockroom_core::{Aggregate, RequestDetailId, UserId};
    use stockroom_inventory::{PartCommand, PartDetails, RegisterPart, movements};
    use stockroom_requisition::{LineDraft, OpenRequest, RequestCommand};

    fn register(id: i64, quantity: i64) -> (SparePart, WriteBatch) {
        let id = SparePartId::new(id);
        let (part, events) = SparePart::empty(id)
            .execute(&PartCommand::Register(RegisterPart {
                part_id: id,
                details: PartDetails {
                    plant: "P1".to_string(),
                    description: "Bearing".to_string(),
                    ..PartDetails::default()
                },
                quantity,
                actor: UserId::new(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        let batch = WriteBatch::new()
            .put_part(part.clone(), ExpectedVersion::Absent)
            .append(movements(&events));
        (part, batch)
    }

    fn request(id: i64, no: &str, part: i64) -> MaterialRequest {
        let (r, _) = MaterialRequest::empty(RequestId::new(id))
            .execute(&RequestCommand::Open(OpenRequest {
                request_id: RequestId::new(id),
                request_no: no.to_string(),
                requester: UserId::new(),
                department: "Maintenance".to_string(),
                remarks: String::new(),
                lines: vec![LineDraft {
                    detail_id: RequestDetailId::new(id),
                    part_id: SparePartId::new(part),
                    quantity: 1,
                    remarks: String::new(),
                }],
                occurred_at: Utc::now(),
            }))
            .unwrap();
        r
    }

    #[tokio::test]
    async fn commit_assigns_sequential_transaction_ids() {
        let store = InMemoryStore::new();
        let (_, batch) = register(1, 10);
        let rows = store.commit(batch).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, TransactionId::new(1));

        let (_, batch) = register(2, 0);
        let rows = store.commit(batch).await.unwrap();
        assert_eq!(rows[0].id, TransactionId::new(2));
    }

    #[tokio::test]
    async fn failed_batch_leaves_no_partial_writes() {
        let store = InMemoryStore::new();
        let (part, batch) = register(1, 10);
        store.commit(batch).await.unwrap();

        // The trailing write carries a stale expectation.
        let (other, batch) = register(2, 5);
        let batch = batch.put_part(part, ExpectedVersion::Exact(99));

        let err = store.commit(batch).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(store.get_part(other.id_typed()).await.unwrap().is_none());
        let rows = store
            .list_transactions(&TransactionFilter::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn referenced_part_cannot_be_removed() {
        let store = InMemoryStore::new();
        let (part, batch) = register(1, 10);
        store.commit(batch).await.unwrap();
        store
            .commit(WriteBatch::new().put_request(
                request(1, "MR20250604001", 1),
                ExpectedVersion::Absent,
            ))
            .await
            .unwrap();

        let err = store
            .commit(WriteBatch::new().remove_part(
                part.id_typed(),
                ExpectedVersion::Exact(part.version()),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn request_numbers_are_unique() {
        let store = InMemoryStore::new();
        store
            .commit(
                WriteBatch::new()
                    .put_request(request(1, "MR20250604001", 1), ExpectedVersion::Absent),
            )
            .await
            .unwrap();
        let err = store
            .commit(
                WriteBatch::new()
                    .put_request(request(2, "MR20250604001", 1), ExpectedVersion::Absent),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn sequences_continue_above_stored_numbers() {
        let store = InMemoryStore::new();
        store
            .commit(
                WriteBatch::new()
                    .put_request(request(1, "MR20250604007", 1), ExpectedVersion::Absent),
            )
            .await
            .unwrap();

        assert_eq!(store.next_sequence("MR20250604").await.unwrap(), 8);
        assert_eq!(store.next_sequence("MR20250604").await.unwrap(), 9);
        assert_eq!(store.next_sequence("MR20250605").await.unwrap(), 1);
    }

    proptest! {
        /// Property: each prefix hands out 1, 2, 3, ... however calls interleave.
        #[test]
        fn sequences_count_up_per_prefix(picks in proptest::collection::vec(0usize..3, 1..40)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let prefixes = ["MR20250604", "MR20250605", "SC20250604"];
            let store = InMemoryStore::new();
            let mut issued = [0u32; 3];
            for pick in picks {
                let seq = runtime.block_on(store.next_sequence(prefixes[pick])).unwrap();
                issued[pick] += 1;
                prop_assert_eq!(seq, issued[pick]);
            }
        }
    }
}
