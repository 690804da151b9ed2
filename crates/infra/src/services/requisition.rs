use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use stockroom_core::{
    Aggregate, Clock, DocumentKind, DocumentNumber, ExpectedVersion, RequestDetailId, RequestId,
    SparePartId, UserId,
};
use stockroom_inventory::{
    AdjustQuantity, InventoryTransaction, PartCommand, SparePart, TransactionType, movements,
};
use stockroom_requisition::{
    ApproveRequest, IssueRequest, LineDraft, MaterialRequest, OpenRequest, RejectRequest,
    RequestCommand, RequestEvent, RequestFilter, RequestStatus, Withdrawal,
};

use super::{ServiceContext, ServiceError, ServiceResult, loaded};
use crate::store::{IdKind, Store, WriteBatch};

/// Input for a new material request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequest {
    pub department: String,
    pub remarks: String,
    pub lines: Vec<NewRequestLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequestLine {
    pub part_id: SparePartId,
    pub quantity: i64,
    #[serde(default)]
    pub remarks: String,
}

/// A committed issuance: the request in its `ISSUED` state and the `ADJUST` rows written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuance {
    pub request: MaterialRequest,
    pub transactions: Vec<InventoryTransaction>,
}

/// Material request workflow: create, approve, reject, issue.
#[derive(Clone)]
pub struct Requisitions {
    ctx: Arc<ServiceContext>,
}

impl Requisitions {
    pub(crate) fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    async fn load(&self, id: RequestId) -> ServiceResult<MaterialRequest> {
        self.ctx
            .store
            .get_request(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("request {id}")))
    }

    /// Open a `PENDING` request numbered `MR<YYYYMMDD><seq>` for today.
    #[tracing::instrument(skip(self, request), fields(lines = request.lines.len()))]
    pub async fn create(
        &self,
        request: NewRequest,
        requester: UserId,
    ) -> ServiceResult<MaterialRequest> {
        self.try_create(request, requester)
            .await
            .inspect_err(|e| e.log("requests.create"))
    }

    async fn try_create(
        &self,
        request: NewRequest,
        requester: UserId,
    ) -> ServiceResult<MaterialRequest> {
        if request.lines.is_empty() {
            return Err(ServiceError::Validation(
                "a request needs at least one line item".to_string(),
            ));
        }
        for line in &request.lines {
            self.ctx.load_part(line.part_id).await?;
        }

        let store = &self.ctx.store;
        let request_id = RequestId::new(store.next_id(IdKind::Request).await?);
        let mut lines = Vec::with_capacity(request.lines.len());
        for line in request.lines {
            lines.push(LineDraft {
                detail_id: RequestDetailId::new(store.next_id(IdKind::RequestDetail).await?),
                part_id: line.part_id,
                quantity: line.quantity,
                remarks: line.remarks,
            });
        }

        let now = self.ctx.clock.now();
        let day = now.date_naive();
        let kind = DocumentKind::MaterialRequest;
        let sequence = store.next_sequence(&kind.prefix(day)).await?;
        let request_no = DocumentNumber::new(kind, day, sequence)?.to_string();

        let (opened, _) =
            MaterialRequest::empty(request_id).execute(&RequestCommand::Open(OpenRequest {
                request_id,
                request_no,
                requester,
                department: request.department,
                remarks: request.remarks,
                lines,
                occurred_at: now,
            }))?;

        store
            .commit(WriteBatch::new().put_request(opened.clone(), ExpectedVersion::Absent))
            .await?;

        tracing::info!(
            request_no = opened.request_no(),
            requester = %requester,
            department = opened.department(),
            "material request created"
        );
        Ok(opened)
    }

    /// Approve a `PENDING` request.
    ///
    /// `approved_quantities` is keyed by line id; lines not in the map are
    /// approved at their requested quantity.
    #[tracing::instrument(skip(self, approved_quantities))]
    pub async fn approve(
        &self,
        id: RequestId,
        approved_quantities: HashMap<RequestDetailId, i64>,
        approver: UserId,
    ) -> ServiceResult<MaterialRequest> {
        self.try_approve(id, approved_quantities, approver)
            .await
            .inspect_err(|e| e.log("requests.approve"))
    }

    async fn try_approve(
        &self,
        id: RequestId,
        approved_quantities: HashMap<RequestDetailId, i64>,
        approver: UserId,
    ) -> ServiceResult<MaterialRequest> {
        let current = self.load(id).await?;
        let (approved, _) = current.execute(&RequestCommand::Approve(ApproveRequest {
            request_id: id,
            approver,
            approved_quantities,
            occurred_at: self.ctx.clock.now(),
        }))?;

        self.ctx
            .store
            .commit(WriteBatch::new().put_request(approved.clone(), loaded(&current)))
            .await?;

        tracing::info!(request_no = approved.request_no(), approver = %approver, "material request approved");
        Ok(approved)
    }

    #[tracing::instrument(skip(self, reason))]
    pub async fn reject(
        &self,
        id: RequestId,
        reason: &str,
        approver: UserId,
    ) -> ServiceResult<MaterialRequest> {
        self.try_reject(id, reason, approver)
            .await
            .inspect_err(|e| e.log("requests.reject"))
    }

    async fn try_reject(
        &self,
        id: RequestId,
        reason: &str,
        approver: UserId,
    ) -> ServiceResult<MaterialRequest> {
        let current = self.load(id).await?;
        let (rejected, _) = current.execute(&RequestCommand::Reject(RejectRequest {
            request_id: id,
            approver,
            reason: reason.to_string(),
            occurred_at: self.ctx.clock.now(),
        }))?;

        self.ctx
            .store
            .commit(WriteBatch::new().put_request(rejected.clone(), loaded(&current)))
            .await?;

        tracing::info!(request_no = rejected.request_no(), approver = %approver, "material request rejected");
        Ok(rejected)
    }

    /// Issue an `APPROVED` request: deduct every approved quantity with an
    /// `ADJUST` row referencing the request number, then mark it `ISSUED`.
    ///
    /// All-or-nothing: any shortfall fails the whole issuance before anything
    /// is written, and the parts and request are committed in one batch.
    #[tracing::instrument(skip(self))]
    pub async fn issue(&self, id: RequestId, issuer: UserId) -> ServiceResult<Issuance> {
        self.try_issue(id, issuer)
            .await
            .inspect_err(|e| e.log("requests.issue"))
    }

    async fn try_issue(&self, id: RequestId, issuer: UserId) -> ServiceResult<Issuance> {
        let current = self.load(id).await?;

        let mut parts: BTreeMap<SparePartId, SparePart> = BTreeMap::new();
        if current.status() == RequestStatus::Approved {
            for part_id in current.part_ids() {
                if parts.contains_key(&part_id) {
                    continue;
                }
                if let Some(part) = self.ctx.store.get_part(part_id).await? {
                    parts.insert(part_id, part);
                }
            }
        }
        let on_hand = parts
            .iter()
            .map(|(id, part)| (*id, part.quantity()))
            .collect();

        let now = self.ctx.clock.now();
        let (issued, events) = current.execute(&RequestCommand::Issue(IssueRequest {
            request_id: id,
            issuer,
            on_hand,
            occurred_at: now,
        }))?;

        let withdrawals: Vec<Withdrawal> = events
            .into_iter()
            .filter_map(|e| match e {
                RequestEvent::Issued(e) => Some(e.withdrawals),
                _ => None,
            })
            .flatten()
            .collect();

        let mut batch = WriteBatch::new();
        for withdrawal in withdrawals {
            let Some(part) = parts.get(&withdrawal.part_id) else {
                return Err(ServiceError::not_found(format!("part {}", withdrawal.part_id)));
            };
            let (deducted, part_events) = part.execute(&PartCommand::Adjust(AdjustQuantity {
                part_id: withdrawal.part_id,
                new_quantity: part.quantity() - withdrawal.quantity,
                kind: TransactionType::Adjust,
                reason: format!("Issued for {}", current.request_no()),
                reference_no: Some(current.request_no().to_string()),
                actor: issuer,
                occurred_at: now,
            }))?;
            batch = batch
                .put_part(deducted, loaded(part))
                .append(movements(&part_events));
        }
        batch = batch.put_request(issued.clone(), loaded(&current));

        let transactions = self.ctx.store.commit(batch).await?;

        tracing::info!(
            request_no = issued.request_no(),
            issuer = %issuer,
            transactions = transactions.len(),
            "material request issued"
        );
        Ok(Issuance {
            request: issued,
            transactions,
        })
    }

    pub async fn get(&self, id: RequestId) -> ServiceResult<MaterialRequest> {
        self.load(id).await
    }

    /// Requests matching the filter, newest first.
    pub async fn list(&self, filter: &RequestFilter) -> ServiceResult<Vec<MaterialRequest>> {
        Ok(self.ctx.store.list_requests(filter).await?)
    }

    pub async fn pending(&self) -> ServiceResult<Vec<MaterialRequest>> {
        self.list(&RequestFilter::with_status(RequestStatus::Pending))
            .await
    }

    pub async fn for_requester(&self, requester: UserId) -> ServiceResult<Vec<MaterialRequest>> {
        self.list(&RequestFilter::by_requester(requester)).await
    }
}
