use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{
    Aggregate, AggregateRoot, DomainError, DomainResult, Entity, RequestDetailId, RequestId,
    Shortage, SparePartId, UserId, ensure_max_len,
};

pub const REQUEST_NO_MAX: usize = 20;
pub const DEPARTMENT_MAX: usize = 50;
pub const REMARKS_MAX: usize = 500;
pub const LINE_REMARKS_MAX: usize = 200;
pub const REJECT_REASON_MAX: usize = 200;

/// Fieldless status, for filtering and reporting.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Issued,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 4] = [
        RequestStatus::Pending,
        RequestStatus::Approved,
        RequestStatus::Rejected,
        RequestStatus::Issued,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Rejected => "REJECTED",
            RequestStatus::Issued => "ISSUED",
        }
    }
}

impl core::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for RequestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown request status '{s}'")))
    }
}

/// Lifecycle state. Each variant carries the facts recorded on entering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    Pending,
    Approved {
        approver: UserId,
        approved_at: DateTime<Utc>,
    },
    Rejected {
        approver: UserId,
        rejected_at: DateTime<Utc>,
        reason: String,
    },
    Issued {
        approver: UserId,
        approved_at: DateTime<Utc>,
        issuer: UserId,
        issued_at: DateTime<Utc>,
    },
}

impl RequestState {
    pub fn status(&self) -> RequestStatus {
        match self {
            RequestState::Pending => RequestStatus::Pending,
            RequestState::Approved { .. } => RequestStatus::Approved,
            RequestState::Rejected { .. } => RequestStatus::Rejected,
            RequestState::Issued { .. } => RequestStatus::Issued,
        }
    }

    /// Approver, or the rejecting user for rejected requests.
    pub fn approver(&self) -> Option<UserId> {
        match self {
            RequestState::Pending => None,
            RequestState::Approved { approver, .. }
            | RequestState::Rejected { approver, .. }
            | RequestState::Issued { approver, .. } => Some(*approver),
        }
    }

    pub fn issuer(&self) -> Option<UserId> {
        match self {
            RequestState::Issued { issuer, .. } => Some(*issuer),
            _ => None,
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        match self {
            RequestState::Issued { issued_at, .. } => Some(*issued_at),
            _ => None,
        }
    }

    pub fn reject_reason(&self) -> Option<&str> {
        match self {
            RequestState::Rejected { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// One requested part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLine {
    pub id: RequestDetailId,
    pub part_id: SparePartId,
    pub requested_quantity: i64,
    pub approved_quantity: i64,
    pub issued_quantity: i64,
    pub remarks: String,
}

impl Entity for RequestLine {
    type Id = RequestDetailId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Line as submitted by the requester (detail id assigned by the store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDraft {
    pub detail_id: RequestDetailId,
    pub part_id: SparePartId,
    pub quantity: i64,
    pub remarks: String,
}

/// Stock to take out of one part on issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub part_id: SparePartId,
    pub quantity: i64,
}

/// Aggregate root: MaterialRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRequest {
    id: RequestId,
    request_no: String,
    requested_at: DateTime<Utc>,
    requester: Option<UserId>,
    department: String,
    remarks: String,
    lines: Vec<RequestLine>,
    state: RequestState,
    version: u64,
    created: bool,
}

impl MaterialRequest {
    /// Create an empty, not-yet-opened aggregate for an assigned id.
    pub fn empty(id: RequestId) -> Self {
        Self {
            id,
            request_no: String::new(),
            requested_at: DateTime::<Utc>::default(),
            requester: None,
            department: String::new(),
            remarks: String::new(),
            lines: Vec::new(),
            state: RequestState::Pending,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> RequestId {
        self.id
    }

    pub fn request_no(&self) -> &str {
        &self.request_no
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    pub fn requester(&self) -> Option<UserId> {
        self.requester
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    pub fn lines(&self) -> &[RequestLine] {
        &self.lines
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn status(&self) -> RequestStatus {
        self.state.status()
    }

    pub fn is_opened(&self) -> bool {
        self.created
    }

    /// Requesters see their own requests; supervisors see all of them.
    pub fn is_visible_to(&self, user: UserId, privileged: bool) -> bool {
        privileged || self.requester == Some(user)
    }

    /// Parts referenced by any line.
    pub fn part_ids(&self) -> impl Iterator<Item = SparePartId> + '_ {
        self.lines.iter().map(|l| l.part_id)
    }
}

impl AggregateRoot for MaterialRequest {
    type Id = RequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: OpenRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRequest {
    pub request_id: RequestId,
    pub request_no: String,
    pub requester: UserId,
    pub department: String,
    pub remarks: String,
    pub lines: Vec<LineDraft>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveRequest.
///
/// Lines missing from `approved_quantities` are approved as requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveRequest {
    pub request_id: RequestId,
    pub approver: UserId,
    pub approved_quantities: HashMap<RequestDetailId, i64>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectRequest {
    pub request_id: RequestId,
    pub approver: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: IssueRequest.
///
/// `on_hand` is the current quantity of every part the request references,
/// read in the same unit of work; a part missing from the map no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequest {
    pub request_id: RequestId,
    pub issuer: UserId,
    pub on_hand: BTreeMap<SparePartId, i64>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestCommand {
    Open(OpenRequest),
    Approve(ApproveRequest),
    Reject(RejectRequest),
    Issue(IssueRequest),
}

/// Event: RequestOpened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOpened {
    pub request_id: RequestId,
    pub request_no: String,
    pub requester: UserId,
    pub department: String,
    pub remarks: String,
    pub lines: Vec<RequestLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestApproved. Carries the resolved quantity of every line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestApproved {
    pub request_id: RequestId,
    pub approver: UserId,
    pub approved: Vec<(RequestDetailId, i64)>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRejected {
    pub request_id: RequestId,
    pub approver: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestIssued.
///
/// `withdrawals` holds one entry per part (lines for the same part are
/// summed), ordered by part id; parts approved at zero are left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIssued {
    pub request_id: RequestId,
    pub issuer: UserId,
    pub withdrawals: Vec<Withdrawal>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestEvent {
    Opened(RequestOpened),
    Approved(RequestApproved),
    Rejected(RequestRejected),
    Issued(RequestIssued),
}

impl Aggregate for MaterialRequest {
    type Command = RequestCommand;
    type Event = RequestEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            RequestEvent::Opened(e) => {
                self.id = e.request_id;
                self.request_no = e.request_no.clone();
                self.requested_at = e.occurred_at;
                self.requester = Some(e.requester);
                self.department = e.department.clone();
                self.remarks = e.remarks.clone();
                self.lines = e.lines.clone();
                self.state = RequestState::Pending;
                self.created = true;
            }
            RequestEvent::Approved(e) => {
                for (detail_id, quantity) in &e.approved {
                    if let Some(line) = self.lines.iter_mut().find(|l| l.id == *detail_id) {
                        line.approved_quantity = *quantity;
                    }
                }
                self.state = RequestState::Approved {
                    approver: e.approver,
                    approved_at: e.occurred_at,
                };
            }
            RequestEvent::Rejected(e) => {
                self.state = RequestState::Rejected {
                    approver: e.approver,
                    rejected_at: e.occurred_at,
                    reason: e.reason.clone(),
                };
            }
            RequestEvent::Issued(e) => {
                for line in &mut self.lines {
                    line.issued_quantity = line.approved_quantity;
                }
                let (approver, approved_at) = match self.state {
                    RequestState::Approved {
                        approver,
                        approved_at,
                    } => (approver, approved_at),
                    _ => (e.issuer, e.occurred_at),
                };
                self.state = RequestState::Issued {
                    approver,
                    approved_at,
                    issuer: e.issuer,
                    issued_at: e.occurred_at,
                };
            }
        }

        // +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            RequestCommand::Open(cmd) => self.handle_open(cmd),
            RequestCommand::Approve(cmd) => self.handle_approve(cmd),
            RequestCommand::Reject(cmd) => self.handle_reject(cmd),
            RequestCommand::Issue(cmd) => self.handle_issue(cmd),
        }
    }
}

impl MaterialRequest {
    fn ensure_opened(&self, request_id: RequestId) -> DomainResult<()> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != request_id {
            return Err(DomainError::invalid_id("request id mismatch"));
        }
        Ok(())
    }

    fn ensure_status(&self, expected: RequestStatus, action: &str) -> DomainResult<()> {
        if self.status() != expected {
            return Err(DomainError::invalid_state(format!(
                "only {expected} requests can be {action} (request {} is {})",
                self.request_no,
                self.status()
            )));
        }
        Ok(())
    }

    fn handle_open(&self, cmd: &OpenRequest) -> DomainResult<Vec<RequestEvent>> {
        if self.created {
            return Err(DomainError::conflict("request already exists"));
        }
        if cmd.request_no.trim().is_empty() {
            return Err(DomainError::validation("request number is required"));
        }
        ensure_max_len("request number", &cmd.request_no, REQUEST_NO_MAX)?;
        ensure_max_len("department", &cmd.department, DEPARTMENT_MAX)?;
        ensure_max_len("remarks", &cmd.remarks, REMARKS_MAX)?;

        if cmd.lines.is_empty() {
            return Err(DomainError::validation(
                "a request needs at least one line item",
            ));
        }
        let mut seen = HashSet::with_capacity(cmd.lines.len());
        for line in &cmd.lines {
            if !seen.insert(line.detail_id) {
                return Err(DomainError::validation(format!(
                    "duplicate line id {}",
                    line.detail_id
                )));
            }
            if line.quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "requested quantity for part {} must be positive",
                    line.part_id
                )));
            }
            ensure_max_len("line remarks", &line.remarks, LINE_REMARKS_MAX)?;
        }

        Ok(vec![RequestEvent::Opened(RequestOpened {
            request_id: cmd.request_id,
            request_no: cmd.request_no.trim().to_string(),
            requester: cmd.requester,
            department: cmd.department.trim().to_string(),
            remarks: cmd.remarks.clone(),
            lines: cmd
                .lines
                .iter()
                .map(|d| RequestLine {
                    id: d.detail_id,
                    part_id: d.part_id,
                    requested_quantity: d.quantity,
                    approved_quantity: 0,
                    issued_quantity: 0,
                    remarks: d.remarks.clone(),
                })
                .collect(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_approve(&self, cmd: &ApproveRequest) -> DomainResult<Vec<RequestEvent>> {
        self.ensure_opened(cmd.request_id)?;
        self.ensure_status(RequestStatus::Pending, "approved")?;

        let mut unknown: Vec<RequestDetailId> = cmd
            .approved_quantities
            .keys()
            .filter(|id| !self.lines.iter().any(|l| l.id == **id))
            .copied()
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            let ids: Vec<String> = unknown.iter().map(ToString::to_string).collect();
            return Err(DomainError::validation(format!(
                "request {} has no line(s) {}",
                self.request_no,
                ids.join(", ")
            )));
        }

        let mut approved = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            let quantity = cmd
                .approved_quantities
                .get(&line.id)
                .copied()
                .unwrap_or(line.requested_quantity);
            if quantity < 0 || quantity > line.requested_quantity {
                return Err(DomainError::validation(format!(
                    "approved quantity for line {} must be between 0 and {}",
                    line.id, line.requested_quantity
                )));
            }
            approved.push((line.id, quantity));
        }

        Ok(vec![RequestEvent::Approved(RequestApproved {
            request_id: cmd.request_id,
            approver: cmd.approver,
            approved,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject(&self, cmd: &RejectRequest) -> DomainResult<Vec<RequestEvent>> {
        self.ensure_opened(cmd.request_id)?;
        self.ensure_status(RequestStatus::Pending, "rejected")?;

        let reason = cmd.reason.trim();
        if reason.is_empty() {
            return Err(DomainError::validation("a reject reason is required"));
        }
        ensure_max_len("reject reason", reason, REJECT_REASON_MAX)?;

        Ok(vec![RequestEvent::Rejected(RequestRejected {
            request_id: cmd.request_id,
            approver: cmd.approver,
            reason: reason.to_string(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_issue(&self, cmd: &IssueRequest) -> DomainResult<Vec<RequestEvent>> {
        self.ensure_opened(cmd.request_id)?;
        self.ensure_status(RequestStatus::Approved, "issued")?;

        let mut required: BTreeMap<SparePartId, i64> = BTreeMap::new();
        for line in self.lines.iter().filter(|l| l.approved_quantity > 0) {
            *required.entry(line.part_id).or_default() += line.approved_quantity;
        }

        let shortages: Vec<Shortage> = required
            .iter()
            .filter_map(|(part_id, needed)| match cmd.on_hand.get(part_id) {
                Some(available) if available >= needed => None,
                available => Some(Shortage {
                    part_id: *part_id,
                    available: available.copied(),
                    required: *needed,
                }),
            })
            .collect();
        if !shortages.is_empty() {
            return Err(DomainError::InsufficientStock(shortages));
        }

        Ok(vec![RequestEvent::Issued(RequestIssued {
            request_id: cmd.request_id,
            issuer: cmd.issuer,
            withdrawals: required
                .into_iter()
                .map(|(part_id, quantity)| Withdrawal { part_id, quantity })
                .collect(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn line(detail: i64, part: i64, quantity: i64) -> LineDraft {
        LineDraft {
            detail_id: RequestDetailId::new(detail),
            part_id: SparePartId::new(part),
            quantity,
            remarks: String::new(),
        }
    }

    fn open_cmd(lines: Vec<LineDraft>) -> RequestCommand {
        RequestCommand::Open(OpenRequest {
            request_id: RequestId::new(1),
            request_no: "MR20250604001".to_string(),
            requester: UserId::new(),
            department: "Maintenance".to_string(),
            remarks: String::new(),
            lines,
            occurred_at: test_time(),
        })
    }

    fn opened(lines: Vec<LineDraft>) -> MaterialRequest {
        let (request, _) = MaterialRequest::empty(RequestId::new(1))
            .execute(&open_cmd(lines))
            .unwrap();
        request
    }

    fn approve_cmd(quantities: &[(i64, i64)]) -> RequestCommand {
        RequestCommand::Approve(ApproveRequest {
            request_id: RequestId::new(1),
            approver: UserId::new(),
            approved_quantities: quantities
                .iter()
                .map(|(d, q)| (RequestDetailId::new(*d), *q))
                .collect(),
            occurred_at: test_time(),
        })
    }

    fn issue_cmd(on_hand: &[(i64, i64)]) -> RequestCommand {
        RequestCommand::Issue(IssueRequest {
            request_id: RequestId::new(1),
            issuer: UserId::new(),
            on_hand: on_hand
                .iter()
                .map(|(p, q)| (SparePartId::new(*p), *q))
                .collect(),
            occurred_at: test_time(),
        })
    }

    fn approved(lines: Vec<LineDraft>, quantities: &[(i64, i64)]) -> MaterialRequest {
        let (request, _) = opened(lines).execute(&approve_cmd(quantities)).unwrap();
        request
    }

    #[test]
    fn open_requires_at_least_one_line() {
        let err = MaterialRequest::empty(RequestId::new(1))
            .handle(&open_cmd(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn open_rejects_non_positive_quantities() {
        let err = MaterialRequest::empty(RequestId::new(1))
            .handle(&open_cmd(vec![line(1, 1, 0)]))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn opened_request_is_pending() {
        let request = opened(vec![line(1, 10, 5)]);
        assert_eq!(request.status(), RequestStatus::Pending);
        assert_eq!(request.lines()[0].requested_quantity, 5);
        assert_eq!(request.lines()[0].approved_quantity, 0);
        assert_eq!(request.version(), 1);
    }

    #[test]
    fn approval_is_keyed_by_detail_id() {
        let request = approved(vec![line(1, 10, 5), line(2, 11, 8)], &[(2, 3)]);

        assert_eq!(request.status(), RequestStatus::Approved);
        assert_eq!(request.lines()[0].approved_quantity, 5);
        assert_eq!(request.lines()[1].approved_quantity, 3);
        assert!(request.state().approver().is_some());
    }

    #[test]
    fn approval_with_unknown_detail_is_rejected() {
        let request = opened(vec![line(1, 10, 5)]);
        match request.handle(&approve_cmd(&[(99, 1)])) {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("99")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn approval_cannot_exceed_requested() {
        let request = opened(vec![line(1, 10, 5)]);
        assert!(matches!(
            request.handle(&approve_cmd(&[(1, 6)])),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            request.handle(&approve_cmd(&[(1, -1)])),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn reject_records_reason_and_blocks_approval() {
        let request = opened(vec![line(1, 10, 5)]);
        let (request, _) = request
            .execute(&RequestCommand::Reject(RejectRequest {
                request_id: RequestId::new(1),
                approver: UserId::new(),
                reason: " budget frozen ".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap();

        assert_eq!(request.status(), RequestStatus::Rejected);
        assert_eq!(request.state().reject_reason(), Some("budget frozen"));
        assert!(matches!(
            request.handle(&approve_cmd(&[])),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn issuing_pending_request_fails() {
        let request = opened(vec![line(1, 10, 5)]);
        match request.handle(&issue_cmd(&[(10, 100)])) {
            Err(DomainError::InvalidState(msg)) => assert!(msg.contains("PENDING")),
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn issue_with_shortfall_reports_every_short_part() {
        let request = approved(vec![line(1, 10, 10), line(2, 11, 1), line(3, 12, 2)], &[]);
        let err = request
            .handle(&issue_cmd(&[(10, 5), (12, 2)]))
            .unwrap_err();

        match err {
            DomainError::InsufficientStock(shortages) => {
                assert_eq!(shortages.len(), 2);
                assert_eq!(shortages[0].part_id, SparePartId::new(10));
                assert_eq!(shortages[0].available, Some(5));
                assert_eq!(shortages[0].required, 10);
                assert_eq!(shortages[1].part_id, SparePartId::new(11));
                assert_eq!(shortages[1].available, None);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn issue_sums_lines_for_the_same_part() {
        let request = approved(vec![line(1, 10, 4), line(2, 10, 4)], &[]);
        assert!(matches!(
            request.handle(&issue_cmd(&[(10, 7)])),
            Err(DomainError::InsufficientStock(_))
        ));

        let events = request.handle(&issue_cmd(&[(10, 8)])).unwrap();
        match &events[0] {
            RequestEvent::Issued(e) => assert_eq!(
                e.withdrawals,
                vec![Withdrawal {
                    part_id: SparePartId::new(10),
                    quantity: 8
                }]
            ),
            other => panic!("expected Issued, got {other:?}"),
        }
    }

    #[test]
    fn lines_approved_at_zero_are_not_withdrawn() {
        let request = approved(vec![line(1, 10, 4), line(2, 11, 4)], &[(2, 0)]);
        let (request, events) = request.execute(&issue_cmd(&[(10, 4)])).unwrap();

        match &events[0] {
            RequestEvent::Issued(e) => assert_eq!(e.withdrawals.len(), 1),
            other => panic!("expected Issued, got {other:?}"),
        }
        assert_eq!(request.status(), RequestStatus::Issued);
        assert_eq!(request.lines()[0].issued_quantity, 4);
        assert_eq!(request.lines()[1].issued_quantity, 0);
        assert!(request.state().issuer().is_some());
        assert!(request.state().approver().is_some());
    }

    #[test]
    fn issued_request_cannot_be_issued_again() {
        let request = approved(vec![line(1, 10, 1)], &[]);
        let (request, _) = request.execute(&issue_cmd(&[(10, 1)])).unwrap();
        assert!(matches!(
            request.handle(&issue_cmd(&[(10, 100)])),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn visibility_is_limited_to_requester_unless_privileged() {
        let request = opened(vec![line(1, 10, 1)]);
        let requester = request.requester().unwrap();
        assert!(request.is_visible_to(requester, false));
        assert!(!request.is_visible_to(UserId::new(), false));
        assert!(request.is_visible_to(UserId::new(), true));
    }

    #[test]
    fn state_serializes_with_status_tag() {
        let json = serde_json::to_value(RequestState::Pending).unwrap();
        assert_eq!(json["status"], "PENDING");
        assert_eq!("issued".parse::<RequestStatus>().unwrap(), RequestStatus::Issued);
    }
}
