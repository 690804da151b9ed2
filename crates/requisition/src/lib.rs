//! Material request (requisition) domain.
//!
//! Business rules for the request → approval → issuance lifecycle,
//! implemented purely as deterministic domain logic (no IO, no storage).
//! Issuance decides which withdrawals to make; the caller turns them into
//! ledger movements on the affected parts.

pub mod filter;
pub mod request;

pub use filter::{RequestFilter, newest_first};
pub use request::{
    ApproveRequest, IssueRequest, LineDraft, MaterialRequest, OpenRequest, RejectRequest,
    RequestApproved, RequestCommand, RequestEvent, RequestIssued, RequestLine, RequestOpened,
    RequestRejected, RequestState, RequestStatus, Withdrawal,
};
