use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::UserId;

use crate::request::{MaterialRequest, RequestStatus};

/// Request listing criteria. Results are returned newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub requester: Option<UserId>,
    /// Inclusive lower bound on the request date.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the request date.
    pub until: Option<DateTime<Utc>>,
}

impl RequestFilter {
    pub fn with_status(status: RequestStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn by_requester(requester: UserId) -> Self {
        Self {
            requester: Some(requester),
            ..Self::default()
        }
    }

    pub fn matches(&self, request: &MaterialRequest) -> bool {
        self.status.is_none_or(|s| request.status() == s)
            && self
                .requester
                .is_none_or(|r| request.requester() == Some(r))
            && self.from.is_none_or(|from| request.requested_at() >= from)
            && self.until.is_none_or(|until| request.requested_at() < until)
    }
}

/// Newest request first, then by id descending.
pub fn newest_first(a: &MaterialRequest, b: &MaterialRequest) -> Ordering {
    b.requested_at()
        .cmp(&a.requested_at())
        .then_with(|| b.id_typed().cmp(&a.id_typed()))
}
