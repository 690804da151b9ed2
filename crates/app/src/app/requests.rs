use std::collections::HashMap;

use stockroom_auth::Identity;
use stockroom_auth::permissions::{
    REQUESTS_APPROVE, REQUESTS_CREATE, REQUESTS_ISSUE, REQUESTS_READ,
};
use stockroom_core::{RequestDetailId, RequestId};
use stockroom_infra::services::{Issuance, NewRequest};
use stockroom_requisition::{MaterialRequest, RequestFilter};

use super::Application;
use super::errors::AppResult;
use crate::authz::{ensure_visible, require, sees_all_requests};

impl Application {
    pub async fn create_request(
        &self,
        caller: &impl Identity,
        request: NewRequest,
    ) -> AppResult<MaterialRequest> {
        let principal = require(caller, &REQUESTS_CREATE)?;
        Ok(self
            .services
            .requisitions()
            .create(request, principal.user_id)
            .await?)
    }

    /// Requests matching `filter`. Callers who may not read other users'
    /// requests only ever see their own, whatever the filter says.
    pub async fn list_requests(
        &self,
        caller: &impl Identity,
        mut filter: RequestFilter,
    ) -> AppResult<Vec<MaterialRequest>> {
        let principal = require(caller, &REQUESTS_READ)?;
        if !sees_all_requests(&principal) {
            filter.requester = Some(principal.user_id);
        }
        Ok(self.services.requisitions().list(&filter).await?)
    }

    pub async fn my_requests(&self, caller: &impl Identity) -> AppResult<Vec<MaterialRequest>> {
        let principal = require(caller, &REQUESTS_READ)?;
        Ok(self
            .services
            .requisitions()
            .for_requester(principal.user_id)
            .await?)
    }

    /// Pending requests awaiting a decision.
    pub async fn pending_requests(&self, caller: &impl Identity) -> AppResult<Vec<MaterialRequest>> {
        require(caller, &REQUESTS_APPROVE)?;
        Ok(self.services.requisitions().pending().await?)
    }

    pub async fn request(&self, caller: &impl Identity, id: RequestId) -> AppResult<MaterialRequest> {
        let principal = require(caller, &REQUESTS_READ)?;
        let request = self.services.requisitions().get(id).await?;
        ensure_visible(&principal, &request)?;
        Ok(request)
    }

    pub async fn approve_request(
        &self,
        caller: &impl Identity,
        id: RequestId,
        approved_quantities: HashMap<RequestDetailId, i64>,
    ) -> AppResult<MaterialRequest> {
        let principal = require(caller, &REQUESTS_APPROVE)?;
        Ok(self
            .services
            .requisitions()
            .approve(id, approved_quantities, principal.user_id)
            .await?)
    }

    pub async fn reject_request(
        &self,
        caller: &impl Identity,
        id: RequestId,
        reason: &str,
    ) -> AppResult<MaterialRequest> {
        let principal = require(caller, &REQUESTS_APPROVE)?;
        Ok(self
            .services
            .requisitions()
            .reject(id, reason, principal.user_id)
            .await?)
    }

    pub async fn issue_request(&self, caller: &impl Identity, id: RequestId) -> AppResult<Issuance> {
        let principal = require(caller, &REQUESTS_ISSUE)?;
        Ok(self
            .services
            .requisitions()
            .issue(id, principal.user_id)
            .await?)
    }
}
