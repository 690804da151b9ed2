use stockroom_auth::Identity;
use stockroom_auth::permissions::{PARTS_ADJUST, PARTS_DELETE, PARTS_READ, PARTS_WRITE};
use stockroom_core::{Page, SparePartId};
use stockroom_inventory::{InventoryTransaction, PartSearch, SparePart};

use super::Application;
use super::dto::{AdjustInput, PartInput};
use super::errors::AppResult;
use crate::authz::require;

impl Application {
    pub async fn search_parts(
        &self,
        caller: &impl Identity,
        search: PartSearch,
    ) -> AppResult<Page<SparePart>> {
        require(caller, &PARTS_READ)?;
        Ok(self.services.registry().search(search).await?)
    }

    pub async fn part(&self, caller: &impl Identity, id: SparePartId) -> AppResult<SparePart> {
        require(caller, &PARTS_READ)?;
        Ok(self.services.registry().get(id).await?)
    }

    pub async fn create_part(&self, caller: &impl Identity, input: PartInput) -> AppResult<SparePart> {
        let principal = require(caller, &PARTS_WRITE)?;
        Ok(self
            .services
            .registry()
            .register(input.details, input.quantity, principal.user_id)
            .await?)
    }

    pub async fn update_part(
        &self,
        caller: &impl Identity,
        id: SparePartId,
        input: PartInput,
    ) -> AppResult<SparePart> {
        let principal = require(caller, &PARTS_WRITE)?;
        Ok(self
            .services
            .registry()
            .revise(id, input.details, input.quantity, principal.user_id)
            .await?)
    }

    /// `None` when the part already holds `new_quantity`.
    pub async fn adjust_part(
        &self,
        caller: &impl Identity,
        id: SparePartId,
        input: AdjustInput,
    ) -> AppResult<Option<InventoryTransaction>> {
        let principal = require(caller, &PARTS_ADJUST)?;
        Ok(self
            .services
            .registry()
            .adjust(id, input.new_quantity, &input.reason, principal.user_id)
            .await?)
    }

    pub async fn delete_part(&self, caller: &impl Identity, id: SparePartId) -> AppResult<()> {
        let principal = require(caller, &PARTS_DELETE)?;
        Ok(self.services.registry().delete(id, principal.user_id).await?)
    }

    pub async fn part_history(
        &self,
        caller: &impl Identity,
        id: SparePartId,
    ) -> AppResult<Vec<InventoryTransaction>> {
        require(caller, &PARTS_READ)?;
        Ok(self.services.registry().history(id).await?)
    }

    pub async fn recent_transactions(
        &self,
        caller: &impl Identity,
        count: usize,
    ) -> AppResult<Vec<InventoryTransaction>> {
        require(caller, &PARTS_READ)?;
        Ok(self.services.registry().recent(count).await?)
    }
}
