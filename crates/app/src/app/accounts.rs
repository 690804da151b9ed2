use stockroom_auth::permissions::ACCOUNTS_MANAGE;
use stockroom_auth::{Account, AuthzError, Identity, NewAccount, Role};
use stockroom_core::{Clock, UserId};

use super::Application;
use super::errors::AppResult;
use crate::authz::require;

impl Application {
    /// The caller's own account.
    pub fn whoami(&self, caller: &impl Identity) -> AppResult<Account> {
        let id = caller
            .current_user_id()
            .ok_or(AuthzError::Unauthenticated)?;
        Ok(self.directory.get(id)?)
    }

    pub fn list_accounts(&self, caller: &impl Identity) -> AppResult<Vec<Account>> {
        require(caller, &ACCOUNTS_MANAGE)?;
        Ok(self.directory.list()?)
    }

    pub fn register_account(&self, caller: &impl Identity, account: NewAccount) -> AppResult<Account> {
        require(caller, &ACCOUNTS_MANAGE)?;
        Ok(self
            .directory
            .register(account, self.services.clock().now())?)
    }

    pub fn set_account_roles(
        &self,
        caller: &impl Identity,
        id: UserId,
        roles: Vec<Role>,
    ) -> AppResult<Account> {
        let principal = require(caller, &ACCOUNTS_MANAGE)?;
        let account = self.directory.set_roles(id, roles)?;
        tracing::info!(user_id = %id, by = %principal.user_id, roles = ?account.roles, "account roles changed");
        Ok(account)
    }

    pub fn set_account_active(
        &self,
        caller: &impl Identity,
        id: UserId,
        active: bool,
    ) -> AppResult<Account> {
        let principal = require(caller, &ACCOUNTS_MANAGE)?;
        let account = self.directory.set_active(id, active)?;
        tracing::info!(user_id = %id, by = %principal.user_id, active, "account activation changed");
        Ok(account)
    }
}
