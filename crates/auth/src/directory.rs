//! Account directory: the people who can sign in and the roles they hold.
//!
//! Credentials are not kept here; the login mechanism resolves a user id and
//! this directory supplies the profile and role membership for it.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_core::{UserId, ensure_max_len};

use crate::{Identity, Role};

const DISPLAY_NAME_MAX: usize = 50;
const TEAM_MAX: usize = 20;
const EMAIL_MAX: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    /// Team or department the account belongs to.
    pub team: String,
    pub roles: Vec<Role>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Identity for Account {
    /// Deactivated accounts act as anonymous.
    fn current_user_id(&self) -> Option<UserId> {
        self.active.then_some(self.id)
    }

    fn is_in_role(&self, role: Role) -> bool {
        self.active && self.roles.contains(&role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub display_name: String,
    pub team: String,
    pub roles: Vec<Role>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("an account with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("account not found")]
    NotFound,

    #[error("invalid account: {0}")]
    Validation(String),

    #[error("account directory unavailable")]
    Unavailable,
}

/// In-memory account directory.
#[derive(Debug, Default)]
pub struct AccountDirectory {
    accounts: RwLock<HashMap<UserId, Account>>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        new: NewAccount,
        now: DateTime<Utc>,
    ) -> Result<Account, DirectoryError> {
        let email = normalize_email(&new.email);
        if email.is_empty() || !email.contains('@') {
            return Err(DirectoryError::Validation(format!(
                "'{}' is not an email address",
                new.email
            )));
        }
        for (field, value, max) in [
            ("email", email.as_str(), EMAIL_MAX),
            ("display name", new.display_name.as_str(), DISPLAY_NAME_MAX),
            ("team", new.team.as_str(), TEAM_MAX),
        ] {
            ensure_max_len(field, value, max)
                .map_err(|e| DirectoryError::Validation(e.to_string()))?;
        }

        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| DirectoryError::Unavailable)?;
        if accounts.values().any(|a| a.email == email) {
            return Err(DirectoryError::DuplicateEmail(email));
        }

        let mut roles = new.roles;
        roles.sort();
        roles.dedup();

        let account = Account {
            id: UserId::new(),
            email,
            display_name: new.display_name.trim().to_string(),
            team: new.team.trim().to_string(),
            roles,
            active: true,
            created_at: now,
        };
        accounts.insert(account.id, account.clone());
        tracing::info!(user_id = %account.id, email = %account.email, "account registered");
        Ok(account)
    }

    pub fn get(&self, id: UserId) -> Result<Account, DirectoryError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| DirectoryError::Unavailable)?;
        accounts.get(&id).cloned().ok_or(DirectoryError::NotFound)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<Account>, DirectoryError> {
        let email = normalize_email(email);
        let accounts = self
            .accounts
            .read()
            .map_err(|_| DirectoryError::Unavailable)?;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    /// All accounts ordered by email.
    pub fn list(&self) -> Result<Vec<Account>, DirectoryError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| DirectoryError::Unavailable)?;
        let mut all: Vec<Account> = accounts.values().cloned().collect();
        all.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(all)
    }

    pub fn set_roles(&self, id: UserId, roles: Vec<Role>) -> Result<Account, DirectoryError> {
        self.update(id, |account| {
            let mut roles = roles;
            roles.sort();
            roles.dedup();
            account.roles = roles;
        })
    }

    pub fn set_active(&self, id: UserId, active: bool) -> Result<Account, DirectoryError> {
        self.update(id, |account| account.active = active)
    }

    fn update(
        &self,
        id: UserId,
        f: impl FnOnce(&mut Account),
    ) -> Result<Account, DirectoryError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| DirectoryError::Unavailable)?;
        let account = accounts.get_mut(&id).ok_or(DirectoryError::NotFound)?;
        f(account);
        Ok(account.clone())
    }

    /// Ensure a `SuperAdmin` account exists for `email`.
    ///
    /// Idempotent: an existing account keeps its profile and gains the role
    /// if it lacks it. Returns the account and whether it was created.
    pub fn seed_admin(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(Account, bool), DirectoryError> {
        if let Some(existing) = self.find_by_email(email)? {
            if existing.roles.contains(&Role::SuperAdmin) {
                return Ok((existing, false));
            }
            let mut roles = existing.roles.clone();
            roles.push(Role::SuperAdmin);
            return Ok((self.set_roles(existing.id, roles)?, false));
        }

        let account = self.register(
            NewAccount {
                email: email.to_string(),
                display_name: "Administrator".to_string(),
                team: String::new(),
                roles: vec![Role::SuperAdmin],
            },
            now,
        )?;
        Ok((account, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(email: &str, roles: &[Role]) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            display_name: "Test User".to_string(),
            team: "Maintenance".to_string(),
            roles: roles.to_vec(),
        }
    }

    #[test]
    fn duplicate_email_is_rejected_case_insensitively() {
        let dir = AccountDirectory::new();
        dir.register(new_account("tech@company.com", &[Role::User]), Utc::now())
            .unwrap();

        match dir.register(new_account("TECH@company.com", &[Role::User]), Utc::now()) {
            Err(DirectoryError::DuplicateEmail(e)) => assert_eq!(e, "tech@company.com"),
            other => panic!("expected DuplicateEmail, got {other:?}"),
        }
    }

    #[test]
    fn team_longer_than_limit_is_rejected() {
        let dir = AccountDirectory::new();
        let mut acc = new_account("a@company.com", &[]);
        acc.team = "x".repeat(21);
        assert!(matches!(
            dir.register(acc, Utc::now()),
            Err(DirectoryError::Validation(_))
        ));
    }

    #[test]
    fn seed_admin_is_idempotent() {
        let dir = AccountDirectory::new();
        let (first, created) = dir.seed_admin("admin@company.com", Utc::now()).unwrap();
        assert!(created);
        let (second, created) = dir.seed_admin("admin@company.com", Utc::now()).unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(dir.list().unwrap().len(), 1);
    }

    #[test]
    fn seed_admin_promotes_existing_account() {
        let dir = AccountDirectory::new();
        let acc = dir
            .register(new_account("boss@company.com", &[Role::Manager]), Utc::now())
            .unwrap();
        let (seeded, created) = dir.seed_admin("boss@company.com", Utc::now()).unwrap();
        assert!(!created);
        assert_eq!(seeded.id, acc.id);
        assert_eq!(seeded.roles, vec![Role::SuperAdmin, Role::Manager]);
    }

    #[test]
    fn deactivated_account_loses_identity() {
        let dir = AccountDirectory::new();
        let acc = dir
            .register(new_account("temp@company.com", &[Role::Manager]), Utc::now())
            .unwrap();
        let acc = dir.set_active(acc.id, false).unwrap();
        assert_eq!(acc.current_user_id(), None);
        assert!(!acc.is_in_role(Role::Manager));
    }
}
