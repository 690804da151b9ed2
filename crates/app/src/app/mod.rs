//! Application wiring: the role-checked facade and its bootstrap.
//!
//! - `parts.rs`, `requests.rs`, `counts.rs`, `reports.rs`, `accounts.rs`:
//!   facade operations, one file per area
//! - `dto.rs`: inputs and outputs that only exist at this boundary
//! - `errors.rs`: `AppError` and the `ActionOutcome` result shape

use std::sync::Arc;

use anyhow::Context;

use stockroom_auth::AccountDirectory;
use stockroom_core::{Clock, SystemClock};
use stockroom_infra::{InMemoryStore, Services, Settings, Store};

pub mod accounts;
pub mod counts;
pub mod dto;
pub mod errors;
pub mod parts;
pub mod reports;
pub mod requests;

/// Every operation the presentation layer may call.
#[derive(Clone)]
pub struct Application {
    services: Services,
    directory: Arc<AccountDirectory>,
}

impl Application {
    pub fn new(services: Services, directory: Arc<AccountDirectory>) -> Self {
        Self {
            services,
            directory,
        }
    }

    /// Wire services over an explicit store and clock.
    pub fn with_store(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        settings: Settings,
        directory: Arc<AccountDirectory>,
    ) -> Self {
        Self::new(Services::new(store, clock, settings), directory)
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn directory(&self) -> &AccountDirectory {
        &self.directory
    }

    pub fn settings(&self) -> &Settings {
        self.services.settings()
    }
}

/// Build the application used by `main.rs`: in-memory store, wall clock and
/// a seeded `SuperAdmin` account.
pub fn build_app(settings: Settings) -> anyhow::Result<Application> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let directory = Arc::new(AccountDirectory::new());

    let (admin, created) = directory
        .seed_admin(&settings.admin_email, clock.now())
        .with_context(|| format!("seeding admin account '{}'", settings.admin_email))?;
    if created {
        tracing::info!(email = %admin.email, user_id = %admin.id, "seeded admin account");
    }

    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    Ok(Application::with_store(store, clock, settings, directory))
}
