//! Workflow services.
//!
//! Each mutating operation follows the same pipeline:
//!
//! ```text
//! load current records from the store
//!   ↓
//! decide (aggregate `handle`) and apply to copies
//!   ↓
//! commit copies + ledger rows in one WriteBatch, each record guarded by
//! ExpectedVersion::Exact(loaded version)
//! ```
//!
//! Nothing is written when any step fails, and a concurrent writer that got
//! there first turns the commit into a `Conflict`.

use std::sync::Arc;

use stockroom_core::{AggregateRoot, Clock, ExpectedVersion, SparePartId};
use stockroom_inventory::SparePart;

use crate::config::Settings;
use crate::reports::Reports;
use crate::store::Store;

mod error;
mod registry;
mod requisition;
mod stock_count;

pub use error::{ServiceError, ServiceResult};
pub use registry::PartRegistry;
pub use requisition::{Issuance, NewRequest, NewRequestLine, Requisitions};
pub use stock_count::{Completion, StockCounts};

/// Shared dependencies of every service.
#[derive(Clone)]
pub struct ServiceContext {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
    pub settings: Settings,
}

impl ServiceContext {
    pub(crate) async fn load_part(&self, id: SparePartId) -> ServiceResult<SparePart> {
        self.store
            .get_part(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("part {id}")))
    }
}

/// Version guard for a record loaded from the store.
pub(crate) fn loaded<A: AggregateRoot>(record: &A) -> ExpectedVersion {
    ExpectedVersion::Exact(record.version())
}

/// All services over one store and clock.
#[derive(Clone)]
pub struct Services {
    context: Arc<ServiceContext>,
    registry: PartRegistry,
    requisitions: Requisitions,
    counts: StockCounts,
    reports: Reports,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, settings: Settings) -> Self {
        let context = Arc::new(ServiceContext {
            store,
            clock,
            settings,
        });
        Self {
            registry: PartRegistry::new(context.clone()),
            requisitions: Requisitions::new(context.clone()),
            counts: StockCounts::new(context.clone()),
            reports: Reports::new(context.clone()),
            context,
        }
    }

    pub fn registry(&self) -> &PartRegistry {
        &self.registry
    }

    pub fn requisitions(&self) -> &Requisitions {
        &self.requisitions
    }

    pub fn counts(&self) -> &StockCounts {
        &self.counts
    }

    pub fn reports(&self) -> &Reports {
        &self.reports
    }

    pub fn settings(&self) -> &Settings {
        &self.context.settings
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.context.clock
    }
}
