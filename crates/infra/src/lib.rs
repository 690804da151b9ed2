//! Infrastructure layer: persistence boundary, configuration, workflow
//! services and reporting.

pub mod config;
pub mod reports;
pub mod services;
pub mod store;


pub use config::Settings;
pub use services::{ServiceContext, ServiceError, ServiceResult, Services};
pub use store::{InMemoryStore, Store, StoreError};
