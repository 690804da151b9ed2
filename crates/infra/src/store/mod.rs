//! Persistence boundary.
//!
//! Services never mutate stored records directly: they build a [`WriteBatch`]
//! of new record states (each guarded by an [`ExpectedVersion`]) and ledger
//! movements, then hand it to [`Store::commit`], which applies all of it or
//! none of it.
//!
//! [`ExpectedVersion`]: stockroom_core::ExpectedVersion

mod in_memory;
mod r#trait;

pub use in_memory::InMemoryStore;
pub use r#trait::{IdKind, Store, StoreError, StoreResult, Write, WriteBatch};
