//! `stockroom-auth`: role-based authorization boundary.
//!
//! This crate is decoupled from any login mechanism: callers hand it a
//! resolved [`Identity`] and it answers "may this user do that".

pub mod authorize;
pub mod directory;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize, authorize_any};
pub use directory::{Account, AccountDirectory, DirectoryError, NewAccount};
pub use permissions::Permission;
pub use principal::{Anonymous, Identity, Principal};
pub use roles::{Role, role_permissions};
