//! Presentation-facing facade over the stockroom services.
//!
//! Every operation takes the caller's [`stockroom_auth::Identity`], checks
//! the role policy, then delegates to `stockroom-infra`.

pub mod app;
pub mod authz;

pub use app::errors::{ActionError, ActionOutcome, AppError, AppResult};
pub use app::{Application, build_app};
