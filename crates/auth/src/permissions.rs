use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "parts.read").
/// A special wildcard permission `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }

    /// Whether holding `self` satisfies a check for `required`.
    pub fn grants(&self, required: &Permission) -> bool {
        self.is_wildcard() || self == required
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const ALL: Permission = Permission::from_static("*");

pub const PARTS_READ: Permission = Permission::from_static("parts.read");
pub const PARTS_WRITE: Permission = Permission::from_static("parts.write");
pub const PARTS_ADJUST: Permission = Permission::from_static("parts.adjust");
pub const PARTS_DELETE: Permission = Permission::from_static("parts.delete");

pub const REQUESTS_CREATE: Permission = Permission::from_static("requests.create");
pub const REQUESTS_READ: Permission = Permission::from_static("requests.read");
/// See and list requests raised by other users.
pub const REQUESTS_READ_ALL: Permission = Permission::from_static("requests.read_all");
pub const REQUESTS_APPROVE: Permission = Permission::from_static("requests.approve");
pub const REQUESTS_ISSUE: Permission = Permission::from_static("requests.issue");

pub const COUNTS_READ: Permission = Permission::from_static("counts.read");
pub const COUNTS_OPEN: Permission = Permission::from_static("counts.open");
pub const COUNTS_RECORD: Permission = Permission::from_static("counts.record");
pub const COUNTS_COMPLETE: Permission = Permission::from_static("counts.complete");

pub const REPORTS_READ: Permission = Permission::from_static("reports.read");
pub const REPORTS_EXPORT: Permission = Permission::from_static("reports.export");

pub const ACCOUNTS_MANAGE: Permission = Permission::from_static("accounts.manage");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_grants_everything() {
        assert!(ALL.grants(&PARTS_DELETE));
        assert!(PARTS_READ.grants(&PARTS_READ));
        assert!(!PARTS_READ.grants(&PARTS_WRITE));
    }
}
