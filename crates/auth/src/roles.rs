use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::permissions::{self, Permission};

/// The fixed set of roles the stockroom knows about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    SuperAdmin,
    Manager,
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::SuperAdmin, Role::Manager, Role::User];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::Manager => "Manager",
            Role::User => "User",
        }
    }

    /// Supervisory roles may act on documents raised by others.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Manager)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown role '{s}'"))
    }
}

/// Role → permission mapping.
pub fn role_permissions(role: Role) -> Vec<Permission> {
    use permissions::*;

    match role {
        Role::SuperAdmin => vec![ALL],
        Role::Manager => vec![
            PARTS_READ,
            PARTS_WRITE,
            PARTS_ADJUST,
            REQUESTS_CREATE,
            REQUESTS_READ,
            REQUESTS_READ_ALL,
            REQUESTS_APPROVE,
            REQUESTS_ISSUE,
            COUNTS_READ,
            COUNTS_OPEN,
            COUNTS_RECORD,
            COUNTS_COMPLETE,
            REPORTS_READ,
            REPORTS_EXPORT,
        ],
        Role::User => vec![
            PARTS_READ,
            REQUESTS_CREATE,
            REQUESTS_READ,
            COUNTS_READ,
            COUNTS_RECORD,
            REPORTS_READ,
            REPORTS_EXPORT,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("superadmin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!(" Manager ".parse::<Role>().unwrap(), Role::Manager);
        assert!("auditor".parse::<Role>().is_err());
    }

    #[test]
    fn only_super_admin_may_delete_parts() {
        for role in Role::ALL {
            let can_delete = role_permissions(role)
                .iter()
                .any(|p| p.grants(&permissions::PARTS_DELETE));
            assert_eq!(can_delete, role == Role::SuperAdmin, "{role}");
        }
    }
}
