//! # Access Checks
//!
//! Who may do what is decided outside this crate. The authentication
//! collaborator hands each service an [`AccessPolicy`]; services only ask it
//! yes-or-no questions.
//!
//! ```rust
//! use stockbook_billing::access::{AccessPolicy, Permission};
//!
//! // Any closure is a policy
//! let cashier = |p: Permission| p != Permission::ManageStock;
//! assert!(cashier.has_permission(Permission::PlaceOrder));
//! assert!(!cashier.has_permission(Permission::ManageStock));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

use crate::error::{BillingError, BillingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    PlaceOrder,
    SettlePayLater,
    ManageStock,
}

impl Permission {
    pub const ALL: [Permission; 3] = [
        Permission::PlaceOrder,
        Permission::SettlePayLater,
        Permission::ManageStock,
    ];
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::PlaceOrder => write!(f, "place_order"),
            Permission::SettlePayLater => write!(f, "settle_pay_later"),
            Permission::ManageStock => write!(f, "manage_stock"),
        }
    }
}

/// Opaque capability check.
pub trait AccessPolicy: Send + Sync {
    fn has_permission(&self, permission: Permission) -> bool;
}

impl<F> AccessPolicy for F
where
    F: Fn(Permission) -> bool + Send + Sync,
{
    fn has_permission(&self, permission: Permission) -> bool {
        self(permission)
    }
}

/// Grants everything. For tooling and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn has_permission(&self, _permission: Permission) -> bool {
        true
    }
}

/// A fixed set of grants, as read from `[access]` in `stockbook.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(HashSet<Permission>);

impl PermissionSet {
    pub fn new(granted: impl IntoIterator<Item = Permission>) -> Self {
        PermissionSet(granted.into_iter().collect())
    }
}

impl AccessPolicy for PermissionSet {
    fn has_permission(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }
}

/// Fails with `PermissionDenied` unless `policy` grants `permission`.
pub(crate) fn require(policy: &impl AccessPolicy, permission: Permission) -> BillingResult<()> {
    if policy.has_permission(permission) {
        Ok(())
    } else {
        warn!(%permission, "Permission denied");
        Err(BillingError::PermissionDenied(permission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        for permission in Permission::ALL {
            assert!(AllowAll.has_permission(permission));
        }
    }

    #[test]
    fn test_permission_set() {
        let policy = PermissionSet::new([Permission::PlaceOrder]);
        assert!(policy.has_permission(Permission::PlaceOrder));
        assert!(!policy.has_permission(Permission::SettlePayLater));
        assert!(PermissionSet::default().0.is_empty());
    }

    #[test]
    fn test_require() {
        let deny_all = |_: Permission| false;
        assert!(require(&AllowAll, Permission::ManageStock).is_ok());
        assert!(matches!(
            require(&deny_all, Permission::SettlePayLater),
            Err(BillingError::PermissionDenied(Permission::SettlePayLater))
        ));
    }

    #[test]
    fn test_permission_display_matches_serde() {
        for permission in Permission::ALL {
            let name = toml_name(permission);
            assert_eq!(name, permission.to_string());
        }
    }

    fn toml_name(permission: Permission) -> String {
        #[derive(Serialize)]
        struct Wrap {
            p: Permission,
        }
        let toml = toml::to_string(&Wrap { p: permission }).unwrap();
        toml.trim()
            .trim_start_matches("p = \"")
            .trim_end_matches('"')
            .to_string()
    }
}
