//! Static role → permission catalog.
//!
//! The catalog is built once per process and is read-only afterwards; there is
//! no mutation path. Runtime-editable policy would need a versioned snapshot
//! swapped in wholesale, not in-place edits.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;

use crate::permissions::{self, Permission};
use crate::Role;

static GLOBAL: Lazy<PermissionCatalog> = Lazy::new(PermissionCatalog::standard);

/// Mapping of each role to the set of permissions it holds.
///
/// Only membership matters; insertion order is irrelevant. A role without an
/// entry holds no permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionCatalog {
    grants: HashMap<Role, BTreeSet<Permission>>,
}

impl PermissionCatalog {
    /// The process-wide catalog.
    pub fn global() -> &'static PermissionCatalog {
        &GLOBAL
    }

    /// The built-in grants for `member` and `administrator`.
    pub fn standard() -> Self {
        let member = [
            permissions::PROFILE_READ,
            permissions::PROFILE_UPDATE,
            permissions::DASHBOARD_VIEW,
        ];

        let administrator = member.into_iter().chain([
            permissions::USER_READ,
            permissions::USER_CREATE,
            permissions::USER_UPDATE,
            permissions::USER_DELETE,
            permissions::USER_MANAGE,
            permissions::ROLE_MANAGE,
            permissions::AUDIT_READ,
            permissions::REPORT_VIEW,
            permissions::SETTINGS_UPDATE,
        ]);

        Self::from_entries([
            (Role::MEMBER, member.into_iter().collect::<Vec<_>>()),
            (Role::ADMINISTRATOR, administrator.collect()),
        ])
    }

    /// Build a catalog from explicit entries (custom deployments, tests).
    ///
    /// Repeated roles merge their grants.
    pub fn from_entries<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Role, P)>,
        P: IntoIterator<Item = Permission>,
    {
        let mut grants: HashMap<Role, BTreeSet<Permission>> = HashMap::new();
        for (role, perms) in entries {
            grants.entry(role).or_default().extend(perms);
        }
        Self { grants }
    }

    /// Permissions held by `role`; empty for roles without an entry.
    pub fn permissions_for(&self, role: &Role) -> Vec<Permission> {
        self.grants
            .get(role)
            .map(|perms| perms.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Roles with a catalog entry, sorted by name.
    pub fn roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.grants.keys().cloned().collect();
        roles.sort();
        roles
    }

    pub(crate) fn grants(&self, role: &Role) -> Option<&BTreeSet<Permission>> {
        self.grants.get(role)
    }
}
