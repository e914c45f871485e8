use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thiserror::Error;

use rolegate_core::UserId;

use crate::catalog::PermissionCatalog;
use crate::permissions::{self, Action, Permission, Resource};
use crate::transitions::TransitionTable;
use crate::Role;

/// Auxiliary data for a single context-sensitive check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationContext {
    pub acting_user_id: Option<UserId>,
    pub target_user_id: Option<UserId>,
    pub attributes: BTreeMap<String, String>,
}

impl AuthorizationContext {
    /// Context for an actor operating on a target account.
    pub fn acting_on(acting_user_id: UserId, target_user_id: UserId) -> Self {
        Self {
            acting_user_id: Some(acting_user_id),
            target_user_id: Some(target_user_id),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// True only when both ids are present and equal.
    pub fn is_self_targeted(&self) -> bool {
        matches!(
            (self.acting_user_id, self.target_user_id),
            (Some(acting), Some(target)) if acting == target
        )
    }
}

/// Permission-specific refinement applied after the unconditional check.
///
/// Keyed by permission, never by role: a new context-sensitive permission is
/// one more arm here.
fn refine(permission: &Permission, context: &AuthorizationContext) -> bool {
    match *permission {
        permissions::PROFILE_UPDATE => context.is_self_targeted(),
        _ => true,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Check engine
// ─────────────────────────────────────────────────────────────────────────────

impl PermissionCatalog {
    /// Literal membership of `permission` in the role's entry; unknown roles
    /// hold nothing.
    pub fn has_permission(&self, role: &Role, permission: &Permission) -> bool {
        self.grants(role).is_some_and(|perms| perms.contains(permission))
    }

    pub fn has_any_permission(&self, role: &Role, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(role, p))
    }

    /// Vacuously true for an empty slice.
    pub fn has_all_permissions(&self, role: &Role, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(role, p))
    }

    pub fn can_access_resource(&self, role: &Role, resource: Resource, action: Action) -> bool {
        self.has_permission(role, &Permission::new(resource, action))
    }

    pub fn has_permission_with_context(
        &self,
        role: &Role,
        permission: &Permission,
        context: &AuthorizationContext,
    ) -> bool {
        self.has_permission(role, permission) && refine(permission, context)
    }
}

pub fn has_permission(role: &Role, permission: &Permission) -> bool {
    PermissionCatalog::global().has_permission(role, permission)
}

pub fn has_any_permission(role: &Role, permissions: &[Permission]) -> bool {
    PermissionCatalog::global().has_any_permission(role, permissions)
}

pub fn has_all_permissions(role: &Role, permissions: &[Permission]) -> bool {
    PermissionCatalog::global().has_all_permissions(role, permissions)
}

pub fn can_access_resource(role: &Role, resource: Resource, action: Action) -> bool {
    PermissionCatalog::global().can_access_resource(role, resource, action)
}

pub fn has_permission_with_context(
    role: &Role,
    permission: &Permission,
    context: &AuthorizationContext,
) -> bool {
    PermissionCatalog::global().has_permission_with_context(role, permission, context)
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport boundary
// ─────────────────────────────────────────────────────────────────────────────

/// Denial surfaced to transport code.
///
/// Deliberately carries no permission token: untrusted callers only ever learn
/// that they were forbidden.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden")]
    Forbidden,
}

/// `Result`-shaped wrapper over [`has_permission`] for handlers that use `?`.
pub fn authorize(role: &Role, required: &Permission) -> Result<(), AuthzError> {
    if has_permission(role, required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (admin tooling)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
///
/// Intended for trusted administrative tooling only; it names the permission
/// model and must not be returned to untrusted callers.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub role: Role,
    pub required_permission: Permission,
    pub granted: bool,
    /// Human-readable reason for the decision.
    pub reason: String,
    /// Everything the role holds, sorted.
    pub effective_permissions: Vec<Permission>,
    /// Catalogued roles that would grant the permission.
    pub granting_roles: Vec<Role>,
}

pub fn explain_authorization(role: &Role, required: &Permission) -> AuthorizationExplanation {
    explain_with_catalog(PermissionCatalog::global(), role, required)
}

pub fn explain_with_catalog(
    catalog: &PermissionCatalog,
    role: &Role,
    required: &Permission,
) -> AuthorizationExplanation {
    let effective_permissions = catalog.permissions_for(role);
    let granted = catalog.has_permission(role, required);
    let granting_roles: Vec<Role> = catalog
        .roles()
        .into_iter()
        .filter(|r| catalog.has_permission(r, required))
        .collect();

    let reason = if granted {
        format!("role '{role}' holds '{required}'")
    } else if catalog.grants(role).is_none() {
        format!("role '{role}' has no catalog entry and holds no permissions")
    } else {
        format!("role '{role}' does not hold '{required}'")
    };

    AuthorizationExplanation {
        role: role.clone(),
        required_permission: *required,
        granted,
        reason,
        effective_permissions,
        granting_roles,
    }
}

/// Role definition with its granted permissions (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub name: Role,
    pub rank: Option<u8>,
    pub permissions: Vec<Permission>,
    pub description: Option<String>,
}

/// Permission definition (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct PermissionDefinition {
    pub name: Permission,
    pub description: String,
    pub category: Resource,
}

/// Complete view of the RBAC model for auditing.
#[derive(Debug, Clone, Serialize)]
pub struct RbacRegistry {
    pub roles: Vec<RoleDefinition>,
    pub permissions: Vec<PermissionDefinition>,
}

impl RbacRegistry {
    /// Registry of the process-wide catalog and transition table.
    pub fn from_catalog() -> Self {
        Self::build(PermissionCatalog::global(), TransitionTable::global())
    }

    pub fn build(catalog: &PermissionCatalog, transitions: &TransitionTable) -> Self {
        let mut permissions: HashMap<Permission, PermissionDefinition> = HashMap::new();
        let mut roles = Vec::new();

        for role in catalog.roles() {
            let perms = catalog.permissions_for(&role);
            for perm in &perms {
                permissions.entry(*perm).or_insert_with(|| PermissionDefinition {
                    name: *perm,
                    description: permission_description(perm),
                    category: perm.resource(),
                });
            }
            roles.push(RoleDefinition {
                rank: transitions.rank(&role),
                description: role_description(&role),
                name: role,
                permissions: perms,
            });
        }

        let mut permissions: Vec<PermissionDefinition> = permissions.into_values().collect();
        permissions.sort_by_key(|p| p.name);

        Self { roles, permissions }
    }
}

fn role_description(role: &Role) -> Option<String> {
    match role.as_str() {
        "administrator" => Some("Account administrator; manages users, roles and audit".to_string()),
        "member" => Some("Standard account with access to its own profile".to_string()),
        _ => None,
    }
}

fn permission_description(perm: &Permission) -> String {
    let action = match perm.action() {
        Action::Read => "Read",
        Action::Create => "Create",
        Action::Update => "Update",
        Action::Delete => "Delete",
        Action::Manage => "Manage",
        Action::View => "View",
    };
    let suffix = if *perm == permissions::PROFILE_UPDATE {
        " (own record only)"
    } else {
        ""
    };
    format!("{action} {} resources{suffix}", perm.resource())
}
