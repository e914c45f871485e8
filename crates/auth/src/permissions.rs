use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rolegate_core::ValueObject;

/// Separator between the resource and action halves of a permission token.
pub const SEPARATOR: char = ':';

/// Resource half of a permission token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    User,
    Profile,
    Role,
    Audit,
    Dashboard,
    Report,
    Settings,
}

/// Action half of a permission token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Manage,
    View,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::User,
        Resource::Profile,
        Resource::Role,
        Resource::Audit,
        Resource::Dashboard,
        Resource::Report,
        Resource::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::User => "user",
            Resource::Profile => "profile",
            Resource::Role => "role",
            Resource::Audit => "audit",
            Resource::Dashboard => "dashboard",
            Resource::Report => "report",
            Resource::Settings => "settings",
        }
    }
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Read,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Manage,
        Action::View,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Manage => "manage",
            Action::View => "view",
        }
    }
}

impl core::fmt::Display for Resource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| PermissionParseError::UnknownResource(s.to_string()))
    }
}

impl FromStr for Action {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| PermissionParseError::UnknownAction(s.to_string()))
    }
}

/// Malformed permission token.
///
/// Tokens only come from the catalog and from storage, so a parse failure
/// points at a defect in one of those, never at user input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionParseError {
    #[error("permission token '{0}' is not of the form 'resource:action'")]
    Malformed(String),

    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),
}

/// Permission identifier: an atomic `resource:action` grant.
///
/// Held as a validated pair; the colon-separated string is only the
/// serialization format used at storage/wire boundaries. Equality is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission {
    resource: Resource,
    action: Action,
}

impl ValueObject for Permission {}

impl Permission {
    pub const fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Canonical `resource:action` token.
    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}{}", self.resource, SEPARATOR, self.action)
    }
}

impl FromStr for Permission {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource, action) = parse_permission(s)?;
        Ok(Self::new(resource, action))
    }
}

impl TryFrom<String> for Permission {
    type Error = PermissionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.token()
    }
}

/// Build the canonical token for a resource/action pair.
pub fn build_permission(resource: Resource, action: Action) -> String {
    Permission::new(resource, action).token()
}

/// Split a canonical token back into its resource/action pair.
pub fn parse_permission(token: &str) -> Result<(Resource, Action), PermissionParseError> {
    let mut parts = token.split(SEPARATOR);
    let (Some(resource), Some(action), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(PermissionParseError::Malformed(token.to_string()));
    };
    if resource.is_empty() || action.is_empty() {
        return Err(PermissionParseError::Malformed(token.to_string()));
    }
    Ok((resource.parse()?, action.parse()?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog permissions
// ─────────────────────────────────────────────────────────────────────────────

pub const PROFILE_READ: Permission = Permission::new(Resource::Profile, Action::Read);
pub const PROFILE_UPDATE: Permission = Permission::new(Resource::Profile, Action::Update);
pub const DASHBOARD_VIEW: Permission = Permission::new(Resource::Dashboard, Action::View);

pub const USER_READ: Permission = Permission::new(Resource::User, Action::Read);
pub const USER_CREATE: Permission = Permission::new(Resource::User, Action::Create);
pub const USER_UPDATE: Permission = Permission::new(Resource::User, Action::Update);
pub const USER_DELETE: Permission = Permission::new(Resource::User, Action::Delete);
/// Required to change another account's role.
pub const USER_MANAGE: Permission = Permission::new(Resource::User, Action::Manage);
pub const ROLE_MANAGE: Permission = Permission::new(Resource::Role, Action::Manage);
pub const AUDIT_READ: Permission = Permission::new(Resource::Audit, Action::Read);
pub const REPORT_VIEW: Permission = Permission::new(Resource::Report, Action::View);
pub const SETTINGS_UPDATE: Permission = Permission::new(Resource::Settings, Action::Update);
