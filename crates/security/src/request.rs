use serde::{Deserialize, Serialize};

use rolegate_auth::{Account, Role};
use rolegate_core::UserId;

/// Request context supplied by the transport layer.
///
/// Blank strings count as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Where the request came from (e.g. `admin_ui`, `api`).
    pub origin: Option<String>,
    pub session_id: Option<String>,
}

impl RequestMetadata {
    pub fn has_ip_address(&self) -> bool {
        is_present(&self.ip_address)
    }

    pub fn has_user_agent(&self) -> bool {
        is_present(&self.user_agent)
    }
}

fn is_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Input to the validation pipeline; constructed fresh per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChangeRequest {
    pub admin_id: UserId,
    pub admin_role: Role,
    pub target_id: UserId,
    pub current_role: Role,
    pub new_role: Role,
    pub reason: String,
    pub metadata: RequestMetadata,
}

impl RoleChangeRequest {
    /// Build a request from accounts already resolved by the account store.
    pub fn new(
        admin: &Account,
        target: &Account,
        new_role: Role,
        reason: impl Into<String>,
        metadata: RequestMetadata,
    ) -> Self {
        Self {
            admin_id: admin.id,
            admin_role: admin.role.clone(),
            target_id: target.id,
            current_role: target.role.clone(),
            new_role,
            reason: reason.into(),
            metadata,
        }
    }

    pub fn is_self_modification(&self) -> bool {
        self.admin_id == self.target_id
    }
}
