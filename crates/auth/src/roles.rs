use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are opaque names so that a role unknown to the catalog or the
/// transition table can still be represented; every check treats such a role
/// fail-closed (no permissions, conservative escalation) instead of rejecting
/// it at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Baseline account tier.
    pub const MEMBER: Role = Role(Cow::Borrowed("member"));
    /// Highest privilege tier.
    pub const ADMINISTRATOR: Role = Role(Cow::Borrowed("administrator"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
