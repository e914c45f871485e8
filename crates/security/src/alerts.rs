//! Security alert payloads.
//!
//! This module only builds alerts. Whether a verdict warrants one is decided
//! by the caller (see [`crate::review`]), so the threshold lives in one place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rolegate_auth::AccountSnapshot;

use crate::validation::RiskLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    SelfModificationAttempt,
    UnauthorizedRoleChange,
    InvalidRoleTransition,
    PrivilegeEscalation,
    AdminRoleAssignment,
    SuspiciousRoleChange,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::SelfModificationAttempt => "self_modification_attempt",
            AlertType::UnauthorizedRoleChange => "unauthorized_role_change",
            AlertType::InvalidRoleTransition => "invalid_role_transition",
            AlertType::PrivilegeEscalation => "privilege_escalation",
            AlertType::AdminRoleAssignment => "admin_role_assignment",
            AlertType::SuspiciousRoleChange => "suspicious_role_change",
        }
    }
}

impl core::fmt::Display for AlertType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityAlert {
    /// `alert-<admin id>-<type>-<unix millis>`; unique, not secret.
    pub id: String,
    pub alert_type: AlertType,
    pub severity: RiskLevel,
    pub title: String,
    pub description: String,
    pub admin: AccountSnapshot,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
}

impl SecurityAlert {
    /// Mark the alert handled. Resolving twice keeps the first resolution.
    pub fn resolve(&mut self, notes: impl Into<String>, at: DateTime<Utc>) {
        if self.resolved {
            return;
        }
        self.resolved = true;
        self.resolved_at = Some(at);
        self.resolution_notes = Some(notes.into());
    }
}

pub fn generate_security_alert(
    alert_type: AlertType,
    severity: RiskLevel,
    title: impl Into<String>,
    description: impl Into<String>,
    admin: &AccountSnapshot,
    data: serde_json::Value,
) -> SecurityAlert {
    generate_security_alert_at(alert_type, severity, title, description, admin, data, Utc::now())
}

pub fn generate_security_alert_at(
    alert_type: AlertType,
    severity: RiskLevel,
    title: impl Into<String>,
    description: impl Into<String>,
    admin: &AccountSnapshot,
    data: serde_json::Value,
    created_at: DateTime<Utc>,
) -> SecurityAlert {
    SecurityAlert {
        id: format!("alert-{}-{}-{}", admin.id, alert_type, created_at.timestamp_millis()),
        alert_type,
        severity,
        title: title.into(),
        description: description.into(),
        admin: admin.clone(),
        data,
        created_at,
        resolved: false,
        resolved_at: None,
        resolution_notes: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rolegate_auth::Role;
    use rolegate_core::UserId;
    use serde_json::json;

    fn admin() -> AccountSnapshot {
        AccountSnapshot {
            id: UserId::from_u128(1),
            email: "root@example.com".to_string(),
            role: Role::ADMINISTRATOR,
        }
    }

    #[test]
    fn id_is_derived_from_admin_type_and_time() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let alert = generate_security_alert_at(
            AlertType::PrivilegeEscalation,
            RiskLevel::High,
            "Privilege escalation",
            "member promoted to administrator",
            &admin(),
            json!({ "target_id": "2" }),
            at,
        );
        assert_eq!(
            alert.id,
            format!("alert-{}-privilege_escalation-{}", admin().id, at.timestamp_millis())
        );
        assert_eq!(alert.severity, RiskLevel::High);
        assert!(!alert.resolved);
        assert_eq!(alert.data["target_id"], "2");
    }

    #[test]
    fn same_inputs_give_same_id() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let build = || {
            generate_security_alert_at(
                AlertType::SelfModificationAttempt,
                RiskLevel::Critical,
                "t",
                "d",
                &admin(),
                json!({}),
                at,
            )
        };
        assert_eq!(build().id, build().id);
    }

    #[test]
    fn resolve_keeps_first_resolution() {
        let mut alert = generate_security_alert(
            AlertType::SuspiciousRoleChange,
            RiskLevel::High,
            "t",
            "d",
            &admin(),
            json!({}),
        );
        let first = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        alert.resolve("confirmed with requester", first);
        alert.resolve("again", Utc::now());

        assert!(alert.resolved);
        assert_eq!(alert.resolved_at, Some(first));
        assert_eq!(alert.resolution_notes.as_deref(), Some("confirmed with requester"));
    }
}
