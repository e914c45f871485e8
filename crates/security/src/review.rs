//! End-to-end handling of one role-change attempt.
//!
//! The reviewer is the caller-side glue between the pipeline, the audit
//! builder and alerting: it always builds the audit entry and decides, from
//! the policy's threshold, whether the verdict warrants a security alert.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use rolegate_auth::{Account, Role};
use rolegate_core::AuditEntryId;

use crate::alerts::{generate_security_alert_at, AlertType, SecurityAlert};
use crate::audit::{build_audit_entry_at, AuditEntry};
use crate::compliance::{generate_compliance_report, ComplianceReport};
use crate::policy::{ConfigError, SecurityPolicy};
use crate::request::{RequestMetadata, RoleChangeRequest};
use crate::validation::{AuditFlag, RoleChangeValidator, ValidationResult};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    #[error("audit entry {0} already recorded")]
    Duplicate(AuditEntryId),
}

/// Durable storage for audit entries (external collaborator).
pub trait AuditStore {
    fn record(&self, entry: &AuditEntry) -> Result<(), SinkError>;
}

/// Delivery channel for security alerts (external collaborator).
pub trait AlertSink {
    fn deliver(&self, alert: &SecurityAlert) -> Result<(), SinkError>;
}

/// Everything produced for one attempt.
#[derive(Debug, Clone, Serialize)]
pub struct RoleChangeReview {
    pub request: RoleChangeRequest,
    pub validation: ValidationResult,
    pub audit_entry: AuditEntry,
    pub alert: Option<SecurityAlert>,
}

#[derive(Debug, Clone, Default)]
pub struct RoleChangeReviewer {
    validator: RoleChangeValidator,
}

impl RoleChangeReviewer {
    pub fn new(policy: SecurityPolicy) -> Self {
        Self {
            validator: RoleChangeValidator::new(policy),
        }
    }

    /// Reviewer configured from `ROLEGATE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(SecurityPolicy::from_env()?))
    }

    pub fn review(
        &self,
        admin: &Account,
        target: &Account,
        new_role: Role,
        reason: &str,
        metadata: RequestMetadata,
    ) -> RoleChangeReview {
        self.review_at(admin, target, new_role, reason, metadata, Utc::now())
    }

    pub fn review_at(
        &self,
        admin: &Account,
        target: &Account,
        new_role: Role,
        reason: &str,
        metadata: RequestMetadata,
        now: DateTime<Utc>,
    ) -> RoleChangeReview {
        let request = RoleChangeRequest::new(admin, target, new_role, reason, metadata);
        let validation = self.validator.validate(&request);
        let audit_entry = build_audit_entry_at(
            admin,
            target,
            &request.new_role,
            &request.reason,
            &request.metadata,
            &validation,
            now,
        );

        let alert = if validation.risk_level >= self.validator.policy().alert_threshold {
            let alert = alert_for(&audit_entry, now);
            tracing::warn!(
                alert_id = %alert.id,
                alert_type = %alert.alert_type,
                severity = %alert.severity,
                admin_id = %admin.id,
                target_id = %target.id,
                "security alert raised for role change"
            );
            Some(alert)
        } else {
            None
        };

        RoleChangeReview {
            request,
            validation,
            audit_entry,
            alert,
        }
    }

    /// Hand the review's records to the collaborators.
    ///
    /// The audit entry is recorded first and regardless of validity; the
    /// alert, if any, is delivered only after the entry is stored.
    pub fn submit(
        &self,
        review: &RoleChangeReview,
        audit_store: &dyn AuditStore,
        alert_sink: &dyn AlertSink,
    ) -> Result<(), SinkError> {
        audit_store.record(&review.audit_entry)?;
        if let Some(alert) = &review.alert {
            alert_sink.deliver(alert)?;
        }
        Ok(())
    }
}

/// Most severe reason first.
fn alert_type_for(validation: &ValidationResult) -> AlertType {
    const PRIORITY: [(AuditFlag, AlertType); 6] = [
        (AuditFlag::SelfRoleModificationAttempt, AlertType::SelfModificationAttempt),
        (AuditFlag::UnauthorizedRoleChangeAttempt, AlertType::UnauthorizedRoleChange),
        (AuditFlag::InvalidRoleTransition, AlertType::InvalidRoleTransition),
        (AuditFlag::PrivilegeEscalation, AlertType::PrivilegeEscalation),
        (AuditFlag::AdminRoleAssignment, AlertType::AdminRoleAssignment),
        (AuditFlag::SuspiciousReason, AlertType::SuspiciousRoleChange),
    ];
    PRIORITY
        .into_iter()
        .find(|(flag, _)| validation.has_flag(*flag))
        .map(|(_, alert_type)| alert_type)
        .unwrap_or(AlertType::SuspiciousRoleChange)
}

fn alert_for(entry: &AuditEntry, now: DateTime<Utc>) -> SecurityAlert {
    let validation = &entry.validation;
    let alert_type = alert_type_for(validation);
    let title = match alert_type {
        AlertType::SelfModificationAttempt => "Administrator attempted to change own role",
        AlertType::UnauthorizedRoleChange => "Unauthorized role change attempt",
        AlertType::InvalidRoleTransition => "Invalid role transition requested",
        AlertType::PrivilegeEscalation => "Privilege escalation requested",
        AlertType::AdminRoleAssignment => "Administrator role assignment requested",
        AlertType::SuspiciousRoleChange => "Suspicious role change",
    };
    let description = format!(
        "{} requested {} -> {} for {} ({})",
        entry.admin.email,
        entry.previous_role,
        entry.new_role,
        entry.target.email,
        entry.status,
    );
    let data = json!({
        "audit_entry_id": entry.id,
        "target_id": entry.target.id,
        "target_email": entry.target.email,
        "previous_role": entry.previous_role,
        "new_role": entry.new_role,
        "valid": validation.valid,
        "errors": validation.errors,
        "warnings": validation.warnings,
        "audit_flags": validation.audit_flags,
        "requires_secondary_auth": validation.requires_secondary_auth,
        "ip_address": entry.metadata.ip_address,
        "user_agent": entry.metadata.user_agent,
    });

    generate_security_alert_at(
        alert_type,
        validation.risk_level,
        title,
        description,
        &entry.admin,
        data,
        now,
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory collaborators
// ─────────────────────────────────────────────────────────────────────────────

/// Append-only audit store. Intended for tests and tooling.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Result<Vec<AuditEntry>, SinkError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| SinkError::Unavailable("lock poisoned".to_string()))?;
        Ok(entries.clone())
    }

    /// Entry recorded under `id`; `Ok(None)` when nothing was recorded.
    pub fn get(&self, id: AuditEntryId) -> Result<Option<AuditEntry>, SinkError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| SinkError::Unavailable("lock poisoned".to_string()))?;
        Ok(entries.iter().find(|e| e.id == id).cloned())
    }

    pub fn report(&self) -> Result<ComplianceReport, SinkError> {
        Ok(generate_compliance_report(&self.entries()?))
    }
}

impl AuditStore for InMemoryAuditStore {
    fn record(&self, entry: &AuditEntry) -> Result<(), SinkError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SinkError::Unavailable("lock poisoned".to_string()))?;
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(SinkError::Duplicate(entry.id));
        }
        entries.push(entry.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAlertSink {
    alerts: RwLock<Vec<SecurityAlert>>,
}

impl InMemoryAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Result<Vec<SecurityAlert>, SinkError> {
        let alerts = self
            .alerts
            .read()
            .map_err(|_| SinkError::Unavailable("lock poisoned".to_string()))?;
        Ok(alerts.clone())
    }
}

impl AlertSink for InMemoryAlertSink {
    fn deliver(&self, alert: &SecurityAlert) -> Result<(), SinkError> {
        self.alerts
            .write()
            .map_err(|_| SinkError::Unavailable("lock poisoned".to_string()))?
            .push(alert.clone());
        Ok(())
    }
}
