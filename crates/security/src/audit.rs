//! Role-change audit entries.
//!
//! An entry is built for every attempt, valid or not, so that rejected
//! attempts stay forensically visible once the audit store persists them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rolegate_auth::{Account, AccountSnapshot, Role};
use rolegate_core::{AuditEntryId, ValueObject};

use crate::request::RequestMetadata;
use crate::validation::ValidationResult;

/// Lifecycle status of an audit entry.
///
/// The builder only emits `Rejected`, `Pending` or `Approved`; `Completed` and
/// later transitions belong to the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Rejected,
    Pending,
    Approved,
    Completed,
}

impl AuditStatus {
    /// Initial status for a verdict.
    pub fn from_validation(result: &ValidationResult) -> Self {
        match (result.valid, result.requires_secondary_auth) {
            (false, _) => AuditStatus::Rejected,
            (true, true) => AuditStatus::Pending,
            (true, false) => AuditStatus::Approved,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Rejected => "rejected",
            AuditStatus::Pending => "pending",
            AuditStatus::Approved => "approved",
            AuditStatus::Completed => "completed",
        }
    }
}

impl core::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one role-change attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub admin: AccountSnapshot,
    pub target: AccountSnapshot,
    pub previous_role: Role,
    pub new_role: Role,
    pub reason: String,
    pub validation: ValidationResult,
    pub metadata: RequestMetadata,
    pub status: AuditStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl ValueObject for AuditEntry {}

/// Build an audit entry stamped with the current time.
pub fn build_audit_entry(
    admin: &Account,
    target: &Account,
    new_role: &Role,
    reason: &str,
    metadata: &RequestMetadata,
    validation: &ValidationResult,
) -> AuditEntry {
    build_audit_entry_at(admin, target, new_role, reason, metadata, validation, Utc::now())
}

/// Build an audit entry with an explicit creation time.
///
/// Identity fields are copied out of the accounts here; later changes to those
/// accounts do not reach the entry.
pub fn build_audit_entry_at(
    admin: &Account,
    target: &Account,
    new_role: &Role,
    reason: &str,
    metadata: &RequestMetadata,
    validation: &ValidationResult,
    created_at: DateTime<Utc>,
) -> AuditEntry {
    AuditEntry {
        id: AuditEntryId::new(),
        admin: admin.snapshot(),
        target: target.snapshot(),
        previous_role: target.role.clone(),
        new_role: new_role.clone(),
        reason: reason.to_string(),
        validation: validation.clone(),
        metadata: metadata.clone(),
        status: AuditStatus::from_validation(validation),
        created_at,
        completed_at: None,
        notes: None,
    }
}
