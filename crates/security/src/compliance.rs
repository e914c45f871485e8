//! Compliance requirements evaluated against stored audit entries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::{AuditEntry, AuditStatus};
use crate::policy::MIN_REASON_LENGTH;
use crate::validation::AuditFlag;

pub const REQ_AUDIT_TRAIL: &str = "audit_trail";
pub const REQ_JUSTIFICATION: &str = "justification";
pub const REQ_ADMIN_IDENTITY: &str = "admin_identity";
pub const REQ_SOURCE_IP: &str = "source_ip";
pub const REQ_SECONDARY_AUTH: &str = "secondary_authentication";

/// One requirement evaluated against one entry. Computed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceRequirement {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub met: bool,
    pub details: Option<String>,
}

impl ComplianceRequirement {
    fn new(name: &str, description: &str, required: bool, met: bool) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required,
            met,
            details: None,
        }
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn is_failing(&self) -> bool {
        self.required && !self.met
    }
}

/// Evaluate the five fixed requirements, each independently.
pub fn check_compliance_requirements(entry: &AuditEntry) -> Vec<ComplianceRequirement> {
    let reason_len = entry.reason.trim().chars().count();
    let justification = ComplianceRequirement::new(
        REQ_JUSTIFICATION,
        "Role changes carry a written justification",
        true,
        reason_len >= MIN_REASON_LENGTH,
    );
    let justification = if justification.met {
        justification
    } else {
        justification.with_details(format!(
            "reason has {reason_len} characters, at least {MIN_REASON_LENGTH} required"
        ))
    };

    let admin_identity = ComplianceRequirement::new(
        REQ_ADMIN_IDENTITY,
        "The responsible administrator is identified",
        true,
        !entry.admin.email.trim().is_empty(),
    );

    let source_ip = ComplianceRequirement::new(
        REQ_SOURCE_IP,
        "The request's source IP address is recorded",
        true,
        entry.metadata.has_ip_address(),
    );

    let needs_secondary = entry.validation.requires_secondary_auth;
    let secondary_done = matches!(entry.status, AuditStatus::Approved | AuditStatus::Completed);
    let secondary_auth = ComplianceRequirement::new(
        REQ_SECONDARY_AUTH,
        "Escalations are confirmed by secondary authentication",
        needs_secondary,
        !needs_secondary || secondary_done,
    );
    let secondary_auth = if secondary_auth.is_failing() {
        secondary_auth.with_details(format!("entry is still {}", entry.status))
    } else {
        secondary_auth
    };

    vec![
        ComplianceRequirement::new(
            REQ_AUDIT_TRAIL,
            "An audit record exists for the role change",
            true,
            true,
        ),
        justification,
        admin_identity,
        source_ip,
        secondary_auth,
    ]
}

impl AuditEntry {
    pub fn requirements(&self) -> Vec<ComplianceRequirement> {
        check_compliance_requirements(self)
    }
}

/// Aggregate view over a batch of audit entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub total_entries: usize,
    /// Entries whose risk was `high` or `critical`.
    pub high_risk_entries: usize,
    /// Entries flagged as privilege escalations.
    pub escalations: usize,
    pub entries_by_status: BTreeMap<AuditStatus, usize>,
    /// `"<target email>: <requirement name>"` per unmet required requirement,
    /// in input order.
    pub failures: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl ComplianceReport {
    pub fn is_compliant(&self) -> bool {
        self.failures.is_empty()
    }
}

pub fn generate_compliance_report(entries: &[AuditEntry]) -> ComplianceReport {
    generate_compliance_report_at(entries, Utc::now())
}

pub fn generate_compliance_report_at(
    entries: &[AuditEntry],
    generated_at: DateTime<Utc>,
) -> ComplianceReport {
    let mut entries_by_status = BTreeMap::new();
    let mut failures = Vec::new();

    for entry in entries {
        *entries_by_status.entry(entry.status).or_insert(0) += 1;
        failures.extend(
            check_compliance_requirements(entry)
                .into_iter()
                .filter(ComplianceRequirement::is_failing)
                .map(|req| format!("{}: {}", entry.target.email, req.name)),
        );
    }

    ComplianceReport {
        total_entries: entries.len(),
        high_risk_entries: entries.iter().filter(|e| e.validation.is_high_risk()).count(),
        escalations: entries
            .iter()
            .filter(|e| e.validation.has_flag(AuditFlag::PrivilegeEscalation))
            .count(),
        entries_by_status,
        failures,
        generated_at,
    }
}
