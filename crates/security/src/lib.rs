//! `rolegate-security`: secure role-change validation and audit pipeline.
//!
//! Flow for one attempt: a [`RoleChangeRequest`] goes through the
//! [`validation`] checklist, the resulting [`ValidationResult`] always feeds the
//! [`audit`] builder and, when risky enough, [`alerts`]. Stored entries are
//! later evaluated by [`compliance`]. Nothing here performs IO; persistence and
//! delivery sit behind the traits in [`review`].

pub mod alerts;
pub mod audit;
pub mod compliance;
pub mod policy;
pub mod request;
pub mod review;
pub mod validation;

pub use alerts::{generate_security_alert, AlertType, SecurityAlert};
pub use audit::{build_audit_entry, AuditEntry, AuditStatus};
pub use compliance::{
    check_compliance_requirements, generate_compliance_report, ComplianceReport,
    ComplianceRequirement,
};
pub use policy::{ConfigError, SecurityPolicy, MIN_REASON_LENGTH};
pub use request::{RequestMetadata, RoleChangeRequest};
pub use review::{
    AlertSink, AuditStore, InMemoryAlertSink, InMemoryAuditStore, RoleChangeReview,
    RoleChangeReviewer, SinkError,
};
pub use validation::{
    validate_role_change, AuditFlag, RiskLevel, RiskLevelParseError, RoleChangeValidator,
    ValidationResult,
};
