//! Role-change security validation pipeline.
//!
//! The pipeline is an ordered fold over independent checks. Each check takes
//! the request and the accumulated [`Verdict`] and returns the updated verdict.
//! `Verdict` only exposes monotone operations (raise risk, add error/warning/
//! flag, require secondary auth), so no later check can lower risk, clear an
//! error or drop the secondary-auth requirement set by an earlier one.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rolegate_auth::{permissions, PermissionCatalog, TransitionTable};
use rolegate_core::ValueObject;

use crate::policy::SecurityPolicy;
use crate::request::RoleChangeRequest;

pub const ERR_SELF_MODIFICATION: &str = "administrators cannot modify their own role";
pub const ERR_UNAUTHORIZED: &str = "insufficient permissions to change user roles";
pub const ERR_REASON_REQUIRED: &str = "reason is required";

/// Ordinal sensitivity of a role-change attempt.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl core::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown risk level '{0}'")]
pub struct RiskLevelParseError(pub String);

impl FromStr for RiskLevel {
    type Err = RiskLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskLevel::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RiskLevelParseError(s.to_string()))
    }
}

/// Machine-readable reason a check fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditFlag {
    SelfRoleModificationAttempt,
    UnauthorizedRoleChangeAttempt,
    InvalidRoleTransition,
    PrivilegeEscalation,
    MissingReason,
    BriefReason,
    SuspiciousReason,
    MissingIp,
    MissingUserAgent,
    AdminRoleAssignment,
}

impl AuditFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditFlag::SelfRoleModificationAttempt => "self_role_modification_attempt",
            AuditFlag::UnauthorizedRoleChangeAttempt => "unauthorized_role_change_attempt",
            AuditFlag::InvalidRoleTransition => "invalid_role_transition",
            AuditFlag::PrivilegeEscalation => "privilege_escalation",
            AuditFlag::MissingReason => "missing_reason",
            AuditFlag::BriefReason => "brief_reason",
            AuditFlag::SuspiciousReason => "suspicious_reason",
            AuditFlag::MissingIp => "missing_ip",
            AuditFlag::MissingUserAgent => "missing_user_agent",
            AuditFlag::AdminRoleAssignment => "admin_role_assignment",
        }
    }
}

impl core::fmt::Display for AuditFlag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating one role-change request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff `errors` is empty.
    pub valid: bool,
    pub errors: Vec<String>,
    /// Non-blocking concerns.
    pub warnings: Vec<String>,
    pub risk_level: RiskLevel,
    pub requires_secondary_auth: bool,
    pub audit_flags: BTreeSet<AuditFlag>,
}

impl ValueObject for ValidationResult {}

impl ValidationResult {
    pub fn has_flag(&self, flag: AuditFlag) -> bool {
        self.audit_flags.contains(&flag)
    }

    pub fn is_high_risk(&self) -> bool {
        self.risk_level >= RiskLevel::High
    }
}

/// Accumulator threaded through the checklist.
#[derive(Debug, Default)]
pub struct Verdict {
    errors: Vec<String>,
    warnings: Vec<String>,
    risk_level: RiskLevel,
    requires_secondary_auth: bool,
    audit_flags: BTreeSet<AuditFlag>,
}

impl Verdict {
    pub fn reject(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }

    pub fn warn(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn flag(mut self, flag: AuditFlag) -> Self {
        self.audit_flags.insert(flag);
        self
    }

    /// Raise risk to at least `level`; never lowers it.
    pub fn raise_risk(mut self, level: RiskLevel) -> Self {
        self.risk_level = self.risk_level.max(level);
        self
    }

    pub fn require_secondary_auth(mut self) -> Self {
        self.requires_secondary_auth = true;
        self
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    fn signal_count(&self) -> usize {
        self.errors.len() + self.warnings.len() + self.audit_flags.len()
    }

    pub fn finish(self) -> ValidationResult {
        ValidationResult {
            valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
            risk_level: self.risk_level,
            requires_secondary_auth: self.requires_secondary_auth,
            audit_flags: self.audit_flags,
        }
    }
}

/// Everything a check may look at.
pub struct CheckInput<'a> {
    pub request: &'a RoleChangeRequest,
    pub policy: &'a SecurityPolicy,
    pub catalog: &'a PermissionCatalog,
    pub transitions: &'a TransitionTable,
}

pub type Check = fn(&CheckInput<'_>, Verdict) -> Verdict;

/// The checklist, in evaluation order.
pub const CHECKS: [(&str, Check); 7] = [
    ("self_modification", check_self_modification),
    ("authorization", check_authorization),
    ("transition", check_transition),
    ("escalation", check_escalation),
    ("justification", check_justification),
    ("metadata", check_metadata),
    ("elevated_target", check_elevated_target),
];

fn check_self_modification(input: &CheckInput<'_>, verdict: Verdict) -> Verdict {
    if !input.request.is_self_modification() {
        return verdict;
    }
    verdict
        .reject(ERR_SELF_MODIFICATION)
        .raise_risk(RiskLevel::Critical)
        .flag(AuditFlag::SelfRoleModificationAttempt)
}

fn check_authorization(input: &CheckInput<'_>, verdict: Verdict) -> Verdict {
    if input
        .catalog
        .has_permission(&input.request.admin_role, &permissions::USER_MANAGE)
    {
        return verdict;
    }
    verdict
        .reject(ERR_UNAUTHORIZED)
        .raise_risk(RiskLevel::High)
        .flag(AuditFlag::UnauthorizedRoleChangeAttempt)
}

fn check_transition(input: &CheckInput<'_>, verdict: Verdict) -> Verdict {
    let RoleChangeRequest { current_role, new_role, .. } = input.request;
    if input.transitions.is_valid_transition(current_role, new_role) {
        return verdict;
    }
    verdict
        .reject(format!("invalid role transition from {current_role} to {new_role}"))
        .raise_risk(RiskLevel::High)
        .flag(AuditFlag::InvalidRoleTransition)
}

fn check_escalation(input: &CheckInput<'_>, verdict: Verdict) -> Verdict {
    let RoleChangeRequest { current_role, new_role, .. } = input.request;
    if !input.transitions.is_escalation(current_role, new_role) {
        return verdict;
    }
    verdict
        .raise_risk(RiskLevel::High)
        .require_secondary_auth()
        .warn(format!(
            "privilege escalation from {current_role} to {new_role} requires secondary authentication"
        ))
        .flag(AuditFlag::PrivilegeEscalation)
}

fn check_justification(input: &CheckInput<'_>, verdict: Verdict) -> Verdict {
    let reason = input.request.reason.trim();
    if reason.is_empty() {
        return verdict
            .reject(ERR_REASON_REQUIRED)
            .flag(AuditFlag::MissingReason);
    }

    let mut verdict = verdict;
    if reason.chars().count() < input.policy.min_reason_length {
        verdict = verdict
            .warn(format!(
                "reason is brief; provide at least {} characters of justification",
                input.policy.min_reason_length
            ))
            .flag(AuditFlag::BriefReason);
    }
    if let Some(term) = input.policy.suspicious_term_in(reason) {
        verdict = verdict
            .warn(format!("reason contains suspicious term '{term}'"))
            .flag(AuditFlag::SuspiciousReason)
            .raise_risk(RiskLevel::Medium);
    }
    verdict
}

fn check_metadata(input: &CheckInput<'_>, verdict: Verdict) -> Verdict {
    let metadata = &input.request.metadata;
    let mut verdict = verdict;
    if !metadata.has_ip_address() {
        verdict = verdict
            .warn("source IP address is missing")
            .flag(AuditFlag::MissingIp);
    }
    if !metadata.has_user_agent() {
        verdict = verdict
            .warn("user agent is missing")
            .flag(AuditFlag::MissingUserAgent);
    }
    verdict
}

fn check_elevated_target(input: &CheckInput<'_>, verdict: Verdict) -> Verdict {
    let request = input.request;
    if !input.transitions.is_highest_role(&request.new_role) {
        return verdict;
    }
    let verdict = verdict
        .raise_risk(RiskLevel::High)
        .require_secondary_auth()
        .flag(AuditFlag::AdminRoleAssignment);

    if input.policy.mentions_admin_duties(&request.reason) {
        verdict
    } else {
        verdict.warn(format!(
            "reason for assigning {} does not mention administrative duties",
            request.new_role
        ))
    }
}

/// Runs the checklist against role-change requests.
#[derive(Debug, Clone, Default)]
pub struct RoleChangeValidator {
    policy: SecurityPolicy,
}

impl RoleChangeValidator {
    pub fn new(policy: SecurityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    pub fn validate(&self, request: &RoleChangeRequest) -> ValidationResult {
        self.validate_with(request, PermissionCatalog::global(), TransitionTable::global())
    }

    /// Validate against explicit tables instead of the process-wide ones.
    pub fn validate_with(
        &self,
        request: &RoleChangeRequest,
        catalog: &PermissionCatalog,
        transitions: &TransitionTable,
    ) -> ValidationResult {
        let input = CheckInput {
            request,
            policy: &self.policy,
            catalog,
            transitions,
        };

        let verdict = CHECKS.iter().fold(Verdict::default(), |verdict, (name, check)| {
            let before = verdict.signal_count();
            let verdict = check(&input, verdict);
            if verdict.signal_count() > before {
                tracing::debug!(check = *name, risk_level = %verdict.risk_level(), "role change check fired");
            }
            verdict
        });

        let result = verdict.finish();
        let flags: Vec<&str> = result.audit_flags.iter().map(AuditFlag::as_str).collect();
        if result.valid {
            tracing::info!(
                admin_id = %request.admin_id,
                target_id = %request.target_id,
                new_role = %request.new_role,
                risk_level = %result.risk_level,
                requires_secondary_auth = result.requires_secondary_auth,
                flags = ?flags,
                "role change validated"
            );
        } else {
            tracing::warn!(
                admin_id = %request.admin_id,
                target_id = %request.target_id,
                new_role = %request.new_role,
                risk_level = %result.risk_level,
                errors = result.errors.len(),
                flags = ?flags,
                "role change rejected"
            );
        }
        result
    }
}

/// Validate with the default policy and the process-wide tables.
pub fn validate_role_change(request: &RoleChangeRequest) -> ValidationResult {
    RoleChangeValidator::default().validate(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestMetadata;
    use proptest::prelude::*;
    use rolegate_auth::Role;
    use rolegate_core::UserId;

    fn metadata() -> RequestMetadata {
        RequestMetadata {
            ip_address: Some("203.0.113.7".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
            origin: Some("admin_ui".to_string()),
            session_id: Some("sess-1".to_string()),
        }
    }

    fn demotion(reason: &str) -> RoleChangeRequest {
        RoleChangeRequest {
            admin_id: UserId::from_u128(1),
            admin_role: Role::ADMINISTRATOR,
            target_id: UserId::from_u128(2),
            current_role: Role::ADMINISTRATOR,
            new_role: Role::MEMBER,
            reason: reason.to_string(),
            metadata: metadata(),
        }
    }

    #[test]
    fn clean_demotion_is_valid_and_low_risk() {
        let result = validate_role_change(&demotion("Moved to the finance department"));
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(!result.requires_secondary_auth);
        assert!(result.audit_flags.is_empty());
    }

    #[test]
    fn brief_reason_warns_without_invalidating() {
        let result = validate_role_change(&demotion("  left  "));
        assert!(result.valid);
        assert!(result.has_flag(AuditFlag::BriefReason));
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn whitespace_reason_is_missing() {
        let result = validate_role_change(&demotion("   "));
        assert!(!result.valid);
        assert_eq!(result.errors, vec![ERR_REASON_REQUIRED]);
        assert!(result.has_flag(AuditFlag::MissingReason));
        assert!(!result.has_flag(AuditFlag::BriefReason));
    }

    #[test]
    fn suspicious_reason_bumps_to_medium() {
        let result = validate_role_change(&demotion("Temporary coverage during leave ends"));
        assert!(result.valid);
        assert!(result.has_flag(AuditFlag::SuspiciousReason));
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn missing_metadata_produces_independent_warnings() {
        let mut request = demotion("Moved to the finance department");
        request.metadata = RequestMetadata::default();
        let result = validate_role_change(&request);
        assert!(result.valid);
        assert!(result.has_flag(AuditFlag::MissingIp));
        assert!(result.has_flag(AuditFlag::MissingUserAgent));
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn invalid_transition_names_both_roles() {
        let mut request = demotion("Moved to the finance department");
        request.current_role = Role::MEMBER;
        let result = validate_role_change(&request);
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["invalid role transition from member to member"]);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert!(result.has_flag(AuditFlag::InvalidRoleTransition));
    }

    #[test]
    fn unknown_current_role_is_treated_as_escalation() {
        let mut request = demotion("Moved to the finance department");
        request.current_role = Role::new("contractor");
        let result = validate_role_change(&request);
        assert!(!result.valid);
        assert!(result.has_flag(AuditFlag::InvalidRoleTransition));
        assert!(result.has_flag(AuditFlag::PrivilegeEscalation));
        assert!(result.requires_secondary_auth);
    }

    #[test]
    fn every_failure_is_reported() {
        let request = RoleChangeRequest {
            admin_id: UserId::from_u128(5),
            admin_role: Role::MEMBER,
            target_id: UserId::from_u128(5),
            current_role: Role::MEMBER,
            new_role: Role::MEMBER,
            reason: String::new(),
            metadata: RequestMetadata::default(),
        };
        let result = validate_role_change(&request);
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                ERR_SELF_MODIFICATION.to_string(),
                ERR_UNAUTHORIZED.to_string(),
                "invalid role transition from member to member".to_string(),
                ERR_REASON_REQUIRED.to_string(),
            ]
        );
        assert_eq!(result.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn admin_assignment_with_unrelated_reason_warns() {
        let mut request = demotion("Joined the finance department full time");
        request.current_role = Role::MEMBER;
        request.new_role = Role::ADMINISTRATOR;
        let result = validate_role_change(&request);
        assert!(result.valid);
        assert!(result.has_flag(AuditFlag::AdminRoleAssignment));
        assert!(result.warnings.iter().any(|w| w.contains("administrative duties")));

        request.reason = "Takes over user management for the support team".to_string();
        let result = validate_role_change(&request);
        assert!(!result.warnings.iter().any(|w| w.contains("administrative duties")));
    }

    #[test]
    fn custom_policy_changes_brief_threshold() {
        let validator = RoleChangeValidator::new(SecurityPolicy {
            min_reason_length: 40,
            ..SecurityPolicy::default()
        });
        let result = validator.validate(&demotion("Moved to the finance department"));
        assert!(result.has_flag(AuditFlag::BriefReason));
    }

    #[test]
    fn risk_level_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<RiskLevel>(), Ok(RiskLevel::High));
        assert_eq!(
            "severe".parse::<RiskLevel>(),
            Err(RiskLevelParseError("severe".to_string()))
        );
        assert!(RiskLevel::Low < RiskLevel::Medium && RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn verdict_never_lowers_risk() {
        let verdict = Verdict::default()
            .raise_risk(RiskLevel::Critical)
            .raise_risk(RiskLevel::High);
        assert_eq!(verdict.finish().risk_level, RiskLevel::Critical);
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop_oneof![
            Just(Role::MEMBER),
            Just(Role::ADMINISTRATOR),
            Just(Role::new("contractor")),
        ]
    }

    fn any_request() -> impl Strategy<Value = RoleChangeRequest> {
        (
            0u128..3,
            0u128..3,
            any_role(),
            any_role(),
            any_role(),
            prop_oneof![
                Just(String::new()),
                Just("ok".to_string()),
                Just("urgent fix".to_string()),
                Just("Needs admin rights for onboarding".to_string()),
                "[a-z ]{0,40}",
            ],
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(admin, target, admin_role, current_role, new_role, reason, ip, ua)| {
                RoleChangeRequest {
                    admin_id: UserId::from_u128(admin),
                    admin_role,
                    target_id: UserId::from_u128(target),
                    current_role,
                    new_role,
                    reason,
                    metadata: RequestMetadata {
                        ip_address: ip.then(|| "198.51.100.4".to_string()),
                        user_agent: ua.then(|| "cli/1.0".to_string()),
                        ..RequestMetadata::default()
                    },
                }
            })
    }

    proptest! {
        #[test]
        fn self_modification_is_always_critical_and_invalid(mut request in any_request()) {
            request.target_id = request.admin_id;
            let result = validate_role_change(&request);
            prop_assert!(!result.valid);
            prop_assert_eq!(result.risk_level, RiskLevel::Critical);
            prop_assert!(result.has_flag(AuditFlag::SelfRoleModificationAttempt));
        }

        #[test]
        fn promotion_to_administrator_always_needs_secondary_auth(mut request in any_request()) {
            request.new_role = Role::ADMINISTRATOR;
            let result = validate_role_change(&request);
            prop_assert!(result.requires_secondary_auth);
            prop_assert!(result.risk_level >= RiskLevel::High);
        }

        #[test]
        fn valid_iff_no_errors(request in any_request()) {
            let result = validate_role_change(&request);
            prop_assert_eq!(result.valid, result.errors.is_empty());
        }

        /// Layering suspicious wording, then an escalation, then self-targeting
        /// on top of whatever the request already triggers never lowers risk.
        #[test]
        fn stacked_triggers_never_lower_risk(request in any_request()) {
            let base = validate_role_change(&request);

            let mut suspicious = request.clone();
            suspicious.reason.push_str(" urgent");
            let with_suspicious = validate_role_change(&suspicious);

            let mut escalating = suspicious.clone();
            escalating.current_role = Role::MEMBER;
            escalating.new_role = Role::ADMINISTRATOR;
            let with_escalation = validate_role_change(&escalating);

            let mut self_targeted = escalating.clone();
            self_targeted.target_id = self_targeted.admin_id;
            let with_self_target = validate_role_change(&self_targeted);

            prop_assert!(with_suspicious.risk_level >= base.risk_level.max(RiskLevel::Medium));
            prop_assert!(with_escalation.risk_level >= with_suspicious.risk_level.max(RiskLevel::High));
            prop_assert!(with_escalation.requires_secondary_auth);
            prop_assert!(with_escalation.has_flag(AuditFlag::PrivilegeEscalation));
            prop_assert_eq!(with_self_target.risk_level, RiskLevel::Critical);
            prop_assert!(with_self_target.requires_secondary_auth);
        }

        #[test]
        fn escalation_keeps_earlier_critical(mut request in any_request()) {
            request.target_id = request.admin_id;
            request.current_role = Role::MEMBER;
            request.new_role = Role::ADMINISTRATOR;
            let result = validate_role_change(&request);
            prop_assert_eq!(result.risk_level, RiskLevel::Critical);
            prop_assert!(result.has_flag(AuditFlag::PrivilegeEscalation));
            prop_assert!(result.has_flag(AuditFlag::SelfRoleModificationAttempt));
        }

        #[test]
        fn suspicious_suffix_never_lowers_risk(request in any_request()) {
            let before = validate_role_change(&request);
            let mut suspicious = request.clone();
            suspicious.reason.push_str(" urgent");
            let after = validate_role_change(&suspicious);
            prop_assert!(after.risk_level >= before.risk_level);
            prop_assert!(after.risk_level >= RiskLevel::Medium);
        }
    }
}
