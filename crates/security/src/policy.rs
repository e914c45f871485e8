//! Tunables for the role-change validation pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::{RiskLevel, RiskLevelParseError};

/// Minimum trimmed length of a justification before it counts as brief.
///
/// Compliance checks always use this value, whatever the policy says.
pub const MIN_REASON_LENGTH: usize = 10;

pub const DEFAULT_SUSPICIOUS_TERMS: [&str; 5] = ["test", "temp", "temporary", "quick", "urgent"];

pub const DEFAULT_ADMIN_REASON_TERMS: [&str; 5] =
    ["admin", "manage", "privilege", "oversight", "supervis"];

pub const ENV_MIN_REASON_LENGTH: &str = "ROLEGATE_MIN_REASON_LENGTH";
pub const ENV_SUSPICIOUS_TERMS: &str = "ROLEGATE_SUSPICIOUS_TERMS";
pub const ENV_ADMIN_REASON_TERMS: &str = "ROLEGATE_ADMIN_REASON_TERMS";
pub const ENV_ALERT_THRESHOLD: &str = "ROLEGATE_ALERT_THRESHOLD";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: expected a positive integer, got '{value}'")]
    InvalidLength { key: &'static str, value: String },

    #[error("{key}: term list is empty")]
    EmptyTerms { key: &'static str },

    #[error("{key}: {source}")]
    InvalidRiskLevel {
        key: &'static str,
        #[source]
        source: RiskLevelParseError,
    },
}

/// Pipeline configuration.
///
/// Terms are matched case-insensitively as substrings and are stored
/// lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityPolicy {
    pub min_reason_length: usize,
    pub suspicious_terms: Vec<String>,
    pub admin_reason_terms: Vec<String>,
    /// Lowest risk at which the reviewer materializes a security alert.
    pub alert_threshold: RiskLevel,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            min_reason_length: MIN_REASON_LENGTH,
            suspicious_terms: DEFAULT_SUSPICIOUS_TERMS.iter().map(|t| t.to_string()).collect(),
            admin_reason_terms: DEFAULT_ADMIN_REASON_TERMS.iter().map(|t| t.to_string()).collect(),
            alert_threshold: RiskLevel::High,
        }
    }
}

impl SecurityPolicy {
    /// Defaults overlaid with `ROLEGATE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each `ROLEGATE_*` key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut policy = Self::default();

        if let Some(raw) = lookup(ENV_MIN_REASON_LENGTH) {
            policy.min_reason_length = match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidLength {
                        key: ENV_MIN_REASON_LENGTH,
                        value: raw,
                    });
                }
            };
        }
        if let Some(raw) = lookup(ENV_SUSPICIOUS_TERMS) {
            policy.suspicious_terms = parse_terms(ENV_SUSPICIOUS_TERMS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ADMIN_REASON_TERMS) {
            policy.admin_reason_terms = parse_terms(ENV_ADMIN_REASON_TERMS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ALERT_THRESHOLD) {
            policy.alert_threshold =
                raw.trim()
                    .parse()
                    .map_err(|source| ConfigError::InvalidRiskLevel {
                        key: ENV_ALERT_THRESHOLD,
                        source,
                    })?;
        }

        Ok(policy)
    }

    /// First suspicious term contained in `reason`, if any.
    pub fn suspicious_term_in(&self, reason: &str) -> Option<&str> {
        first_term_in(&self.suspicious_terms, reason)
    }

    pub fn mentions_admin_duties(&self, reason: &str) -> bool {
        first_term_in(&self.admin_reason_terms, reason).is_some()
    }
}

fn parse_terms(key: &'static str, raw: &str) -> Result<Vec<String>, ConfigError> {
    let terms: Vec<String> = raw
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return Err(ConfigError::EmptyTerms { key });
    }
    Ok(terms)
}

fn first_term_in<'a>(terms: &'a [String], text: &str) -> Option<&'a str> {
    let haystack = text.to_lowercase();
    terms
        .iter()
        .map(String::as_str)
        .find(|term| haystack.contains(&term.to_lowercase()))
}
