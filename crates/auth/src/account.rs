//! Resolved account identities.
//!
//! Accounts are looked up by the external account store before any check
//! runs; this crate only ever sees already-resolved identities.

use serde::{Deserialize, Serialize};

use rolegate_core::{DomainError, DomainResult, UserId, ValueObject};

use crate::Role;

/// An account as resolved by the account store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub active: bool,
}

impl Account {
    /// Build an active account, normalizing the email.
    pub fn new(id: UserId, email: impl AsRef<str>, role: Role) -> DomainResult<Self> {
        let email = email.as_ref().trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }
        Ok(Self {
            id,
            email,
            role,
            active: true,
        })
    }

    /// Copy of the identity fields as they are right now.
    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            id: self.id,
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }
}

/// Identity captured at a point in time for audit and alert records.
///
/// Holds copies, not references, so later edits to the account cannot rewrite
/// history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl ValueObject for AccountSnapshot {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_email() {
        let account = Account::new(UserId::from_u128(1), "  Alice@Example.COM ", Role::MEMBER).unwrap();
        assert_eq!(account.email, "alice@example.com");
        assert!(account.active);
    }

    #[test]
    fn new_rejects_invalid_email() {
        let err = Account::new(UserId::from_u128(1), "alice", Role::MEMBER).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn snapshot_is_detached_from_account() {
        let mut account = Account::new(UserId::from_u128(1), "bob@example.com", Role::MEMBER).unwrap();
        let snapshot = account.snapshot();

        account.email = "robert@example.com".to_string();
        account.role = Role::ADMINISTRATOR;

        assert_eq!(snapshot.email, "bob@example.com");
        assert_eq!(snapshot.role, Role::MEMBER);
    }
}
