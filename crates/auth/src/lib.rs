//! `rolegate-auth`: pure role-based authorization (no IO, no panics).
//!
//! Holds the process-wide permission catalog, the check engine over it, and
//! the role transition table. Every check answers with `bool`: "not
//! authorized" is an expected outcome, not an error.

pub mod account;
pub mod authorize;
pub mod catalog;
pub mod permissions;
pub mod roles;
pub mod transitions;

pub use account::{Account, AccountSnapshot};
pub use authorize::{
    authorize, can_access_resource, explain_authorization, has_all_permissions,
    has_any_permission, has_permission, has_permission_with_context, AuthorizationContext,
    AuthorizationExplanation, AuthzError, RbacRegistry,
};
pub use catalog::PermissionCatalog;
pub use permissions::{
    build_permission, parse_permission, Action, Permission, PermissionParseError, Resource,
};
pub use roles::Role;
pub use transitions::{higher_roles, is_escalation, is_valid_transition, lower_roles, TransitionTable};
