//! Value object trait: equality by value, not identity.
//!
//! Permissions, verdicts, audit entries and alerts are value objects: they are
//! created once, never mutated in place by the core, and compared by value.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one. This is what makes the process-wide permission catalog and
/// per-request verdicts safe to share between concurrent callers without locks.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Permission { resource: Resource, action: Action }
///
/// impl ValueObject for Permission {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
