//! Role transition table and privilege hierarchy.
//!
//! Two tables drive every decision here: which roles a role may move *to*, and
//! the numeric rank of each role. `higher_roles` / `lower_roles` are derived
//! from the rank table so the two lookups cannot drift apart.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;

use crate::Role;

static GLOBAL: Lazy<TransitionTable> = Lazy::new(TransitionTable::standard);

/// Directed role transitions plus the privilege ranking they are judged by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionTable {
    edges: HashMap<Role, BTreeSet<Role>>,
    ranks: HashMap<Role, u8>,
}

impl TransitionTable {
    /// The process-wide table.
    pub fn global() -> &'static TransitionTable {
        &GLOBAL
    }

    /// `member ⇄ administrator`, ranked 1 and 2.
    pub fn standard() -> Self {
        Self::new(
            [
                (Role::MEMBER, vec![Role::ADMINISTRATOR]),
                (Role::ADMINISTRATOR, vec![Role::MEMBER]),
            ],
            [(Role::MEMBER, 1), (Role::ADMINISTRATOR, 2)],
        )
    }

    pub fn new<E, T, R>(edges: E, ranks: R) -> Self
    where
        E: IntoIterator<Item = (Role, T)>,
        T: IntoIterator<Item = Role>,
        R: IntoIterator<Item = (Role, u8)>,
    {
        let mut table = HashMap::<Role, BTreeSet<Role>>::new();
        for (from, targets) in edges {
            table.entry(from).or_default().extend(targets);
        }
        Self {
            edges: table,
            ranks: ranks.into_iter().collect(),
        }
    }

    /// Rank of `role` in the hierarchy, if it is ranked at all.
    pub fn rank(&self, role: &Role) -> Option<u8> {
        self.ranks.get(role).copied()
    }

    /// The highest-ranked role (`administrator` in the standard table).
    pub fn highest_role(&self) -> Option<&Role> {
        self.ranks
            .iter()
            .max_by(|(a_role, a), (b_role, b)| a.cmp(b).then_with(|| b_role.cmp(a_role)))
            .map(|(role, _)| role)
    }

    pub fn is_highest_role(&self, role: &Role) -> bool {
        self.highest_role() == Some(role)
    }

    /// Edge membership: may `from` become `to`?
    pub fn is_valid_transition(&self, from: &Role, to: &Role) -> bool {
        self.edges.get(from).is_some_and(|targets| targets.contains(to))
    }

    /// Does moving from `from` to `to` increase privilege?
    ///
    /// A role missing from the rank table on either side counts as an
    /// escalation so that it takes the more scrutinized path.
    pub fn is_escalation(&self, from: &Role, to: &Role) -> bool {
        match (self.rank(from), self.rank(to)) {
            (Some(from_rank), Some(to_rank)) => to_rank > from_rank,
            _ => true,
        }
    }

    /// Roles ranked strictly above `role`, lowest first. Empty for unranked roles.
    pub fn higher_roles(&self, role: &Role) -> Vec<Role> {
        self.ranked_where(role, |other, own| other > own)
    }

    /// Roles ranked strictly below `role`, lowest first. Empty for unranked roles.
    pub fn lower_roles(&self, role: &Role) -> Vec<Role> {
        self.ranked_where(role, |other, own| other < own)
    }

    fn ranked_where(&self, role: &Role, keep: impl Fn(u8, u8) -> bool) -> Vec<Role> {
        let Some(own) = self.rank(role) else {
            return Vec::new();
        };
        let mut roles: Vec<(u8, Role)> = self
            .ranks
            .iter()
            .filter(|(_, rank)| keep(**rank, own))
            .map(|(r, rank)| (*rank, r.clone()))
            .collect();
        roles.sort();
        roles.into_iter().map(|(_, r)| r).collect()
    }
}

pub fn is_valid_transition(from: &Role, to: &Role) -> bool {
    TransitionTable::global().is_valid_transition(from, to)
}

pub fn is_escalation(from: &Role, to: &Role) -> bool {
    TransitionTable::global().is_escalation(from, to)
}

pub fn higher_roles(role: &Role) -> Vec<Role> {
    TransitionTable::global().higher_roles(role)
}

pub fn lower_roles(role: &Role) -> Vec<Role> {
    TransitionTable::global().lower_roles(role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_edges_are_the_complete_two_node_graph() {
        assert!(is_valid_transition(&Role::MEMBER, &Role::ADMINISTRATOR));
        assert!(is_valid_transition(&Role::ADMINISTRATOR, &Role::MEMBER));
        assert!(!is_valid_transition(&Role::MEMBER, &Role::MEMBER));
        assert!(!is_valid_transition(&Role::ADMINISTRATOR, &Role::ADMINISTRATOR));
    }

    #[test]
    fn unknown_roles_have_no_edges() {
        let ghost = Role::new("ghost");
        assert!(!is_valid_transition(&ghost, &Role::MEMBER));
        assert!(!is_valid_transition(&Role::MEMBER, &ghost));
    }

    #[test]
    fn escalation_follows_rank() {
        assert!(is_escalation(&Role::MEMBER, &Role::ADMINISTRATOR));
        assert!(!is_escalation(&Role::ADMINISTRATOR, &Role::MEMBER));
        assert!(!is_escalation(&Role::MEMBER, &Role::MEMBER));
    }

    #[test]
    fn unranked_roles_count_as_escalation() {
        let ghost = Role::new("ghost");
        assert!(is_escalation(&ghost, &Role::MEMBER));
        assert!(is_escalation(&Role::ADMINISTRATOR, &ghost));
    }

    #[test]
    fn higher_and_lower_are_derived_from_rank() {
        assert_eq!(higher_roles(&Role::MEMBER), vec![Role::ADMINISTRATOR]);
        assert!(higher_roles(&Role::ADMINISTRATOR).is_empty());
        assert_eq!(lower_roles(&Role::ADMINISTRATOR), vec![Role::MEMBER]);
        assert!(lower_roles(&Role::MEMBER).is_empty());
        assert!(lower_roles(&Role::new("ghost")).is_empty());
    }

    #[test]
    fn three_tier_hierarchy_generalizes() {
        let manager = Role::new("manager");
        let table = TransitionTable::new(
            [
                (Role::MEMBER, vec![manager.clone()]),
                (manager.clone(), vec![Role::MEMBER, Role::ADMINISTRATOR]),
                (Role::ADMINISTRATOR, vec![manager.clone()]),
            ],
            [(Role::MEMBER, 1), (manager.clone(), 2), (Role::ADMINISTRATOR, 3)],
        );

        assert!(!table.is_valid_transition(&Role::MEMBER, &Role::ADMINISTRATOR));
        assert!(table.is_escalation(&Role::MEMBER, &manager));
        assert_eq!(table.higher_roles(&Role::MEMBER), vec![manager.clone(), Role::ADMINISTRATOR]);
        assert_eq!(table.lower_roles(&Role::ADMINISTRATOR), vec![Role::MEMBER, manager]);
        assert_eq!(table.highest_role(), Some(&Role::ADMINISTRATOR));
    }

    #[test]
    fn administrator_is_the_highest_standard_role() {
        let table = TransitionTable::global();
        assert!(table.is_highest_role(&Role::ADMINISTRATOR));
        assert!(!table.is_highest_role(&Role::MEMBER));
    }
}
