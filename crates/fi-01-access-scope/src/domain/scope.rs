//! # Access Scope
//!
//! The set of partitions an actor may touch, derived from role and active
//! assignments.
//!
//! ## Rules
//!
//! - Role in [`GlobalRoles`] → `is_global = true`, every partition allowed.
//! - Otherwise → exactly the partitions with an *active* assignment.
//! - Records without a partition (SKU catalog, users) are visible to all.

use serde::{Deserialize, Serialize};
use shared_types::{Actor, PartitionAssignment, PartitionId, Role};
use std::collections::BTreeSet;

/// Roles that bypass partition checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalRoles(BTreeSet<Role>);

impl GlobalRoles {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self(roles.into_iter().collect())
    }

    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }
}

impl Default for GlobalRoles {
    fn default() -> Self {
        Self::new([Role::SuperAdmin, Role::Admin])
    }
}

/// Evaluated scope of one actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessScope {
    pub is_global: bool,
    pub partitions: BTreeSet<PartitionId>,
}

impl AccessScope {
    /// Scope that allows every partition.
    #[must_use]
    pub fn global() -> Self {
        Self {
            is_global: true,
            partitions: BTreeSet::new(),
        }
    }

    /// Scope restricted to the given partitions.
    pub fn assigned(partitions: impl IntoIterator<Item = PartitionId>) -> Self {
        Self {
            is_global: false,
            partitions: partitions.into_iter().collect(),
        }
    }

    /// Scope that allows nothing partitioned.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// `is_global OR partition ∈ partitions`.
    #[must_use]
    pub fn can_access(&self, partition_id: &PartitionId) -> bool {
        self.is_global || self.partitions.contains(partition_id)
    }

    /// Like [`can_access`](Self::can_access), but unpartitioned records are
    /// always visible.
    #[must_use]
    pub fn can_see(&self, partition_id: Option<&PartitionId>) -> bool {
        partition_id.map_or(true, |p| self.can_access(p))
    }

    /// Drop every item outside the scope.
    ///
    /// Read paths use this so that denial yields an empty result instead of
    /// an error.
    pub fn filter_visible<T, F>(&self, items: impl IntoIterator<Item = T>, partition_of: F) -> Vec<T>
    where
        F: Fn(&T) -> Option<PartitionId>,
    {
        items
            .into_iter()
            .filter(|item| self.can_see(partition_of(item).as_ref()))
            .collect()
    }
}

/// Compute the scope of `actor`.
///
/// Assignments belonging to other actors and inactive assignments are
/// ignored, so callers may pass an unfiltered slice.
#[must_use]
pub fn scope_for(
    actor: &Actor,
    assignments: &[PartitionAssignment],
    global_roles: &GlobalRoles,
) -> AccessScope {
    if global_roles.contains(actor.role) {
        return AccessScope::global();
    }

    AccessScope::assigned(
        assignments
            .iter()
            .filter(|a| a.is_active && a.actor_id == actor.id)
            .map(|a| a.partition_id),
    )
}
