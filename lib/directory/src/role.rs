//! Role membership for approver selection.
//!
//! Roles are opaque identifiers managed by the directory. A stage that needs
//! a single approver names a role, and the workload balancer picks one of
//! the users holding it.

use docflow_core::RoleId;
use serde::{Deserialize, Serialize};

/// Ordered set of roles held by a user.
///
/// Insertion order is preserved and duplicates are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet {
    roles: Vec<RoleId>,
}

impl RoleSet {
    /// Creates an empty role set.
    #[must_use]
    pub fn none() -> Self {
        Self { roles: Vec::new() }
    }

    /// Creates a role set from the given roles, dropping duplicates.
    #[must_use]
    pub fn from_roles(roles: impl IntoIterator<Item = RoleId>) -> Self {
        let mut set = Self::none();
        for role in roles {
            set.insert(role);
        }
        set
    }

    /// Adds a role. Returns false if it was already present.
    pub fn insert(&mut self, role: RoleId) -> bool {
        if self.roles.contains(&role) {
            return false;
        }
        self.roles.push(role);
        true
    }

    /// Removes a role. Returns false if it was not present.
    pub fn remove(&mut self, role: RoleId) -> bool {
        let before = self.roles.len();
        self.roles.retain(|r| *r != role);
        self.roles.len() != before
    }

    /// Returns true if the role is held.
    #[must_use]
    pub fn contains(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }

    /// Returns true if no roles are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Returns the roles as a slice.
    #[must_use]
    pub fn roles(&self) -> &[RoleId] {
        &self.roles
    }
}
