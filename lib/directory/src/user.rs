//! User domain type.
//!
//! A user is someone who can request workflows or be assigned as an
//! approver. Authentication happens upstream; the directory only keeps the
//! profile and the roles used for approver selection.

use crate::role::RoleSet;
use chrono::{DateTime, Utc};
use docflow_core::{RoleId, UserId};
use serde::{Deserialize, Serialize};

/// A user known to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Internal platform user ID.
    id: UserId,
    /// Human-readable name shown in notifications.
    display_name: String,
    /// Contact address, if known.
    email: Option<String>,
    /// Roles held by the user.
    roles: RoleSet,
    /// When the user record was created.
    created_at: DateTime<Utc>,
    /// When the user record was last updated.
    updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with a generated ID and no roles.
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            display_name: display_name.into(),
            email: None,
            roles: RoleSet::none(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a user with all fields specified.
    ///
    /// Use this when reconstituting a user from storage.
    #[must_use]
    pub fn with_all_fields(
        id: UserId,
        display_name: String,
        email: Option<String>,
        roles: RoleSet,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            display_name,
            email,
            roles,
            created_at,
            updated_at,
        }
    }

    /// Returns the user's internal platform ID.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the user's email address, if available.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the roles held by the user.
    #[must_use]
    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    /// Returns true if the user holds the role.
    #[must_use]
    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(role)
    }

    /// Returns when the user was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the user was last updated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sets the user's email address.
    pub fn set_email(&mut self, email: Option<String>) {
        self.email = email;
        self.updated_at = Utc::now();
    }

    /// Replaces the user's roles.
    pub fn set_roles(&mut self, roles: RoleSet) {
        self.roles = roles;
        self.updated_at = Utc::now();
    }
}
