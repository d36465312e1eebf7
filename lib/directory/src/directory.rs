//! Directory lookup trait.
//!
//! The workflow engine never reads users or committees directly; it goes
//! through this trait so the backing store can be swapped for an in-memory
//! implementation in tests.

use crate::committee::Committee;
use crate::error::DirectoryError;
use crate::user::User;
use async_trait::async_trait;
use docflow_core::{CommitteeId, RoleId, UserId};

/// Read access to users, roles and committees.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Returns every user holding the role, in a stable store order.
    ///
    /// An empty list is not an error at this layer.
    async fn find_users_by_role(&self, role: RoleId) -> Result<Vec<User>, DirectoryError>;

    /// Finds a user by ID.
    async fn find_user(&self, id: UserId) -> Result<Option<User>, DirectoryError>;

    /// Finds a committee by ID.
    async fn find_committee(&self, id: CommitteeId) -> Result<Option<Committee>, DirectoryError>;
}

/// Write access to users and committees, used by administration surfaces.
#[async_trait]
pub trait DirectoryAdmin: Send + Sync {
    /// Creates or replaces a user.
    async fn save_user(&self, user: &User) -> Result<(), DirectoryError>;

    /// Creates or replaces a committee.
    async fn save_committee(&self, committee: &Committee) -> Result<(), DirectoryError>;
}
