//! Workload balancing for single-person stages.

use crate::error::StoreError;
use crate::store::UserWorkflowIndex;
use docflow_core::{RoleId, UserId};
use docflow_directory::{Directory, DirectoryError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Which index entries count towards a user's load.
///
/// Load is read from the index before a new workflow is stored, so every
/// stage of one workflow that names the same role goes to the same user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadMeasure {
    /// Every entry, active or not. Finished work keeps counting against a
    /// user, so long-serving approvers drift out of rotation.
    #[default]
    AllAssignments,
    /// Only entries for stages the user can currently act on.
    ActiveOnly,
}

/// Why no user could be picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalancerError {
    /// Nobody holds the role.
    NoEligibleApprover { role_id: RoleId },
    /// The directory lookup failed.
    Directory(DirectoryError),
    /// The index lookup failed.
    Index(StoreError),
}

impl fmt::Display for BalancerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEligibleApprover { role_id } => write!(f, "no user holds role {role_id}"),
            Self::Directory(e) => write!(f, "{e}"),
            Self::Index(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BalancerError {}

/// Picks the user holding `role_id` with the fewest index entries.
///
/// Candidates are taken in directory order and a later candidate only wins
/// with a strictly smaller count, so ties go to the earliest user.
///
/// # Errors
///
/// Returns `NoEligibleApprover` if the role has no users, or the failing
/// lookup otherwise.
pub async fn select_least_loaded_user(
    directory: &dyn Directory,
    index: &dyn UserWorkflowIndex,
    role_id: RoleId,
    measure: WorkloadMeasure,
) -> Result<UserId, BalancerError> {
    let candidates = directory
        .find_users_by_role(role_id)
        .await
        .map_err(BalancerError::Directory)?;

    let mut best: Option<(UserId, usize)> = None;
    for user in &candidates {
        let entries = index
            .list_for_user(user.id())
            .await
            .map_err(BalancerError::Index)?;
        let load = match measure {
            WorkloadMeasure::AllAssignments => entries.len(),
            WorkloadMeasure::ActiveOnly => entries.iter().filter(|e| e.is_active).count(),
        };
        debug!(user_id = %user.id(), load, "workload candidate");

        if best.is_none_or(|(_, lowest)| load < lowest) {
            best = Some((user.id(), load));
        }
    }

    best.map(|(user_id, _)| user_id)
        .ok_or(BalancerError::NoEligibleApprover { role_id })
}
