//! Keeps the per-user workflow index in step with workflow state.
//!
//! Runs after the workflow itself has been persisted. Nothing here returns
//! an error: a failed lookup or index write is logged and the remaining
//! writes still run.

use crate::instance::{Assignee, Workflow};
use crate::store::UserWorkflowIndex;
use docflow_core::{UserId, WorkflowId};
use docflow_directory::Directory;
use tracing::warn;

/// Index writer bound to one directory and one index.
pub struct IndexSync<'a> {
    directory: &'a dyn Directory,
    index: &'a dyn UserWorkflowIndex,
}

impl<'a> IndexSync<'a> {
    pub fn new(directory: &'a dyn Directory, index: &'a dyn UserWorkflowIndex) -> Self {
        Self { directory, index }
    }

    /// Expands an assignee into the users acting for it.
    ///
    /// A committee that can no longer be found yields nobody.
    pub async fn participants(&self, assignee: Assignee) -> Vec<UserId> {
        match assignee {
            Assignee::User { user_id } => vec![user_id],
            Assignee::Committee { committee_id } => {
                match self.directory.find_committee(committee_id).await {
                    Ok(Some(committee)) => committee.participants(),
                    Ok(None) => {
                        warn!(%committee_id, "committee disappeared, stage has no participants");
                        Vec::new()
                    }
                    Err(error) => {
                        warn!(%committee_id, %error, "committee lookup failed");
                        Vec::new()
                    }
                }
            }
            Assignee::Unassigned => Vec::new(),
        }
    }

    /// Creates entries for every participant of every stage. Participants of
    /// the current stage are active.
    ///
    /// Returns the current stage's participants.
    pub async fn register(&self, workflow: &Workflow) -> Vec<UserId> {
        let mut everyone: Vec<UserId> = Vec::new();
        let mut current = Vec::new();
        for assignment in &workflow.assigned_users {
            let users = self.participants(assignment.assignee).await;
            if assignment.stage_index == workflow.current_stage_index {
                current.clone_from(&users);
            }
            for user in users {
                if !everyone.contains(&user) {
                    everyone.push(user);
                }
            }
        }

        for user in &everyone {
            self.upsert(*user, workflow.id, current.contains(user)).await;
        }
        current
    }

    /// Deactivates the participants of `from`, then activates those of `to`.
    ///
    /// Returns the newly active participants.
    pub async fn shift(&self, workflow_id: WorkflowId, from: Assignee, to: Assignee) -> Vec<UserId> {
        self.deactivate(workflow_id, from).await;

        let users = self.participants(to).await;
        if users.is_empty() {
            warn!(%workflow_id, "new stage has no participants to activate");
        }
        for user in &users {
            self.upsert(*user, workflow_id, true).await;
        }
        users
    }

    /// Deactivates the participants of `assignee`.
    ///
    /// Returns the participants that were deactivated.
    pub async fn deactivate(&self, workflow_id: WorkflowId, assignee: Assignee) -> Vec<UserId> {
        let users = self.participants(assignee).await;
        for user in &users {
            match self.index.set_active(*user, workflow_id, false).await {
                Ok(true) => {}
                Ok(false) => warn!(%workflow_id, user_id = %user, "no index entry to deactivate"),
                Err(error) => {
                    warn!(%workflow_id, user_id = %user, %error, "index deactivate failed");
                }
            }
        }
        users
    }

    async fn upsert(&self, user_id: UserId, workflow_id: WorkflowId, is_active: bool) {
        if let Err(error) = self.index.upsert(user_id, workflow_id, is_active).await {
            warn!(%workflow_id, %user_id, is_active, %error, "index upsert failed");
        }
    }
}
