use super::{EngineResult, WorkflowEngine};
use crate::error::{EngineError, Entity, TransitionError};
use crate::instance::{Assignee, Workflow, WorkflowStatus};
use crate::transition::{Action, Outcome};
use crate::votes::{Decision, Tally};
use docflow_core::{UserId, WorkflowId};
use tracing::{info, instrument, warn};

impl WorkflowEngine {
    /// Applies a stage move on behalf of `actor`.
    ///
    /// Only the requester may cancel. The workflow is persisted with a
    /// version check before the index and notifications are touched.
    #[instrument(skip(self), fields(workflow_id = %id, actor = %actor, action = %action))]
    pub async fn transition(
        &self,
        id: WorkflowId,
        actor: UserId,
        action: Action,
    ) -> EngineResult<Workflow> {
        let workflow = self.load_workflow(id).await?;
        if action == Action::Cancel && actor != workflow.requester_id {
            return Err(EngineError::validation("only the requester can cancel a workflow").into());
        }
        self.apply_and_persist(workflow, actor, action).await
    }

    /// Applies a decision reached by the participants of the current stage.
    #[instrument(skip(self), fields(workflow_id = %id, actor = %actor, decision = %decision))]
    pub async fn decide(
        &self,
        id: WorkflowId,
        actor: UserId,
        decision: Decision,
    ) -> EngineResult<Workflow> {
        let workflow = self.load_workflow(id).await?;
        self.apply_and_persist(workflow, actor, decision.into()).await
    }

    /// Records a vote on the current stage.
    ///
    /// The stage must be owned by a committee and the voter must be one of
    /// its participants. A second vote by the same user replaces the first.
    #[instrument(skip(self, comment), fields(workflow_id = %id, voter = %voter, decision = %decision))]
    pub async fn cast_vote(
        &self,
        id: WorkflowId,
        voter: UserId,
        decision: Decision,
        comment: Option<String>,
    ) -> EngineResult<Workflow> {
        let mut workflow = self.load_workflow(id).await?;
        if workflow.status.is_terminal() {
            return Err(EngineError::InvalidTransition {
                workflow_id: id,
                action: decision.into(),
                reason: TransitionError::Terminal {
                    status: workflow.status,
                },
            }
            .into());
        }

        let Some(Assignee::Committee { committee_id }) = workflow.current_assignee() else {
            return Err(EngineError::validation("current stage is not a committee stage").into());
        };
        let committee = self
            .collab
            .directory
            .find_committee(committee_id)
            .await
            .map_err(EngineError::from)?
            .ok_or_else(|| EngineError::not_found(Entity::Committee, committee_id))?;
        if !committee.includes(voter) {
            return Err(EngineError::validation(format!(
                "user {voter} is not a participant of committee {committee_id}"
            ))
            .into());
        }

        let expected = workflow.version;
        workflow.record_vote(voter, decision, comment);
        workflow.version = self
            .collab
            .workflows
            .update(&workflow, expected)
            .await
            .map_err(EngineError::from)?;
        Ok(workflow)
    }

    /// Tallies the votes cast on the current stage.
    #[instrument(skip(self))]
    pub async fn tally(&self, id: WorkflowId) -> EngineResult<Tally> {
        let workflow = self.load_workflow(id).await?;
        Ok(workflow.current_tally())
    }

    async fn apply_and_persist(
        &self,
        mut workflow: Workflow,
        actor: UserId,
        action: Action,
    ) -> EngineResult<Workflow> {
        let id = workflow.id;
        let expected = workflow.version;
        let outcome = workflow
            .apply(action)
            .map_err(|reason| EngineError::InvalidTransition {
                workflow_id: id,
                action,
                reason,
            })?;

        workflow.version = self
            .collab
            .workflows
            .update(&workflow, expected)
            .await
            .map_err(EngineError::from)?;
        info!(workflow_id = %id, version = workflow.version, ?outcome, "workflow transitioned");

        let sync = self.index_sync();
        match outcome {
            Outcome::Moved { from, to } => {
                let activated = sync
                    .shift(id, assignee_at(&workflow, from), assignee_at(&workflow, to))
                    .await;
                if activated.is_empty() {
                    warn!(workflow_id = %id, stage_index = to, "stage has no one to act on it");
                }
                let stage_title = workflow
                    .assigned_users
                    .get(to)
                    .map(|a| a.stage_title.as_str())
                    .unwrap_or_default();
                let message = format!(
                    "Workflow \"{}\" is waiting for your review at stage \"{stage_title}\"",
                    workflow.title
                );
                self.notify_all(&activated, actor, id, &message).await;
            }
            Outcome::Finished {
                status,
                stage_index,
            } => {
                let released = sync.deactivate(id, assignee_at(&workflow, stage_index)).await;
                if status == WorkflowStatus::Cancelled {
                    let message = format!("Workflow \"{}\" was cancelled by its requester", workflow.title);
                    self.notify_all(&released, actor, id, &message).await;
                } else {
                    let message = format!("Your workflow \"{}\" was {status}", workflow.title);
                    self.notify_all(&[workflow.requester_id], actor, id, &message)
                        .await;
                }
            }
        }

        Ok(workflow)
    }
}

fn assignee_at(workflow: &Workflow, stage_index: usize) -> Assignee {
    workflow
        .assigned_users
        .get(stage_index)
        .map_or(Assignee::Unassigned, |a| a.assignee)
}
