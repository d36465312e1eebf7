//! The workflow engine.
//!
//! `WorkflowEngine` sequences every operation against its collaborators:
//! validation and approver resolution first, then the authoritative write
//! to the workflow store, then index synchronisation and notifications.
//! Only failures up to and including the authoritative write are reported
//! to the caller.

mod creation;
mod transitions;

#[cfg(test)]
mod tests;

pub use creation::NewWorkflow;

use crate::balancer::WorkloadMeasure;
use crate::error::{EngineError, Entity};
use crate::instance::{Workflow, WorkflowPatch};
use crate::notification::{Notice, NotificationSink};
use crate::store::{DocumentGenerator, TemplateStore, UserWorkflowIndex, WorkflowFilter, WorkflowStore};
use crate::sync::IndexSync;
use crate::template::{TemplateDraft, WorkflowTemplate};
use chrono::{DateTime, Utc};
use docflow_core::{TemplateId, UserId, WorkflowId};
use docflow_directory::Directory;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Result type of engine operations.
pub type EngineResult<T> = docflow_core::Result<T, EngineError>;

/// What to do when no condition variant of a stage matches the submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedConditionPolicy {
    /// Create the workflow with the stage unassigned. Reaching that stage
    /// activates nobody.
    #[default]
    LeaveUnassigned,
    /// Refuse to create the workflow.
    Fail,
}

/// Engine behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub unmatched_condition: UnmatchedConditionPolicy,
    pub workload_measure: WorkloadMeasure,
}

/// The external systems the engine works through.
#[derive(Clone)]
pub struct Collaborators {
    pub templates: Arc<dyn TemplateStore>,
    pub workflows: Arc<dyn WorkflowStore>,
    pub index: Arc<dyn UserWorkflowIndex>,
    pub directory: Arc<dyn Directory>,
    pub documents: Arc<dyn DocumentGenerator>,
    pub notifications: Arc<dyn NotificationSink>,
}

/// A workflow as seen from one user's index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedWorkflow {
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
    pub workflow: Workflow,
}

/// Approval workflow engine.
#[derive(Clone)]
pub struct WorkflowEngine {
    collab: Collaborators,
    config: EngineConfig,
}

impl WorkflowEngine {
    #[must_use]
    pub fn new(collab: Collaborators, config: EngineConfig) -> Self {
        Self { collab, config }
    }

    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Validates and stores a template.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_template(&self, draft: TemplateDraft) -> EngineResult<WorkflowTemplate> {
        let template = WorkflowTemplate::from_draft(draft).map_err(EngineError::from)?;
        self.collab
            .templates
            .insert(&template)
            .await
            .map_err(EngineError::from)?;
        info!(template_id = %template.id, stages = template.stage_count(), "template created");
        Ok(template)
    }

    #[instrument(skip(self))]
    pub async fn get_template(&self, id: TemplateId) -> EngineResult<WorkflowTemplate> {
        let template = self
            .collab
            .templates
            .find(id)
            .await
            .map_err(EngineError::from)?;
        Ok(template.ok_or_else(|| EngineError::not_found(Entity::Template, id))?)
    }

    pub async fn list_templates(&self) -> EngineResult<Vec<WorkflowTemplate>> {
        Ok(self
            .collab
            .templates
            .list()
            .await
            .map_err(EngineError::from)?)
    }

    /// Deletes a template. Workflows already created from it keep their
    /// resolved assignments.
    #[instrument(skip(self))]
    pub async fn delete_template(&self, id: TemplateId) -> EngineResult<()> {
        let removed = self
            .collab
            .templates
            .delete(id)
            .await
            .map_err(EngineError::from)?;
        if !removed {
            return Err(EngineError::not_found(Entity::Template, id).into());
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_workflow(&self, id: WorkflowId) -> EngineResult<Workflow> {
        self.load_workflow(id).await
    }

    pub async fn list_workflows(&self, filter: &WorkflowFilter) -> EngineResult<Vec<Workflow>> {
        Ok(self
            .collab
            .workflows
            .list(filter)
            .await
            .map_err(EngineError::from)?)
    }

    /// Merges a patch into a workflow.
    ///
    /// When `expected_version` is given it must match the stored version.
    #[instrument(skip(self, patch))]
    pub async fn update_workflow(
        &self,
        id: WorkflowId,
        patch: WorkflowPatch,
        expected_version: Option<i64>,
    ) -> EngineResult<Workflow> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(EngineError::validation("title must not be blank").into());
        }

        let mut workflow = self.load_workflow(id).await?;
        if expected_version.is_some_and(|v| v != workflow.version) {
            return Err(EngineError::Conflict { workflow_id: id }.into());
        }
        if patch.is_empty() {
            return Ok(workflow);
        }

        let expected = workflow.version;
        patch.apply_to(&mut workflow);
        workflow.updated_at = Utc::now();
        workflow.version = self
            .collab
            .workflows
            .update(&workflow, expected)
            .await
            .map_err(EngineError::from)?;
        Ok(workflow)
    }

    /// Deletes a workflow and, best-effort, its index entries and documents.
    #[instrument(skip(self))]
    pub async fn delete_workflow(&self, id: WorkflowId) -> EngineResult<()> {
        let removed = self
            .collab
            .workflows
            .delete(id)
            .await
            .map_err(EngineError::from)?;
        if !removed {
            return Err(EngineError::not_found(Entity::Workflow, id).into());
        }
        if let Err(error) = self.collab.index.remove_workflow(id).await {
            warn!(workflow_id = %id, %error, "failed to remove index entries");
        }
        if let Err(error) = self.collab.documents.discard(id).await {
            warn!(workflow_id = %id, %error, "failed to discard documents");
        }
        info!(workflow_id = %id, "workflow deleted");
        Ok(())
    }

    /// Lists the workflows in a user's index.
    ///
    /// Entries whose workflow has since been deleted are skipped.
    #[instrument(skip(self))]
    pub async fn user_workflows(
        &self,
        user_id: UserId,
        active_only: bool,
    ) -> EngineResult<Vec<AssignedWorkflow>> {
        let entries = self
            .collab
            .index
            .list_for_user(user_id)
            .await
            .map_err(EngineError::from)?;

        let mut out = Vec::with_capacity(entries.len());
        for entry in entries.into_iter().filter(|e| e.is_active || !active_only) {
            let found = self
                .collab
                .workflows
                .find(entry.workflow_id)
                .await
                .map_err(EngineError::from)?;
            match found {
                Some(workflow) => out.push(AssignedWorkflow {
                    is_active: entry.is_active,
                    updated_at: entry.updated_at,
                    workflow,
                }),
                None => debug!(workflow_id = %entry.workflow_id, "index entry without workflow"),
            }
        }
        Ok(out)
    }

    async fn load_workflow(&self, id: WorkflowId) -> EngineResult<Workflow> {
        let workflow = self
            .collab
            .workflows
            .find(id)
            .await
            .map_err(EngineError::from)?;
        Ok(workflow.ok_or_else(|| EngineError::not_found(Entity::Workflow, id))?)
    }

    fn index_sync(&self) -> IndexSync<'_> {
        IndexSync::new(self.collab.directory.as_ref(), self.collab.index.as_ref())
    }

    async fn notify_all(
        &self,
        recipients: &[UserId],
        sender: UserId,
        workflow_id: WorkflowId,
        message: &str,
    ) {
        for recipient in recipients {
            let notice = Notice {
                recipient: *recipient,
                sender,
                message: message.to_string(),
                workflow_id,
            };
            if let Err(error) = self.collab.notifications.notify(notice).await {
                warn!(%workflow_id, recipient = %recipient, %error, "notification failed");
            }
        }
    }
}
