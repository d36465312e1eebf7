//! Collaborator traits for persistence.
//!
//! The engine owns no storage. Templates, workflows, the per-user workflow
//! index and document generation are reached through these traits; the
//! server provides Postgres implementations and `crate::memory` provides
//! in-memory ones.

use crate::error::StoreError;
use crate::instance::{DocumentRef, Workflow, WorkflowStatus};
use crate::selector::SubmittedDocument;
use crate::template::WorkflowTemplate;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docflow_core::{TemplateId, UserId, WorkflowId};
use serde::{Deserialize, Serialize};

/// Storage for workflow templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Stores a new template.
    async fn insert(&self, template: &WorkflowTemplate) -> Result<(), StoreError>;

    /// Finds a template by ID.
    async fn find(&self, id: TemplateId) -> Result<Option<WorkflowTemplate>, StoreError>;

    /// Lists all templates, oldest first.
    async fn list(&self) -> Result<Vec<WorkflowTemplate>, StoreError>;

    /// Deletes a template. Returns false if it did not exist.
    async fn delete(&self, id: TemplateId) -> Result<bool, StoreError>;
}

/// Filter for listing workflows. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowFilter {
    pub status: Option<WorkflowStatus>,
    pub requester: Option<UserId>,
    pub template: Option<TemplateId>,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
}

impl WorkflowFilter {
    /// Returns true if the workflow passes every set criterion.
    #[must_use]
    pub fn matches(&self, workflow: &Workflow) -> bool {
        if self.status.is_some_and(|s| s != workflow.status) {
            return false;
        }
        if self.requester.is_some_and(|r| r != workflow.requester_id) {
            return false;
        }
        if self.template.is_some_and(|t| t != workflow.template_id) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => workflow
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }
}

/// Storage for workflow instances.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Stores a new workflow.
    async fn insert(&self, workflow: &Workflow) -> Result<(), StoreError>;

    /// Finds a workflow by ID.
    async fn find(&self, id: WorkflowId) -> Result<Option<Workflow>, StoreError>;

    /// Lists workflows matching the filter, newest first.
    async fn list(&self, filter: &WorkflowFilter) -> Result<Vec<Workflow>, StoreError>;

    /// Replaces a workflow if its stored version equals `expected_version`.
    ///
    /// Returns the new version, which is `expected_version + 1`.
    ///
    /// # Errors
    ///
    /// Returns `VersionConflict` if the stored version differs or the
    /// workflow no longer exists.
    async fn update(&self, workflow: &Workflow, expected_version: i64) -> Result<i64, StoreError>;

    /// Deletes a workflow. Returns false if it did not exist.
    async fn delete(&self, id: WorkflowId) -> Result<bool, StoreError>;
}

/// One row of the per-user workflow index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub user_id: UserId,
    pub workflow_id: WorkflowId,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// The denormalized per-user workflow index.
///
/// There is at most one entry per `(user, workflow)` pair.
#[async_trait]
pub trait UserWorkflowIndex: Send + Sync {
    /// Creates or updates the entry for a pair.
    async fn upsert(
        &self,
        user_id: UserId,
        workflow_id: WorkflowId,
        is_active: bool,
    ) -> Result<(), StoreError>;

    /// Lists a user's entries, most recently updated first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<IndexEntry>, StoreError>;

    /// Sets the active flag of an existing entry. Returns false if the pair
    /// has no entry.
    async fn set_active(
        &self,
        user_id: UserId,
        workflow_id: WorkflowId,
        is_active: bool,
    ) -> Result<bool, StoreError>;

    /// Removes every entry for a workflow.
    async fn remove_workflow(&self, workflow_id: WorkflowId) -> Result<(), StoreError>;
}

/// Turns submitted forms into stored documents.
#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    /// Generates one document per submission for the workflow.
    async fn generate(
        &self,
        workflow_id: WorkflowId,
        documents: &[SubmittedDocument],
    ) -> Result<Vec<DocumentRef>, StoreError>;

    /// Removes every document generated for the workflow.
    async fn discard(&self, workflow_id: WorkflowId) -> Result<(), StoreError>;
}
