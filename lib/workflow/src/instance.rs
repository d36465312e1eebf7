//! Workflow instances.
//!
//! A workflow is one run of a template for one requester. Its approvers are
//! resolved for every stage when it is created and stored in
//! `assigned_users`, aligned index-for-index with the template's stages.

use chrono::{DateTime, Utc};
use docflow_core::{CommitteeId, DocumentId, TemplateId, UserId, WorkflowId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::votes::Vote;

/// Lifecycle status of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Waiting on the approver of the current stage.
    Pending,
    /// Approved at some stage.
    Approved,
    /// Rejected at some stage.
    Rejected,
    /// Withdrawn by the requester.
    Cancelled,
}

impl WorkflowStatus {
    /// Returns true if no further transitions are possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns the stored name of this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError(pub String);

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown workflow status: {}", self.0)
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for WorkflowStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

/// Who owns a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assignee {
    /// A single user picked by the workload balancer.
    User {
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    /// A committee, acting through its members and chairperson.
    Committee {
        #[serde(rename = "committeeId")]
        committee_id: CommitteeId,
    },
    /// No condition variant matched when the workflow was created.
    Unassigned,
}

/// The resolved owner of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageAssignment {
    pub stage_index: usize,
    pub stage_title: String,
    pub assignee: Assignee,
}

/// Reference to a generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub id: DocumentId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// A workflow instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: WorkflowId,
    pub template_id: TemplateId,
    pub title: String,
    pub description: Option<String>,
    pub requester_id: UserId,
    pub status: WorkflowStatus,
    pub current_stage_index: usize,
    pub assigned_users: Vec<StageAssignment>,
    pub documents: Vec<DocumentRef>,
    #[serde(default)]
    pub votes: Vec<Vote>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Creates a pending workflow at stage 0.
    #[must_use]
    pub fn new(
        template_id: TemplateId,
        requester_id: UserId,
        title: impl Into<String>,
        assigned_users: Vec<StageAssignment>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: WorkflowId::new(),
            template_id,
            title: title.into(),
            description: None,
            requester_id,
            status: WorkflowStatus::Pending,
            current_stage_index: 0,
            assigned_users,
            documents: Vec::new(),
            votes: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.assigned_users.len()
    }

    /// Returns the assignment of the current stage.
    #[must_use]
    pub fn current_assignment(&self) -> Option<&StageAssignment> {
        self.assigned_users.get(self.current_stage_index)
    }

    /// Returns the assignee of the current stage, if the stage exists.
    #[must_use]
    pub fn current_assignee(&self) -> Option<Assignee> {
        self.current_assignment().map(|a| a.assignee)
    }
}

/// Fields a caller may change after creation. Routing fields are not
/// patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPatch {
    #[serde(default)]
    pub title: Option<String>,
    /// An empty string clears the description.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
}

impl WorkflowPatch {
    /// Returns true if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.documents.is_empty()
    }

    /// Merges the patch into a workflow.
    pub fn apply_to(self, workflow: &mut Workflow) {
        if let Some(title) = self.title {
            workflow.title = title;
        }
        if let Some(description) = self.description {
            workflow.description = if description.is_empty() {
                None
            } else {
                Some(description)
            };
        }
        workflow.documents.extend(self.documents);
    }
}
