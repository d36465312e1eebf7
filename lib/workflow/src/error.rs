//! Error types for the workflow crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `StageError` / `TemplateError`: template validation failures
//! - `TransitionError`: a stage move that the state machine refuses
//! - `StoreError`: failures of an external collaborator (stores, sinks)
//! - `EngineError`: what engine operations report, wrapped in a `Report`

use crate::instance::WorkflowStatus;
use crate::transition::Action;
use docflow_core::WorkflowId;
use std::fmt;

/// A stage definition that cannot be turned into a routable stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// The stage title is empty or whitespace.
    BlankTitle,
    /// `hasCondition` is false but condition fields were supplied.
    ConditionFieldsWithoutFlag,
    /// `hasCondition` is true but a direct approver was supplied.
    DirectApproverWithCondition,
    /// `hasCondition` is false and no direct approver was supplied.
    MissingApprover,
    /// `hasCondition` is true and the condition field name is missing.
    MissingCondition,
    /// `hasCondition` is true and no variants were supplied.
    NoConditionVariants,
    /// The approver spec does not match the approver type.
    ApproverSpecMismatch { details: String },
    /// A variant compares against NaN or infinity.
    NonFiniteValue { variant_index: usize },
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "stage title is required"),
            Self::ConditionFieldsWithoutFlag => {
                write!(f, "condition fields present but hasCondition is false")
            }
            Self::DirectApproverWithCondition => {
                write!(f, "direct approver present but hasCondition is true")
            }
            Self::MissingApprover => write!(f, "approverType and approverSpec are required"),
            Self::MissingCondition => write!(f, "condition field name is required"),
            Self::NoConditionVariants => write!(f, "at least one condition variant is required"),
            Self::ApproverSpecMismatch { details } => {
                write!(f, "approver spec mismatch: {details}")
            }
            Self::NonFiniteValue { variant_index } => {
                write!(f, "condition variant {variant_index} has a non-finite value")
            }
        }
    }
}

impl std::error::Error for StageError {}

/// A template draft that fails validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template name is empty or whitespace.
    BlankName,
    /// The template has no stages.
    NoStages,
    /// One of the stages is invalid.
    InvalidStage {
        stage_index: usize,
        reason: StageError,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankName => write!(f, "template name is required"),
            Self::NoStages => write!(f, "template must define at least one stage"),
            Self::InvalidStage {
                stage_index,
                reason,
            } => write!(f, "stage {stage_index}: {reason}"),
        }
    }
}

impl std::error::Error for TemplateError {}

/// A stage move refused by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The workflow already reached a terminal status.
    Terminal { status: WorkflowStatus },
    /// `forward` was requested on the last stage.
    PastLastStage { stage_index: usize },
    /// `revert` was requested on the first stage.
    BeforeFirstStage,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal { status } => write!(f, "workflow is already {status}"),
            Self::PastLastStage { stage_index } => {
                write!(f, "stage {stage_index} is the last stage")
            }
            Self::BeforeFirstStage => write!(f, "workflow is at the first stage"),
        }
    }
}

impl std::error::Error for TransitionError {}

/// Errors from external collaborators (stores, generators, sinks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The collaborator could not be reached or the call failed.
    Unavailable { reason: String },
    /// The stored version no longer matches the version that was read.
    VersionConflict {
        workflow_id: WorkflowId,
        expected: i64,
    },
    /// A stored record could not be decoded.
    Corrupt { id: String, reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "store unavailable: {reason}"),
            Self::VersionConflict {
                workflow_id,
                expected,
            } => write!(
                f,
                "workflow {workflow_id} changed concurrently (expected version {expected})"
            ),
            Self::Corrupt { id, reason } => write!(f, "corrupt record {id}: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Kinds of entity an engine lookup can miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Template,
    Workflow,
    User,
    Committee,
    Notification,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Template => "template",
            Self::Workflow => "workflow",
            Self::User => "user",
            Self::Committee => "committee",
            Self::Notification => "notification",
        };
        f.write_str(name)
    }
}

/// Coarse classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    NoEligibleApprover,
    Validation,
    Conflict,
    Dependency,
}

impl ErrorKind {
    /// Returns the stable wire name of this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidTransition => "invalid_transition",
            Self::NoEligibleApprover => "no_eligible_approver",
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::Dependency => "dependency_failure",
        }
    }
}

/// Errors reported by engine operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A referenced record does not exist.
    NotFound { entity: Entity, id: String },
    /// The requested stage move is not allowed from the current state.
    InvalidTransition {
        workflow_id: WorkflowId,
        action: Action,
        reason: TransitionError,
    },
    /// No approver could be resolved for a stage.
    NoEligibleApprover { stage_index: usize, reason: String },
    /// Malformed input, rejected before any persistence.
    Validation { details: String },
    /// A concurrent change won the race for this workflow.
    Conflict { workflow_id: WorkflowId },
    /// A store or collaborator failed.
    Dependency { details: String },
}

impl EngineError {
    /// Builds a `NotFound` error for the given entity.
    pub fn not_found(entity: Entity, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Builds a `Validation` error.
    pub fn validation(details: impl Into<String>) -> Self {
        Self::Validation {
            details: details.into(),
        }
    }

    /// Returns the coarse kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::NoEligibleApprover { .. } => ErrorKind::NoEligibleApprover,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Dependency { .. } => ErrorKind::Dependency,
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidTransition {
                workflow_id,
                action,
                reason,
            } => write!(f, "cannot {action} workflow {workflow_id}: {reason}"),
            Self::NoEligibleApprover {
                stage_index,
                reason,
            } => write!(f, "no eligible approver for stage {stage_index}: {reason}"),
            Self::Validation { details } => write!(f, "validation failed: {details}"),
            Self::Conflict { workflow_id } => {
                write!(f, "workflow {workflow_id} was modified concurrently")
            }
            Self::Dependency { details } => write!(f, "dependency failure: {details}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<TemplateError> for EngineError {
    fn from(e: TemplateError) -> Self {
        Self::Validation {
            details: e.to_string(),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::VersionConflict { workflow_id, .. } => Self::Conflict { workflow_id },
            other => Self::Dependency {
                details: other.to_string(),
            },
        }
    }
}

impl From<docflow_directory::DirectoryError> for EngineError {
    fn from(e: docflow_directory::DirectoryError) -> Self {
        Self::Dependency {
            details: e.to_string(),
        }
    }
}
