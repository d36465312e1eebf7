//! Approval workflow engine for docflow.
//!
//! This crate provides:
//!
//! - **Templates**: ordered approval stages with direct or conditional
//!   approver rules, validated from their wire shape
//! - **Approver selection**: picks a stage's rule from submitted form data
//! - **Workload balancing**: the least-loaded holder of a role wins
//! - **Transitions**: forward, revert, approve, reject and cancel, plus
//!   committee votes and majority decisions
//! - **Index sync**: keeps the per-user workflow index in step, best-effort
//! - **Collaborator traits** for stores, documents and notifications, with
//!   in-memory implementations in [`memory`]

pub mod balancer;
pub mod engine;
pub mod error;
pub mod instance;
pub mod memory;
pub mod notification;
pub mod selector;
pub mod store;
pub mod sync;
pub mod template;
pub mod transition;
pub mod votes;

pub use balancer::{WorkloadMeasure, select_least_loaded_user};
pub use engine::{
    AssignedWorkflow, Collaborators, EngineConfig, EngineResult, NewWorkflow,
    UnmatchedConditionPolicy, WorkflowEngine,
};
pub use error::{EngineError, Entity, ErrorKind, StoreError, TemplateError, TransitionError};
pub use instance::{Assignee, DocumentRef, StageAssignment, Workflow, WorkflowPatch, WorkflowStatus};
pub use notification::{Notice, Notification, NotificationInbox, NotificationSink};
pub use selector::{SubmittedDocument, select_approver};
pub use store::{
    DocumentGenerator, IndexEntry, TemplateStore, UserWorkflowIndex, WorkflowFilter, WorkflowStore,
};
pub use template::{ApproverRule, Stage, StageDraft, TemplateDraft, WorkflowTemplate};
pub use transition::{Action, Outcome};
pub use votes::{Decision, Tally, Vote, aggregate_votes};
