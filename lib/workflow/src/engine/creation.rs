use super::{EngineResult, UnmatchedConditionPolicy, WorkflowEngine};
use crate::balancer::{BalancerError, select_least_loaded_user};
use crate::error::{EngineError, Entity};
use crate::instance::{Assignee, StageAssignment, Workflow};
use crate::selector::{SubmittedDocument, select_approver};
use crate::template::{ApproverRule, WorkflowTemplate};
use docflow_core::{TemplateId, UserId};
use tracing::{info, instrument, warn};

/// A request to start a workflow from a template.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkflow {
    pub template_id: TemplateId,
    pub requester_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub documents: Vec<SubmittedDocument>,
}

impl WorkflowEngine {
    /// Creates a workflow, resolving the approver of every stage up front.
    ///
    /// Nothing is persisted unless every stage resolves, and generated
    /// documents are discarded if the workflow cannot be stored. Index entries and
    /// notifications are written after the workflow itself and never fail
    /// the call.
    #[instrument(skip(self, request), fields(template_id = %request.template_id, requester_id = %request.requester_id))]
    pub async fn create_workflow(&self, request: NewWorkflow) -> EngineResult<Workflow> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(EngineError::validation("title must not be blank").into());
        }

        let requester = self
            .collab
            .directory
            .find_user(request.requester_id)
            .await
            .map_err(EngineError::from)?;
        if requester.is_none() {
            return Err(EngineError::not_found(Entity::User, request.requester_id).into());
        }

        let template = self.get_template(request.template_id).await?;
        let assigned = self.resolve_stages(&template, &request.documents).await?;

        let mut workflow = Workflow::new(template.id, request.requester_id, title, assigned);
        workflow.description = request.description;
        workflow.documents = self
            .collab
            .documents
            .generate(workflow.id, &request.documents)
            .await
            .map_err(EngineError::from)?;

        if let Err(error) = self.collab.workflows.insert(&workflow).await {
            if let Err(discard) = self.collab.documents.discard(workflow.id).await {
                warn!(workflow_id = %workflow.id, error = %discard, "failed to discard documents");
            }
            return Err(EngineError::from(error).into());
        }
        info!(workflow_id = %workflow.id, stages = workflow.stage_count(), "workflow created");

        let recipients = self.index_sync().register(&workflow).await;
        let stage_title = workflow
            .current_assignment()
            .map(|a| a.stage_title.clone())
            .unwrap_or_default();
        let message = format!(
            "Workflow \"{}\" is waiting for your review at stage \"{stage_title}\"",
            workflow.title
        );
        self.notify_all(&recipients, workflow.requester_id, workflow.id, &message)
            .await;

        Ok(workflow)
    }

    /// Resolves the assignee of every stage in one pass.
    async fn resolve_stages(
        &self,
        template: &WorkflowTemplate,
        documents: &[SubmittedDocument],
    ) -> EngineResult<Vec<StageAssignment>> {
        let mut assigned = Vec::with_capacity(template.stage_count());
        for (stage_index, stage) in template.stages.iter().enumerate() {
            let assignee = match select_approver(stage, documents) {
                Some(rule) => self.resolve_rule(stage_index, rule).await?,
                None => match self.config.unmatched_condition {
                    UnmatchedConditionPolicy::LeaveUnassigned => {
                        warn!(stage_index, "no condition variant matched, stage left unassigned");
                        Assignee::Unassigned
                    }
                    UnmatchedConditionPolicy::Fail => {
                        return Err(EngineError::NoEligibleApprover {
                            stage_index,
                            reason: "no condition variant matched the submitted data".to_string(),
                        }
                        .into());
                    }
                },
            };
            assigned.push(StageAssignment {
                stage_index,
                stage_title: stage.stage_title.clone(),
                assignee,
            });
        }
        Ok(assigned)
    }

    async fn resolve_rule(&self, stage_index: usize, rule: ApproverRule) -> EngineResult<Assignee> {
        match rule {
            ApproverRule::SinglePerson { role_id } => {
                let user_id = select_least_loaded_user(
                    self.collab.directory.as_ref(),
                    self.collab.index.as_ref(),
                    role_id,
                    self.config.workload_measure,
                )
                .await
                .map_err(|e| match e {
                    BalancerError::NoEligibleApprover { role_id } => EngineError::NoEligibleApprover {
                        stage_index,
                        reason: format!("no user holds role {role_id}"),
                    },
                    BalancerError::Directory(inner) => EngineError::from(inner),
                    BalancerError::Index(inner) => EngineError::from(inner),
                })?;
                Ok(Assignee::User { user_id })
            }
            ApproverRule::Committee { committee_id } => {
                let committee = self
                    .collab
                    .directory
                    .find_committee(committee_id)
                    .await
                    .map_err(EngineError::from)?;
                if committee.is_none() {
                    return Err(EngineError::NoEligibleApprover {
                        stage_index,
                        reason: format!("committee {committee_id} does not exist"),
                    }
                    .into());
                }
                Ok(Assignee::Committee { committee_id })
            }
        }
    }
}

impl NewWorkflow {
    /// Creates a request with no description or documents.
    #[must_use]
    pub fn new(template_id: TemplateId, requester_id: UserId, title: impl Into<String>) -> Self {
        Self {
            template_id,
            requester_id,
            title: title.into(),
            description: None,
            documents: Vec::new(),
        }
    }
}
