use super::*;
use crate::error::ErrorKind;
use crate::instance::{Assignee, WorkflowStatus};
use crate::memory::{
    MemoryDirectory, MemoryDocumentGenerator, MemoryNotifications, MemoryTemplateStore,
    MemoryUserWorkflowIndex, MemoryWorkflowStore,
};
use crate::selector::{ContentField, Section, SubmittedDocument};
use crate::template::{ApproverRule, ConditionVariant, Operator, Stage};
use crate::transition::Action;
use crate::votes::Decision;
use docflow_core::{CommitteeId, RoleId};
use docflow_directory::{Committee, RoleSet, User};
use serde_json::json;
use std::fmt::Debug;

struct Fixture {
    engine: WorkflowEngine,
    directory: Arc<MemoryDirectory>,
    templates: Arc<MemoryTemplateStore>,
    workflows: Arc<MemoryWorkflowStore>,
    index: Arc<MemoryUserWorkflowIndex>,
    documents: Arc<MemoryDocumentGenerator>,
    notifications: Arc<MemoryNotifications>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    fn with_config(config: EngineConfig) -> Self {
        let directory = Arc::new(MemoryDirectory::new());
        let templates = Arc::new(MemoryTemplateStore::new());
        let workflows = Arc::new(MemoryWorkflowStore::new());
        let index = Arc::new(MemoryUserWorkflowIndex::new());
        let documents = Arc::new(MemoryDocumentGenerator::new());
        let notifications = Arc::new(MemoryNotifications::new());
        let engine = WorkflowEngine::new(
            Collaborators {
                templates: templates.clone(),
                workflows: workflows.clone(),
                index: index.clone(),
                directory: directory.clone(),
                documents: documents.clone(),
                notifications: notifications.clone(),
            },
            config,
        );
        Self {
            engine,
            directory,
            templates,
            workflows,
            index,
            documents,
            notifications,
        }
    }

    async fn user(&self, name: &str, roles: &[RoleId]) -> UserId {
        let mut user = User::new(name);
        user.set_roles(RoleSet::from_roles(roles.iter().copied()));
        let id = user.id();
        self.directory.add_user(user).await;
        id
    }

    async fn committee(&self, members: &[UserId], chair: UserId) -> CommitteeId {
        let committee = Committee::new("Board", members.to_vec(), chair);
        let id = committee.id;
        self.directory.add_committee(committee).await;
        id
    }

    async fn template(&self, stages: Vec<Stage>) -> TemplateId {
        let template = WorkflowTemplate::new("Purchase", stages);
        self.templates.insert(&template).await.expect("insert");
        template.id
    }

    async fn start(&self, template_id: TemplateId, requester: UserId) -> Workflow {
        self.engine
            .create_workflow(NewWorkflow::new(template_id, requester, "Laptop"))
            .await
            .expect("create workflow")
    }

    async fn active_users(&self, workflow_id: WorkflowId) -> Vec<UserId> {
        self.index
            .entries_for_workflow(workflow_id)
            .await
            .into_iter()
            .filter(|e| e.is_active)
            .map(|e| e.user_id)
            .collect()
    }

    async fn notified(&self, user: UserId) -> usize {
        self.notifications
            .delivered()
            .await
            .iter()
            .filter(|n| n.recipient_id == user)
            .count()
    }
}

fn single(title: &str, role_id: RoleId) -> Stage {
    Stage::direct(title, ApproverRule::SinglePerson { role_id })
}

fn board(title: &str, committee_id: CommitteeId) -> Stage {
    Stage::direct(title, ApproverRule::Committee { committee_id })
}

fn amount_form(amount: serde_json::Value) -> Vec<SubmittedDocument> {
    vec![SubmittedDocument {
        title: "Purchase request".to_string(),
        sections: vec![Section {
            title: "Cost".to_string(),
            contents: vec![ContentField {
                title: "amount".to_string(),
                value: amount,
            }],
        }],
    }]
}

fn amount_stage(committee_id: CommitteeId, role_id: RoleId) -> Stage {
    Stage::conditional(
        "Budget",
        "amount",
        vec![
            ConditionVariant {
                condition_name: "large".to_string(),
                operator: Operator::AtLeast,
                value: 10_000.0,
                approver: ApproverRule::Committee { committee_id },
            },
            ConditionVariant {
                condition_name: "small".to_string(),
                operator: Operator::LessThan,
                value: 10_000.0,
                approver: ApproverRule::SinglePerson { role_id },
            },
        ],
    )
}

fn kind<T: Debug>(result: EngineResult<T>) -> ErrorKind {
    result.expect_err("expected an error").current_context().kind()
}

#[tokio::test]
async fn create_assigns_every_stage_and_activates_first() {
    let fx = Fixture::new();
    let (r1, r2, r3) = (RoleId::new(), RoleId::new(), RoleId::new());
    let a = fx.user("A", &[r1]).await;
    let b = fx.user("B", &[r2]).await;
    let c = fx.user("C", &[r3]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx
        .template(vec![single("One", r1), single("Two", r2), single("Three", r3)])
        .await;

    let wf = fx.start(template, requester).await;

    assert_eq!(wf.assigned_users.len(), 3);
    assert_eq!(wf.current_stage_index, 0);
    assert_eq!(wf.status, WorkflowStatus::Pending);
    assert_eq!(
        wf.assigned_users
            .iter()
            .map(|s| s.assignee)
            .collect::<Vec<_>>(),
        vec![
            Assignee::User { user_id: a },
            Assignee::User { user_id: b },
            Assignee::User { user_id: c },
        ]
    );
    assert_eq!(fx.active_users(wf.id).await, vec![a]);
    assert_eq!(fx.index.entries_for_workflow(wf.id).await.len(), 3);
    assert_eq!(fx.notified(a).await, 1);
    assert_eq!(fx.notified(b).await, 0);
}

#[tokio::test]
async fn forward_moves_activity_to_next_stage() {
    let fx = Fixture::new();
    let (r1, r2) = (RoleId::new(), RoleId::new());
    let a = fx.user("A", &[r1]).await;
    let b = fx.user("B", &[r2]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("One", r1), single("Two", r2)]).await;
    let wf = fx.start(template, requester).await;

    let moved = fx
        .engine
        .transition(wf.id, a, Action::Forward)
        .await
        .expect("forward");

    assert_eq!(moved.current_stage_index, 1);
    assert_eq!(moved.version, wf.version + 1);
    assert_eq!(fx.active_users(wf.id).await, vec![b]);
    assert_eq!(fx.notified(b).await, 1);
}

#[tokio::test]
async fn forward_past_last_stage_leaves_state_unchanged() {
    let fx = Fixture::new();
    let r1 = RoleId::new();
    let a = fx.user("A", &[r1]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("Only", r1)]).await;
    let wf = fx.start(template, requester).await;

    assert_eq!(
        kind(fx.engine.transition(wf.id, a, Action::Forward).await),
        ErrorKind::InvalidTransition
    );
    let stored = fx.engine.get_workflow(wf.id).await.expect("get");
    assert_eq!(stored, wf);
    assert_eq!(fx.active_users(wf.id).await, vec![a]);
}

#[tokio::test]
async fn revert_from_first_stage_is_invalid() {
    let fx = Fixture::new();
    let (r1, r2) = (RoleId::new(), RoleId::new());
    let a = fx.user("A", &[r1]).await;
    fx.user("B", &[r2]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("One", r1), single("Two", r2)]).await;
    let wf = fx.start(template, requester).await;

    assert_eq!(
        kind(fx.engine.transition(wf.id, a, Action::Revert).await),
        ErrorKind::InvalidTransition
    );
}

#[tokio::test]
async fn revert_reactivates_previous_stage() {
    let fx = Fixture::new();
    let (r1, r2) = (RoleId::new(), RoleId::new());
    let a = fx.user("A", &[r1]).await;
    let b = fx.user("B", &[r2]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("One", r1), single("Two", r2)]).await;
    let wf = fx.start(template, requester).await;

    fx.engine
        .transition(wf.id, a, Action::Forward)
        .await
        .expect("forward");
    let back = fx
        .engine
        .transition(wf.id, b, Action::Revert)
        .await
        .expect("revert");
    assert_eq!(back.current_stage_index, 0);
    assert_eq!(fx.active_users(wf.id).await, vec![a]);
}

#[tokio::test]
async fn terminal_workflows_refuse_further_moves() {
    let fx = Fixture::new();
    let (r1, r2) = (RoleId::new(), RoleId::new());
    let a = fx.user("A", &[r1]).await;
    fx.user("B", &[r2]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("One", r1), single("Two", r2)]).await;

    let approved = fx.start(template, requester).await;
    let done = fx
        .engine
        .transition(approved.id, a, Action::Approve)
        .await
        .expect("approve");
    assert_eq!(done.status, WorkflowStatus::Approved);
    assert_eq!(fx.notified(requester).await, 1);
    assert!(fx.active_users(approved.id).await.is_empty());

    let rejected = fx.start(template, requester).await;
    fx.engine
        .transition(rejected.id, a, Action::Reject)
        .await
        .expect("reject");

    for id in [approved.id, rejected.id] {
        for action in [
            Action::Forward,
            Action::Revert,
            Action::Approve,
            Action::Reject,
            Action::Cancel,
        ] {
            assert_eq!(
                kind(fx.engine.transition(id, requester, action).await),
                ErrorKind::InvalidTransition
            );
        }
    }
}

#[tokio::test]
async fn single_committee_single_scenario() {
    let fx = Fixture::new();
    let (r1, r3) = (RoleId::new(), RoleId::new());
    let first = fx.user("First", &[r1]).await;
    let member = fx.user("Member", &[]).await;
    let chair = fx.user("Chair", &[]).await;
    let last = fx.user("Last", &[r3]).await;
    let requester = fx.user("Requester", &[]).await;
    let committee = fx.committee(&[member], chair).await;
    let template = fx
        .template(vec![
            single("Manager", r1),
            board("Board", committee),
            single("Finance", r3),
        ])
        .await;
    let wf = fx.start(template, requester).await;

    fx.engine
        .transition(wf.id, first, Action::Forward)
        .await
        .expect("forward");
    assert_eq!(fx.active_users(wf.id).await, vec![member, chair]);

    fx.engine
        .transition(wf.id, chair, Action::Forward)
        .await
        .expect("forward");
    assert_eq!(fx.active_users(wf.id).await, vec![last]);

    let done = fx
        .engine
        .transition(wf.id, last, Action::Approve)
        .await
        .expect("approve");
    assert_eq!(done.status, WorkflowStatus::Approved);
    assert_eq!(done.current_stage_index, 2);
    assert!(fx.active_users(wf.id).await.is_empty());
}

#[tokio::test]
async fn creation_picks_least_loaded_role_holder() {
    let fx = Fixture::new();
    let role = RoleId::new();
    let a = fx.user("A", &[role]).await;
    let b = fx.user("B", &[role]).await;
    let c = fx.user("C", &[role]).await;
    for (user, load) in [(a, 2), (c, 1)] {
        for _ in 0..load {
            fx.index
                .upsert(user, WorkflowId::new(), true)
                .await
                .expect("upsert");
        }
    }
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("Review", role)]).await;

    let wf = fx.start(template, requester).await;
    assert_eq!(wf.current_assignee(), Some(Assignee::User { user_id: b }));
}

#[tokio::test]
async fn conditional_stage_follows_submitted_amount() {
    let fx = Fixture::new();
    let role = RoleId::new();
    let clerk = fx.user("Clerk", &[role]).await;
    let chair = fx.user("Chair", &[]).await;
    let committee = fx.committee(&[], chair).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![amount_stage(committee, role)]).await;

    let mut large = NewWorkflow::new(template, requester, "Server rack");
    large.documents = amount_form(json!(15000));
    let wf = fx.engine.create_workflow(large).await.expect("create");
    assert_eq!(
        wf.current_assignee(),
        Some(Assignee::Committee {
            committee_id: committee
        })
    );

    let mut small = NewWorkflow::new(template, requester, "Keyboard");
    small.documents = amount_form(json!("500"));
    let wf = fx.engine.create_workflow(small).await.expect("create");
    assert_eq!(wf.current_assignee(), Some(Assignee::User { user_id: clerk }));
    assert_eq!(wf.documents.len(), 1);
}

#[tokio::test]
async fn unmatched_condition_leaves_stage_unassigned_by_default() {
    let fx = Fixture::new();
    let role = RoleId::new();
    let a = fx.user("A", &[role]).await;
    fx.user("B", &[]).await;
    let requester = fx.user("Requester", &[]).await;
    let committee = fx.committee(&[], requester).await;
    let template = fx
        .template(vec![single("Intake", role), amount_stage(committee, role)])
        .await;

    let wf = fx.start(template, requester).await;
    assert_eq!(wf.assigned_users[1].assignee, Assignee::Unassigned);

    fx.engine
        .transition(wf.id, a, Action::Forward)
        .await
        .expect("forward into unassigned stage");
    assert!(fx.active_users(wf.id).await.is_empty());
}

#[tokio::test]
async fn unmatched_condition_can_fail_creation() {
    let fx = Fixture::with_config(EngineConfig {
        unmatched_condition: UnmatchedConditionPolicy::Fail,
        ..EngineConfig::default()
    });
    let role = RoleId::new();
    fx.user("A", &[role]).await;
    let requester = fx.user("Requester", &[]).await;
    let committee = fx.committee(&[], requester).await;
    let template = fx.template(vec![amount_stage(committee, role)]).await;

    let result = fx
        .engine
        .create_workflow(NewWorkflow::new(template, requester, "No amount"))
        .await;
    assert_eq!(kind(result), ErrorKind::NoEligibleApprover);
    assert!(
        fx.engine
            .list_workflows(&WorkflowFilter::default())
            .await
            .expect("list")
            .is_empty()
    );
}

#[tokio::test]
async fn empty_role_aborts_creation_before_persisting() {
    let fx = Fixture::new();
    let (r1, empty) = (RoleId::new(), RoleId::new());
    let a = fx.user("A", &[r1]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("One", r1), single("Two", empty)]).await;

    let result = fx
        .engine
        .create_workflow(NewWorkflow::new(template, requester, "Doomed"))
        .await;
    assert_eq!(kind(result), ErrorKind::NoEligibleApprover);
    assert!(
        fx.engine
            .list_workflows(&WorkflowFilter::default())
            .await
            .expect("list")
            .is_empty()
    );
    assert!(fx.index.list_for_user(a).await.expect("list").is_empty());
    assert_eq!(fx.notified(a).await, 0);
}

#[tokio::test]
async fn missing_committee_aborts_creation() {
    let fx = Fixture::new();
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![board("Board", CommitteeId::new())]).await;
    let result = fx
        .engine
        .create_workflow(NewWorkflow::new(template, requester, "Orphan"))
        .await;
    assert_eq!(kind(result), ErrorKind::NoEligibleApprover);
}

#[tokio::test]
async fn missing_template_or_requester_is_not_found() {
    let fx = Fixture::new();
    let requester = fx.user("Requester", &[]).await;
    let result = fx
        .engine
        .create_workflow(NewWorkflow::new(TemplateId::new(), requester, "Lost"))
        .await;
    assert_eq!(kind(result), ErrorKind::NotFound);

    let role = RoleId::new();
    fx.user("A", &[role]).await;
    let template = fx.template(vec![single("One", role)]).await;
    let result = fx
        .engine
        .create_workflow(NewWorkflow::new(template, UserId::new(), "Stranger"))
        .await;
    assert_eq!(kind(result), ErrorKind::NotFound);
}

#[tokio::test]
async fn blank_title_is_rejected() {
    let fx = Fixture::new();
    let requester = fx.user("Requester", &[]).await;
    let result = fx
        .engine
        .create_workflow(NewWorkflow::new(TemplateId::new(), requester, "   "))
        .await;
    assert_eq!(kind(result), ErrorKind::Validation);
}

#[tokio::test]
async fn stale_version_is_a_conflict() {
    let fx = Fixture::new();
    let (r1, r2) = (RoleId::new(), RoleId::new());
    let a = fx.user("A", &[r1]).await;
    fx.user("B", &[r2]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("One", r1), single("Two", r2)]).await;
    let wf = fx.start(template, requester).await;

    fx.engine
        .transition(wf.id, a, Action::Forward)
        .await
        .expect("forward");

    let patch = WorkflowPatch {
        title: Some("Renamed".to_string()),
        ..WorkflowPatch::default()
    };
    let result = fx
        .engine
        .update_workflow(wf.id, patch, Some(wf.version))
        .await;
    assert_eq!(kind(result), ErrorKind::Conflict);

    let mut stale = wf.clone();
    stale.apply(Action::Approve).expect("apply locally");
    assert!(fx.workflows.update(&stale, wf.version).await.is_err());
    let stored = fx.engine.get_workflow(wf.id).await.expect("get");
    assert_eq!(stored.status, WorkflowStatus::Pending);
    assert_eq!(stored.current_stage_index, 1);
}

#[tokio::test]
async fn update_merges_patch() {
    let fx = Fixture::new();
    let role = RoleId::new();
    fx.user("A", &[role]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("One", role)]).await;
    let wf = fx.start(template, requester).await;

    let patch = WorkflowPatch {
        title: Some("Laptop, 16GB".to_string()),
        description: Some("for the new hire".to_string()),
        documents: Vec::new(),
    };
    let updated = fx
        .engine
        .update_workflow(wf.id, patch, Some(wf.version))
        .await
        .expect("update");
    assert_eq!(updated.title, "Laptop, 16GB");
    assert_eq!(updated.description.as_deref(), Some("for the new hire"));
    assert_eq!(updated.version, wf.version + 1);
    assert_eq!(updated.assigned_users, wf.assigned_users);

    let blank = WorkflowPatch {
        title: Some(" ".to_string()),
        ..WorkflowPatch::default()
    };
    assert_eq!(
        kind(fx.engine.update_workflow(wf.id, blank, None).await),
        ErrorKind::Validation
    );
}

#[tokio::test]
async fn failed_notifications_do_not_fail_transitions() {
    let fx = Fixture::new();
    let (r1, r2) = (RoleId::new(), RoleId::new());
    let a = fx.user("A", &[r1]).await;
    let b = fx.user("B", &[r2]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("One", r1), single("Two", r2)]).await;
    let wf = fx.start(template, requester).await;

    fx.notifications.set_unavailable(true);
    let moved = fx
        .engine
        .transition(wf.id, a, Action::Forward)
        .await
        .expect("forward despite notification failure");
    assert_eq!(moved.current_stage_index, 1);
    assert_eq!(fx.active_users(wf.id).await, vec![b]);
}

#[tokio::test]
async fn failed_index_writes_do_not_fail_transitions() {
    let fx = Fixture::new();
    let (r1, r2) = (RoleId::new(), RoleId::new());
    let a = fx.user("A", &[r1]).await;
    fx.user("B", &[r2]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("One", r1), single("Two", r2)]).await;
    let wf = fx.start(template, requester).await;

    fx.index.set_unavailable(true);
    fx.engine
        .transition(wf.id, a, Action::Forward)
        .await
        .expect("forward despite index failure");
    let stored = fx.engine.get_workflow(wf.id).await.expect("get");
    assert_eq!(stored.current_stage_index, 1);
}

#[tokio::test]
async fn unavailable_store_is_a_dependency_failure() {
    let fx = Fixture::new();
    fx.workflows.set_unavailable(true);
    assert_eq!(
        kind(fx.engine.get_workflow(WorkflowId::new()).await),
        ErrorKind::Dependency
    );
}

#[tokio::test]
async fn only_requester_can_cancel() {
    let fx = Fixture::new();
    let role = RoleId::new();
    let a = fx.user("A", &[role]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("One", role)]).await;
    let wf = fx.start(template, requester).await;

    assert_eq!(
        kind(fx.engine.transition(wf.id, a, Action::Cancel).await),
        ErrorKind::Validation
    );

    let cancelled = fx
        .engine
        .transition(wf.id, requester, Action::Cancel)
        .await
        .expect("cancel");
    assert_eq!(cancelled.status, WorkflowStatus::Cancelled);
    assert_eq!(fx.notified(a).await, 2);
    assert!(fx.active_users(wf.id).await.is_empty());
}

#[tokio::test]
async fn committee_votes_are_tallied_and_decided() {
    let fx = Fixture::new();
    let m1 = fx.user("M1", &[]).await;
    let m2 = fx.user("M2", &[]).await;
    let chair = fx.user("Chair", &[]).await;
    let outsider = fx.user("Outsider", &[]).await;
    let requester = fx.user("Requester", &[]).await;
    let committee = fx.committee(&[m1, m2], chair).await;
    let template = fx.template(vec![board("Board", committee)]).await;
    let wf = fx.start(template, requester).await;

    assert_eq!(
        kind(
            fx.engine
                .cast_vote(wf.id, outsider, Decision::Approve, None)
                .await
        ),
        ErrorKind::Validation
    );

    fx.engine
        .cast_vote(wf.id, m1, Decision::Reject, None)
        .await
        .expect("vote");
    fx.engine
        .cast_vote(wf.id, m1, Decision::Approve, Some("convinced".to_string()))
        .await
        .expect("re-vote");
    fx.engine
        .cast_vote(wf.id, m2, Decision::Approve, None)
        .await
        .expect("vote");
    fx.engine
        .cast_vote(wf.id, chair, Decision::Reject, None)
        .await
        .expect("vote");

    let tally = fx.engine.tally(wf.id).await.expect("tally");
    assert_eq!(tally.total(), 3);
    assert_eq!(tally.count(Decision::Approve), 2);
    assert_eq!(tally.leader(), Some(Decision::Approve));

    let decided = fx
        .engine
        .decide(wf.id, chair, Decision::Approve)
        .await
        .expect("decide");
    assert_eq!(decided.status, WorkflowStatus::Approved);

    assert_eq!(
        kind(
            fx.engine
                .cast_vote(wf.id, m2, Decision::Reject, None)
                .await
        ),
        ErrorKind::InvalidTransition
    );
}

#[tokio::test]
async fn returning_to_a_committee_stage_starts_a_fresh_vote() {
    let fx = Fixture::new();
    let role = RoleId::new();
    let clerk = fx.user("Clerk", &[role]).await;
    let m1 = fx.user("M1", &[]).await;
    let chair = fx.user("Chair", &[]).await;
    let requester = fx.user("Requester", &[]).await;
    let committee = fx.committee(&[m1], chair).await;
    let template = fx
        .template(vec![single("Intake", role), board("Board", committee)])
        .await;
    let wf = fx.start(template, requester).await;

    fx.engine
        .transition(wf.id, clerk, Action::Forward)
        .await
        .expect("forward");
    for voter in [m1, chair] {
        fx.engine
            .cast_vote(wf.id, voter, Decision::Revert, None)
            .await
            .expect("vote");
    }
    let tally = fx.engine.tally(wf.id).await.expect("tally");
    assert_eq!(tally.leader(), Some(Decision::Revert));
    fx.engine
        .decide(wf.id, chair, Decision::Revert)
        .await
        .expect("decide");

    fx.engine
        .transition(wf.id, clerk, Action::Forward)
        .await
        .expect("forward again");
    let tally = fx.engine.tally(wf.id).await.expect("tally");
    assert_eq!(tally.stage_index, 1);
    assert_eq!(tally.total(), 0);
    assert_eq!(tally.leader(), None);
}

#[tokio::test]
async fn votes_need_a_committee_stage() {
    let fx = Fixture::new();
    let role = RoleId::new();
    let a = fx.user("A", &[role]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("One", role)]).await;
    let wf = fx.start(template, requester).await;

    assert_eq!(
        kind(fx.engine.cast_vote(wf.id, a, Decision::Approve, None).await),
        ErrorKind::Validation
    );
}

#[tokio::test]
async fn user_workflows_filters_active() {
    let fx = Fixture::new();
    let (r1, r2) = (RoleId::new(), RoleId::new());
    let a = fx.user("A", &[r1]).await;
    let b = fx.user("B", &[r2]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("One", r1), single("Two", r2)]).await;
    let wf = fx.start(template, requester).await;

    let all = fx.engine.user_workflows(b, false).await.expect("list");
    assert_eq!(all.len(), 1);
    assert!(!all[0].is_active);
    assert!(fx.engine.user_workflows(b, true).await.expect("list").is_empty());

    fx.engine
        .transition(wf.id, a, Action::Forward)
        .await
        .expect("forward");
    let active = fx.engine.user_workflows(b, true).await.expect("list");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].workflow.id, wf.id);
}

#[tokio::test]
async fn delete_removes_workflow_and_index_entries() {
    let fx = Fixture::new();
    let role = RoleId::new();
    fx.user("A", &[role]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("One", role)]).await;
    let wf = fx.start(template, requester).await;

    fx.engine.delete_workflow(wf.id).await.expect("delete");
    assert!(fx.index.entries_for_workflow(wf.id).await.is_empty());
    assert_eq!(kind(fx.engine.get_workflow(wf.id).await), ErrorKind::NotFound);
    assert_eq!(kind(fx.engine.delete_workflow(wf.id).await), ErrorKind::NotFound);
}

#[tokio::test]
async fn stages_sharing_a_role_go_to_the_same_user() {
    let fx = Fixture::new();
    let role = RoleId::new();
    let a = fx.user("A", &[role]).await;
    fx.user("B", &[role]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx
        .template(vec![single("Check", role), single("Recheck", role)])
        .await;

    let wf = fx.start(template, requester).await;
    let assignees: Vec<Assignee> = wf.assigned_users.iter().map(|s| s.assignee).collect();
    assert_eq!(
        assignees,
        vec![Assignee::User { user_id: a }, Assignee::User { user_id: a }]
    );
}

#[tokio::test]
async fn failed_insert_discards_generated_documents() {
    let fx = Fixture::new();
    let role = RoleId::new();
    fx.user("A", &[role]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("One", role)]).await;
    fx.workflows.set_unavailable(true);

    let mut request = NewWorkflow::new(template, requester, "Laptop");
    request.documents = amount_form(json!(500));
    assert_eq!(
        kind(fx.engine.create_workflow(request).await),
        ErrorKind::Dependency
    );
    assert!(fx.documents.is_empty().await);
}

#[tokio::test]
async fn delete_discards_documents() {
    let fx = Fixture::new();
    let role = RoleId::new();
    fx.user("A", &[role]).await;
    let requester = fx.user("Requester", &[]).await;
    let template = fx.template(vec![single("One", role)]).await;
    let mut request = NewWorkflow::new(template, requester, "Laptop");
    request.documents = amount_form(json!(500));
    let wf = fx.engine.create_workflow(request).await.expect("create");
    assert_eq!(fx.documents.stored_for(wf.id).await, wf.documents);
    assert_eq!(wf.documents.len(), 1);

    fx.engine.delete_workflow(wf.id).await.expect("delete");
    assert!(fx.documents.stored_for(wf.id).await.is_empty());
}

#[tokio::test]
async fn template_lifecycle() {
    let fx = Fixture::new();
    let role = RoleId::new();
    let draft: TemplateDraft = serde_json::from_value(json!({
        "name": "Travel",
        "stages": [{
            "stageTitle": "Manager",
            "approverType": "SinglePerson",
            "approverSpec": { "roleId": role.to_string() }
        }]
    }))
    .expect("draft");
    let template = fx.engine.create_template(draft).await.expect("create");
    assert_eq!(
        fx.engine.get_template(template.id).await.expect("get"),
        template
    );
    assert_eq!(fx.engine.list_templates().await.expect("list").len(), 1);

    let invalid = TemplateDraft {
        name: "Empty".to_string(),
        description: None,
        stages: Vec::new(),
    };
    assert_eq!(
        kind(fx.engine.create_template(invalid).await),
        ErrorKind::Validation
    );

    fx.engine
        .delete_template(template.id)
        .await
        .expect("delete");
    assert_eq!(
        kind(fx.engine.get_template(template.id).await),
        ErrorKind::NotFound
    );
}
