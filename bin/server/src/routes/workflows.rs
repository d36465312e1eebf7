//! Workflow lifecycle, stage moves and votes.

use super::path_id;
use crate::error::ApiError;
use crate::identity::CurrentUser;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use docflow_core::{TemplateId, UserId};
use docflow_workflow::{
    Action, AssignedWorkflow, Decision, NewWorkflow, SubmittedDocument, Tally, Workflow,
    WorkflowFilter, WorkflowPatch,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NewWorkflowBody {
    template_id: TemplateId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    documents: Vec<SubmittedDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PatchBody {
    #[serde(flatten)]
    patch: WorkflowPatch,
    /// Version the caller last read.
    #[serde(default)]
    version: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct VoteBody {
    decision: Decision,
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DecisionBody {
    decision: Decision,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct IndexQuery {
    #[serde(default)]
    active_only: bool,
}

pub(super) async fn create_workflow(
    State(state): State<AppState>,
    CurrentUser(requester): CurrentUser,
    Json(body): Json<NewWorkflowBody>,
) -> Result<(StatusCode, Json<Workflow>), ApiError> {
    let mut request = NewWorkflow::new(body.template_id, requester, body.title);
    request.description = body.description;
    request.documents = body.documents;
    let workflow = state.engine.create_workflow(request).await?;
    Ok((StatusCode::CREATED, Json(workflow)))
}

pub(super) async fn list_workflows(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Query(filter): Query<WorkflowFilter>,
) -> Result<Json<Vec<Workflow>>, ApiError> {
    Ok(Json(state.engine.list_workflows(&filter).await?))
}

pub(super) async fn get_workflow(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Workflow>, ApiError> {
    Ok(Json(state.engine.get_workflow(path_id(&id)?).await?))
}

pub(super) async fn update_workflow(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<PatchBody>,
) -> Result<Json<Workflow>, ApiError> {
    let workflow = state
        .engine
        .update_workflow(path_id(&id)?, body.patch, body.version)
        .await?;
    Ok(Json(workflow))
}

pub(super) async fn delete_workflow(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_workflow(path_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn move_stage(
    state: &AppState,
    actor: UserId,
    raw_id: &str,
    action: Action,
) -> Result<Json<Workflow>, ApiError> {
    let workflow = state
        .engine
        .transition(path_id(raw_id)?, actor, action)
        .await?;
    Ok(Json(workflow))
}

pub(super) async fn forward(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Workflow>, ApiError> {
    move_stage(&state, actor, &id, Action::Forward).await
}

pub(super) async fn revert(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Workflow>, ApiError> {
    move_stage(&state, actor, &id, Action::Revert).await
}

pub(super) async fn approve(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Workflow>, ApiError> {
    move_stage(&state, actor, &id, Action::Approve).await
}

pub(super) async fn reject(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Workflow>, ApiError> {
    move_stage(&state, actor, &id, Action::Reject).await
}

pub(super) async fn cancel(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Workflow>, ApiError> {
    move_stage(&state, actor, &id, Action::Cancel).await
}

pub(super) async fn cast_vote(
    State(state): State<AppState>,
    CurrentUser(voter): CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<VoteBody>,
) -> Result<Json<Workflow>, ApiError> {
    let workflow = state
        .engine
        .cast_vote(path_id(&id)?, voter, body.decision, body.comment)
        .await?;
    Ok(Json(workflow))
}

pub(super) async fn tally(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Tally>, ApiError> {
    Ok(Json(state.engine.tally(path_id(&id)?).await?))
}

pub(super) async fn decide(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<DecisionBody>,
) -> Result<Json<Workflow>, ApiError> {
    let workflow = state
        .engine
        .decide(path_id(&id)?, actor, body.decision)
        .await?;
    Ok(Json(workflow))
}

pub(super) async fn my_workflows(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<IndexQuery>,
) -> Result<Json<Vec<AssignedWorkflow>>, ApiError> {
    Ok(Json(
        state.engine.user_workflows(user, query.active_only).await?,
    ))
}

pub(super) async fn user_workflows(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<IndexQuery>,
) -> Result<Json<Vec<AssignedWorkflow>>, ApiError> {
    Ok(Json(
        state
            .engine
            .user_workflows(path_id(&id)?, query.active_only)
            .await?,
    ))
}
