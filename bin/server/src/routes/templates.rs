use super::path_id;
use crate::error::ApiError;
use crate::identity::CurrentUser;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use docflow_workflow::{TemplateDraft, WorkflowTemplate};

pub(super) async fn create_template(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Json(draft): Json<TemplateDraft>,
) -> Result<(StatusCode, Json<WorkflowTemplate>), ApiError> {
    let template = state.engine.create_template(draft).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub(super) async fn list_templates(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
) -> Result<Json<Vec<WorkflowTemplate>>, ApiError> {
    Ok(Json(state.engine.list_templates().await?))
}

pub(super) async fn get_template(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<WorkflowTemplate>, ApiError> {
    Ok(Json(state.engine.get_template(path_id(&id)?).await?))
}

pub(super) async fn delete_template(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_template(path_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
