use super::path_id;
use crate::error::ApiError;
use crate::identity::CurrentUser;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use docflow_core::NotificationId;
use docflow_workflow::{EngineError, Entity, Notification};

pub(super) async fn my_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(state.inbox.list_for_user(user).await?))
}

/// Marks one of the caller's notifications as read. Another user's
/// notification is reported as missing.
pub(super) async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: NotificationId = path_id(&id)?;
    if !state.inbox.mark_read(user, id).await? {
        return Err(EngineError::not_found(Entity::Notification, id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
