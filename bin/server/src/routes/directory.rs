//! User and committee registration.

use super::path_id;
use crate::error::ApiError;
use crate::identity::CurrentUser;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use docflow_core::{RoleId, UserId};
use docflow_directory::{Committee, RoleSet, User};
use docflow_workflow::{EngineError, Entity};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NewUserBody {
    display_name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    roles: Vec<RoleId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UsersQuery {
    role_id: Option<RoleId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NewCommitteeBody {
    name: String,
    #[serde(default)]
    members: Vec<UserId>,
    chairperson: UserId,
}

pub(super) async fn create_user(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Json(body): Json<NewUserBody>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if body.display_name.trim().is_empty() {
        return Err(ApiError::bad_request("display name must not be blank"));
    }
    let mut user = User::new(body.display_name.trim());
    user.set_email(body.email);
    user.set_roles(RoleSet::from_roles(body.roles));
    state.directory_admin.save_user(&user).await?;
    info!(user_id = %user.id(), "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub(super) async fn list_users(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let role = query
        .role_id
        .ok_or_else(|| ApiError::bad_request("roleId query parameter is required"))?;
    Ok(Json(state.directory.find_users_by_role(role).await?))
}

pub(super) async fn get_user(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id: UserId = path_id(&id)?;
    let user = state
        .directory
        .find_user(id)
        .await?
        .ok_or_else(|| EngineError::not_found(Entity::User, id))?;
    Ok(Json(user))
}

pub(super) async fn create_committee(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Json(body): Json<NewCommitteeBody>,
) -> Result<(StatusCode, Json<Committee>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("committee name must not be blank"));
    }
    for user_id in body.members.iter().chain(std::iter::once(&body.chairperson)) {
        if state.directory.find_user(*user_id).await?.is_none() {
            return Err(ApiError::bad_request(format!("unknown user {user_id}")));
        }
    }

    let committee = Committee::new(body.name.trim(), body.members, body.chairperson);
    state.directory_admin.save_committee(&committee).await?;
    info!(committee_id = %committee.id, "committee registered");
    Ok((StatusCode::CREATED, Json(committee)))
}

pub(super) async fn get_committee(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Committee>, ApiError> {
    let id = path_id(&id)?;
    let committee = state
        .directory
        .find_committee(id)
        .await?
        .ok_or_else(|| EngineError::not_found(Entity::Committee, id))?;
    Ok(Json(committee))
}
