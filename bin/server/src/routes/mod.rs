//! HTTP routes.
//!
//! JSON in, JSON out. Every route except `/health` requires the caller's
//! identity (see [`crate::identity`]).

mod directory;
mod notifications;
mod templates;
mod workflows;


use crate::error::ApiError;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use docflow_core::ParseIdError;
use std::str::FromStr;
use tower_http::trace::TraceLayer;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/templates",
            post(templates::create_template).get(templates::list_templates),
        )
        .route(
            "/templates/{id}",
            get(templates::get_template).delete(templates::delete_template),
        )
        .route(
            "/users",
            post(directory::create_user).get(directory::list_users),
        )
        .route("/users/{id}", get(directory::get_user))
        .route("/users/{id}/workflows", get(workflows::user_workflows))
        .route("/committees", post(directory::create_committee))
        .route("/committees/{id}", get(directory::get_committee))
        .route(
            "/workflows",
            post(workflows::create_workflow).get(workflows::list_workflows),
        )
        .route(
            "/workflows/{id}",
            get(workflows::get_workflow)
                .patch(workflows::update_workflow)
                .delete(workflows::delete_workflow),
        )
        .route("/workflows/{id}/forward", post(workflows::forward))
        .route("/workflows/{id}/revert", post(workflows::revert))
        .route("/workflows/{id}/approve", post(workflows::approve))
        .route("/workflows/{id}/reject", post(workflows::reject))
        .route("/workflows/{id}/cancel", post(workflows::cancel))
        .route(
            "/workflows/{id}/votes",
            post(workflows::cast_vote).get(workflows::tally),
        )
        .route("/workflows/{id}/decision", post(workflows::decide))
        .route("/me/workflows", get(workflows::my_workflows))
        .route("/me/notifications", get(notifications::my_notifications))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Parses an ID taken from the request path.
fn path_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = ParseIdError>,
{
    T::from_str(raw).map_err(|e| ApiError::bad_request(e.to_string()))
}
