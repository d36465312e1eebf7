//! Caller identity.
//!
//! Authentication happens upstream; the proxy in front of the server puts
//! the authenticated user's ID in the `x-user-id` header.

use crate::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use docflow_core::UserId;

/// Header carrying the caller's user ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor for the calling user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("missing x-user-id header"))?
            .to_str()
            .map_err(|_| ApiError::unauthorized("x-user-id header is not valid text"))?;

        let user_id = raw
            .trim()
            .parse::<UserId>()
            .map_err(|e| ApiError::unauthorized(e.to_string()))?;
        Ok(CurrentUser(user_id))
    }
}
