//! Profile endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use super::{ApiError, AppState, CurrentUser, ValidatedJson};
use crate::domain::aggregates::{Profile, ProfileUpdate};
use crate::StorefrontError;

#[derive(Debug, Serialize)]
pub struct ProfileUpdated { pub message: &'static str, pub user: Profile }

/// Only the signed-in user's own row is ever written.
pub async fn update_profile(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ValidatedJson(update): ValidatedJson<ProfileUpdate>,
) -> Result<Json<ProfileUpdated>, ApiError> {
    let user = s.profiles.update_profile(user_id, update).await?.ok_or(StorefrontError::Unauthorized)?;
    tracing::info!(user_id, "profile updated");
    Ok(Json(ProfileUpdated { message: "profile updated", user }))
}
