use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    state::AppState,
    users::{
        dto::UpdateProfileRequest,
        repo_types::{ProfilePatch, User},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/user/:id", get(get_user).put(update_user))
}

fn ensure_self(caller: Uuid, target: Uuid) -> Result<(), ApiError> {
    if caller != target {
        warn!(%caller, %target, "profile access to another user");
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    ensure_self(user_id, id)?;
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    ensure_self(user_id, id)?;
    let patch = ProfilePatch::from(payload);
    let user = User::update_profile(&state.db, id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    info!(user_id = %user.id, goal = ?user.goal, "profile updated");
    Ok(Json(user))
}
