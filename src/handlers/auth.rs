// handlers/auth.rs - GET /api/auth/me

use axum::extract::State;
use std::sync::Arc;

use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::policy::Viewer;
use crate::state::AppState;

/// Current signed-in user
pub async fn me(State(state): State<Arc<AppState>>, viewer: Viewer) -> ApiResult<User> {
    let user_id = viewer
        .user_id
        .as_deref()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    // A session can outlive its user row
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
    Ok(ApiResponse::success(user))
}
