// handlers/children.rs - child profiles, active child selection, parental controls

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::database::models::ChildProfile;
use crate::error::ApiError;
use crate::middleware::{active_child_cookie, json_body, ApiResponse, ApiResult};
use crate::policy::Viewer;
use crate::services::child_service::{ChildItem, ControlsInput, ControlsView, NewChild};
use crate::services::ChildService;
use crate::state::AppState;

/// GET /api/children
pub async fn list(State(state): State<Arc<AppState>>, viewer: Viewer) -> ApiResult<Vec<ChildItem>> {
    let children = ChildService::new(state.store.as_ref()).list(&viewer).await?;
    Ok(ApiResponse::success(children))
}

/// POST /api/children
pub async fn create(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ChildProfile> {
    if viewer.user_id.is_none() {
        return Err(ApiError::unauthorized("Authentication required"));
    }
    let input: NewChild = json_body(payload)?;
    let child = ChildService::new(state.store.as_ref()).create(&viewer, &input).await?;
    Ok(ApiResponse::created(child))
}

/// POST /api/children/:childId/switch
///
/// Remembers the selection in the active-child cookie; later requests resolve
/// their policy from it.
pub async fn switch(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(child_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let child = ChildService::new(state.store.as_ref()).switch(&viewer, &child_id).await?;
    let cookie = active_child_cookie(&child.id)?;
    Ok(([(header::SET_COOKIE, cookie)], ApiResponse::success(child)))
}

/// POST /api/parent/controls
pub async fn update_controls(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ControlsView> {
    if viewer.user_id.is_none() {
        return Err(ApiError::unauthorized("Authentication required"));
    }
    let input: ControlsInput = json_body(payload)?;
    let view = ChildService::new(state.store.as_ref()).update_controls(&viewer, &input).await?;
    Ok(ApiResponse::success(view))
}
