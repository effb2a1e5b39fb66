// handlers/favorites.rs - favorites and watch history of the active child

use axum::extract::{Path, State};
use std::sync::Arc;

use crate::middleware::{ApiResponse, ApiResult};
use crate::policy::Viewer;
use crate::services::activity_service::{FavoriteItem, FavoriteState, HistoryItem};
use crate::services::ActivityService;
use crate::state::AppState;

/// GET /api/favorites
pub async fn list(State(state): State<Arc<AppState>>, viewer: Viewer) -> ApiResult<Vec<FavoriteItem>> {
    let items = ActivityService::new(state.store.as_ref()).favorites(&viewer).await?;
    Ok(ApiResponse::success(items))
}

/// POST /api/favorites/:videoId/toggle
pub async fn toggle(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(video_id): Path<String>,
) -> ApiResult<FavoriteState> {
    let result = ActivityService::new(state.store.as_ref())
        .toggle_favorite(&viewer, &video_id)
        .await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/history
pub async fn history(State(state): State<Arc<AppState>>, viewer: Viewer) -> ApiResult<Vec<HistoryItem>> {
    let items = ActivityService::new(state.store.as_ref()).history(&viewer).await?;
    Ok(ApiResponse::success(items))
}
