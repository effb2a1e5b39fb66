// handlers/videos.rs - catalog endpoints under /api/videos

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use std::sync::Arc;

use crate::database::models::CategoryCount;
use crate::middleware::{ApiResponse, ApiResult};
use crate::policy::Viewer;
use crate::services::activity_service::Ack;
use crate::services::catalog_service::{VideoItem, VideoListParams};
use crate::services::{ActivityService, CatalogService};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    pub limit: Option<String>,
    pub q: Option<String>,
    pub category: Option<String>,
    pub age_group: Option<String>,
}

impl From<VideoListQuery> for VideoListParams {
    fn from(query: VideoListQuery) -> Self {
        Self {
            // Unparseable limits fall back to the default
            limit: query.limit.as_deref().and_then(|l| l.trim().parse().ok()),
            q: query.q,
            category: query.category,
            age_group: query.age_group,
        }
    }
}

/// GET /api/videos
pub async fn list(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Query(query): Query<VideoListQuery>,
) -> ApiResult<Vec<VideoItem>> {
    let params = VideoListParams::from(query);
    let items = CatalogService::new(state.store.as_ref()).list_videos(&viewer, &params).await?;
    Ok(ApiResponse::success(items))
}

/// GET /api/videos/categories
pub async fn categories(State(state): State<Arc<AppState>>, viewer: Viewer) -> ApiResult<Vec<CategoryCount>> {
    let counts = CatalogService::new(state.store.as_ref()).categories(&viewer).await?;
    Ok(ApiResponse::success(counts))
}

/// GET /api/videos/:slug
pub async fn show(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(slug): Path<String>,
) -> ApiResult<VideoItem> {
    let item = CatalogService::new(state.store.as_ref()).video_by_slug(&viewer, &slug).await?;
    Ok(ApiResponse::success(item))
}

/// GET /api/videos/:slug/similar
pub async fn similar(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(slug): Path<String>,
) -> ApiResult<Vec<VideoItem>> {
    let items = CatalogService::new(state.store.as_ref()).similar(&viewer, &slug).await?;
    Ok(ApiResponse::success(items))
}

/// POST /api/videos/:slug/watch
pub async fn watch(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(slug): Path<String>,
) -> ApiResult<Ack> {
    let ack = ActivityService::new(state.store.as_ref()).record_watch(&viewer, &slug).await?;
    Ok(ApiResponse::success(ack))
}
