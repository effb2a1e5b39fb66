// handlers/shorts.rs - shorts feed and view tracking

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::policy::Viewer;
use crate::services::activity_service::{Ack, ShortViewInput};
use crate::services::catalog_service::ShortsPage;
use crate::services::{ActivityService, CatalogService};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ShortsQuery {
    pub cursor: Option<String>,
    pub take: Option<String>,
}

/// GET /api/shorts?cursor&take
pub async fn feed(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Query(query): Query<ShortsQuery>,
) -> ApiResult<ShortsPage> {
    let take = query.take.as_deref().and_then(|t| t.trim().parse().ok());
    let page = CatalogService::new(state.store.as_ref())
        .shorts(&viewer, query.cursor.as_deref(), take)
        .await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/shorts/:slug/view
pub async fn view(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(slug): Path<String>,
    body: Bytes,
) -> ApiResult<Ack> {
    // An empty body is a plain view with nothing watched yet
    let input: ShortViewInput = if body.iter().all(u8::is_ascii_whitespace) {
        ShortViewInput::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::validation_error(format!("Invalid request body: {}", e)))?
    };
    let ack = ActivityService::new(state.store.as_ref())
        .record_short_view(&viewer, &slug, &input)
        .await?;
    Ok(ApiResponse::success(ack))
}
