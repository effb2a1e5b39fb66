// handlers/profile.rs - account preferences

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::{json_body, locale_cookie, ApiResponse};
use crate::policy::Viewer;
use crate::services::profile_service::LanguageInput;
use crate::services::ProfileService;
use crate::state::AppState;

/// POST /api/profile/language
pub async fn set_language(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input: LanguageInput = json_body(payload)?;
    let choice = ProfileService::new(state.store.as_ref()).set_language(&viewer, &input).await?;
    let cookie = locale_cookie(choice.locale.as_str())?;
    Ok(([(header::SET_COOKIE, cookie)], ApiResponse::success(choice)))
}
