// handlers/quiz.rs - quizzes attached to videos

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::{json_body, ApiResponse, ApiResult};
use crate::policy::Viewer;
use crate::services::quiz_service::{AttemptView, QuizSubmission, QuizView};
use crate::services::QuizService;
use crate::state::AppState;

/// GET /api/videos/:slug/quiz
pub async fn show(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(slug): Path<String>,
) -> ApiResult<QuizView> {
    let quiz = QuizService::new(state.store.as_ref()).quiz(&viewer, &slug).await?;
    Ok(ApiResponse::success(quiz))
}

/// POST /api/videos/:slug/quiz/submit
pub async fn submit(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(slug): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<AttemptView> {
    if viewer.user_id.is_none() {
        return Err(ApiError::unauthorized("Authentication required"));
    }
    let submission: QuizSubmission = json_body(payload)?;
    let attempt = QuizService::new(state.store.as_ref())
        .submit(&viewer, &slug, &submission)
        .await?;
    Ok(ApiResponse::success(attempt))
}
