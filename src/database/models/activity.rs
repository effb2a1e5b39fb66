use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Unique per (user, child, video)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    pub id: String,
    pub user_id: String,
    pub child_id: String,
    pub video_id: String,
    pub created_at: DateTime<Utc>,
}

/// Unique per (user, child, video); `watched_at` is bumped on every watch
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WatchHistory {
    pub id: String,
    pub user_id: String,
    pub child_id: String,
    pub video_id: String,
    pub watched_at: DateTime<Utc>,
}

/// Increment applied to `short_views`
#[derive(Debug, Clone)]
pub struct ShortViewUpdate {
    pub user_id: String,
    pub child_id: String,
    pub video_id: String,
    pub watched_ms: i64,
    pub completed: bool,
    pub viewed_at: DateTime<Utc>,
}
