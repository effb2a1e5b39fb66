use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::manager::DatabaseError;
use crate::database::models::{
    CategoryCount, ChildProfile, Favorite, ParentalControls, QuizAnswer, QuizAttempt, QuizDefinition, Session,
    ShortViewUpdate, User, Video, WatchHistory,
};
use crate::database::video_query::VideoQuery;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_session(&self, token: &str) -> Result<Option<Session>, DatabaseError>;
    async fn delete_session(&self, session_id: &str) -> Result<(), DatabaseError>;
    async fn find_user(&self, user_id: &str) -> Result<Option<User>, DatabaseError>;
    async fn update_user_language(&self, user_id: &str, language: &str) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait ChildProfileStore: Send + Sync {
    /// The child only if it belongs to `user_id`
    async fn find_owned_child(&self, user_id: &str, child_id: &str) -> Result<Option<ChildProfile>, DatabaseError>;

    /// Earliest created child, ties broken by id
    async fn first_child(&self, user_id: &str) -> Result<Option<ChildProfile>, DatabaseError>;

    /// All children of the user, oldest first
    async fn list_children(&self, user_id: &str) -> Result<Vec<ChildProfile>, DatabaseError>;

    async fn count_children(&self, user_id: &str) -> Result<i64, DatabaseError>;

    async fn insert_child(&self, child: ChildProfile) -> Result<ChildProfile, DatabaseError>;

    async fn update_controls(
        &self,
        child_id: &str,
        controls: &ParentalControls,
        now: DateTime<Utc>,
    ) -> Result<ChildProfile, DatabaseError>;
}

/// Reads over `videos`. Every method takes a [`VideoQuery`], which always
/// carries the caller's policy clauses.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn find_videos(&self, query: &VideoQuery) -> Result<Vec<Video>, DatabaseError>;
    async fn find_video(&self, query: &VideoQuery) -> Result<Option<Video>, DatabaseError>;
    async fn count_by_category(&self, query: &VideoQuery) -> Result<Vec<CategoryCount>, DatabaseError>;
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Subset of `video_ids` the child has favorited
    async fn favorite_video_ids(
        &self,
        user_id: &str,
        child_id: &str,
        video_ids: &[String],
    ) -> Result<Vec<String>, DatabaseError>;

    /// Newest first
    async fn list_favorites(&self, user_id: &str, child_id: &str) -> Result<Vec<Favorite>, DatabaseError>;

    async fn find_favorite(
        &self,
        user_id: &str,
        child_id: &str,
        video_id: &str,
    ) -> Result<Option<Favorite>, DatabaseError>;

    async fn insert_favorite(&self, favorite: Favorite) -> Result<(), DatabaseError>;

    async fn delete_favorite(&self, favorite_id: &str) -> Result<(), DatabaseError>;

    /// Insert or bump `watched_at`
    async fn touch_watch_history(
        &self,
        user_id: &str,
        child_id: &str,
        video_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError>;

    /// Newest first
    /// Newest `limit` entries
    async fn list_watch_history(
        &self,
        user_id: &str,
        child_id: &str,
        limit: i32,
    ) -> Result<Vec<WatchHistory>, DatabaseError>;

    async fn record_short_view(&self, update: &ShortViewUpdate) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn quiz_for_video(&self, video_id: &str) -> Result<Option<QuizDefinition>, DatabaseError>;

    /// Persist the attempt and its answers together
    async fn insert_attempt(&self, attempt: QuizAttempt, answers: &[QuizAnswer]) -> Result<QuizAttempt, DatabaseError>;
}

/// Everything the HTTP layer needs from persistence
#[async_trait]
pub trait Store: SessionStore + ChildProfileStore + VideoStore + ActivityStore + QuizStore {
    async fn ping(&self) -> Result<(), DatabaseError>;
}
