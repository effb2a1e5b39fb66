//! In-memory store and fixtures for unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    CategoryCount, ChildProfile, Favorite, ParentalControls, QuizAnswer, QuizAttempt, QuizDefinition, Session,
    ShortViewUpdate, User, Video, WatchHistory,
};
use crate::database::store::{ActivityStore, ChildProfileStore, QuizStore, SessionStore, Store, VideoStore};
use crate::database::{DatabaseError, VideoQuery};

pub fn child_fixture(id: &str, user_id: &str, age_groups: &[&str], educational_only: bool) -> ChildProfile {
    let now = Utc::now();
    ChildProfile {
        id: id.to_string(),
        user_id: user_id.to_string(),
        name: format!("Child {}", id),
        age: 7,
        avatar_color: "#FFB347".to_string(),
        interests: vec!["science".to_string()],
        allowed_age_groups: age_groups.iter().map(|g| g.to_string()).collect(),
        educational_only,
        daily_limit_minutes: 60,
        created_at: now,
        updated_at: now,
    }
}

/// A published LONG video with id `vid_<slug>`
pub fn video_fixture(slug: &str, category: &str, age_group: &str) -> Video {
    Video {
        id: format!("vid_{}", slug),
        slug: slug.to_string(),
        title: format!("Video {}", slug),
        description: String::new(),
        category: category.to_string(),
        age_group: age_group.to_string(),
        thumbnail_url: format!("https://cdn.example.test/{}.jpg", slug),
        video_url: format!("https://cdn.example.test/{}.mp4", slug),
        content_type: "LONG".to_string(),
        duration_sec: 300,
        views_count: 0,
        is_published: true,
        created_at: Utc::now(),
    }
}

#[derive(Default)]
struct State {
    users: BTreeMap<String, User>,
    sessions: BTreeMap<String, Session>,
    children: BTreeMap<String, ChildProfile>,
    videos: BTreeMap<String, Video>,
    favorites: Vec<Favorite>,
    history: Vec<WatchHistory>,
    short_views: Vec<ShortViewUpdate>,
    quizzes: BTreeMap<String, QuizDefinition>,
    attempts: Vec<(QuizAttempt, Vec<QuizAnswer>)>,
}

/// Store backed by process memory. `set_unavailable(true)` makes every call
/// fail the way an unreachable database does.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), DatabaseError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DatabaseError::ConnectionError("memory store is offline".to_string()));
        }
        Ok(())
    }

    pub async fn add_user(&self, id: &str) -> User {
        let user = User {
            id: id.to_string(),
            email: Some(format!("{}@example.test", id)),
            phone: None,
            account_type: "PARENT".to_string(),
            language: "ru".to_string(),
            created_at: Utc::now(),
        };
        self.state.write().await.users.insert(user.id.clone(), user.clone());
        user
    }

    pub async fn add_session(&self, token: &str, user_id: &str, expires_at: DateTime<Utc>) -> Session {
        let session = Session {
            id: format!("sess_{}", token),
            token: token.to_string(),
            user_id: user_id.to_string(),
            expires_at,
        };
        self.state.write().await.sessions.insert(session.id.clone(), session.clone());
        session
    }

    /// Child created `offset` away from now
    pub async fn add_child_at(
        &self,
        id: &str,
        user_id: &str,
        age_groups: &[&str],
        educational_only: bool,
        offset: Duration,
    ) -> ChildProfile {
        let mut child = child_fixture(id, user_id, age_groups, educational_only);
        child.created_at = Utc::now() + offset;
        child.updated_at = child.created_at;
        self.state.write().await.children.insert(child.id.clone(), child.clone());
        child
    }

    pub async fn add_video(&self, video: Video) -> Video {
        self.state.write().await.videos.insert(video.id.clone(), video.clone());
        video
    }

    pub async fn add_quiz(&self, quiz: QuizDefinition) {
        self.state.write().await.quizzes.insert(quiz.quiz.video_id.clone(), quiz);
    }

    pub async fn session_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    pub async fn short_views(&self) -> Vec<ShortViewUpdate> {
        self.state.read().await.short_views.clone()
    }

    pub async fn attempts(&self) -> Vec<(QuizAttempt, Vec<QuizAnswer>)> {
        self.state.read().await.attempts.clone()
    }

    fn matching_videos(state: &State, query: &VideoQuery) -> Vec<Video> {
        let order = query.sort_order();
        let mut videos: Vec<Video> = state.videos.values().filter(|v| query.matches(v)).cloned().collect();
        videos.sort_by(|a, b| order.compare(a, b));

        if let Some(cursor) = query.cursor() {
            videos = match state.videos.get(cursor) {
                Some(anchor) => videos
                    .into_iter()
                    .filter(|v| order.compare(anchor, v) == std::cmp::Ordering::Less)
                    .collect(),
                None => vec![],
            };
        }
        if let Some(limit) = query.limit_value() {
            videos.truncate(limit.max(0) as usize);
        }
        videos
    }

    fn children_of(state: &State, user_id: &str) -> Vec<ChildProfile> {
        let mut children: Vec<ChildProfile> =
            state.children.values().filter(|c| c.user_id == user_id).cloned().collect();
        children.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        children
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_session(&self, token: &str) -> Result<Option<Session>, DatabaseError> {
        self.check()?;
        Ok(self.state.read().await.sessions.values().find(|s| s.token == token).cloned())
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), DatabaseError> {
        self.check()?;
        self.state.write().await.sessions.remove(session_id);
        Ok(())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, DatabaseError> {
        self.check()?;
        Ok(self.state.read().await.users.get(user_id).cloned())
    }

    async fn update_user_language(&self, user_id: &str, language: &str) -> Result<(), DatabaseError> {
        self.check()?;
        if let Some(user) = self.state.write().await.users.get_mut(user_id) {
            user.language = language.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl ChildProfileStore for MemoryStore {
    async fn find_owned_child(&self, user_id: &str, child_id: &str) -> Result<Option<ChildProfile>, DatabaseError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.children.get(child_id).filter(|c| c.user_id == user_id).cloned())
    }

    async fn first_child(&self, user_id: &str) -> Result<Option<ChildProfile>, DatabaseError> {
        self.check()?;
        Ok(Self::children_of(&*self.state.read().await, user_id).into_iter().next())
    }

    async fn list_children(&self, user_id: &str) -> Result<Vec<ChildProfile>, DatabaseError> {
        self.check()?;
        Ok(Self::children_of(&*self.state.read().await, user_id))
    }

    async fn count_children(&self, user_id: &str) -> Result<i64, DatabaseError> {
        self.check()?;
        Ok(Self::children_of(&*self.state.read().await, user_id).len() as i64)
    }

    async fn insert_child(&self, child: ChildProfile) -> Result<ChildProfile, DatabaseError> {
        self.check()?;
        self.state.write().await.children.insert(child.id.clone(), child.clone());
        Ok(child)
    }

    async fn update_controls(
        &self,
        child_id: &str,
        controls: &ParentalControls,
        now: DateTime<Utc>,
    ) -> Result<ChildProfile, DatabaseError> {
        self.check()?;
        let mut state = self.state.write().await;
        let child = state
            .children
            .get_mut(child_id)
            .ok_or_else(|| DatabaseError::Sqlx(sqlx::Error::RowNotFound))?;
        child.daily_limit_minutes = controls.daily_limit_minutes;
        child.educational_only = controls.educational_only;
        child.allowed_age_groups = controls.allowed_age_groups.clone();
        child.updated_at = now;
        Ok(child.clone())
    }
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn find_videos(&self, query: &VideoQuery) -> Result<Vec<Video>, DatabaseError> {
        self.check()?;
        Ok(Self::matching_videos(&*self.state.read().await, query))
    }

    async fn find_video(&self, query: &VideoQuery) -> Result<Option<Video>, DatabaseError> {
        self.check()?;
        Ok(Self::matching_videos(&*self.state.read().await, query).into_iter().next())
    }

    async fn count_by_category(&self, query: &VideoQuery) -> Result<Vec<CategoryCount>, DatabaseError> {
        self.check()?;
        let state = self.state.read().await;
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for video in state.videos.values().filter(|v| query.matches(v)) {
            *counts.entry(video.category.clone()).or_default() += 1;
        }
        Ok(counts.into_iter().map(|(name, count)| CategoryCount { name, count }).collect())
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn favorite_video_ids(
        &self,
        user_id: &str,
        child_id: &str,
        video_ids: &[String],
    ) -> Result<Vec<String>, DatabaseError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id && f.child_id == child_id && video_ids.contains(&f.video_id))
            .map(|f| f.video_id.clone())
            .collect())
    }

    async fn list_favorites(&self, user_id: &str, child_id: &str) -> Result<Vec<Favorite>, DatabaseError> {
        self.check()?;
        let state = self.state.read().await;
        let mut favorites: Vec<Favorite> = state
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id && f.child_id == child_id)
            .cloned()
            .collect();
        favorites.sort_by(|a, b| (b.created_at, &b.id).cmp(&(a.created_at, &a.id)));
        Ok(favorites)
    }

    async fn find_favorite(
        &self,
        user_id: &str,
        child_id: &str,
        video_id: &str,
    ) -> Result<Option<Favorite>, DatabaseError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .favorites
            .iter()
            .find(|f| f.user_id == user_id && f.child_id == child_id && f.video_id == video_id)
            .cloned())
    }

    async fn insert_favorite(&self, favorite: Favorite) -> Result<(), DatabaseError> {
        self.check()?;
        let mut state = self.state.write().await;
        let exists = state.favorites.iter().any(|f| {
            f.user_id == favorite.user_id && f.child_id == favorite.child_id && f.video_id == favorite.video_id
        });
        if !exists {
            state.favorites.push(favorite);
        }
        Ok(())
    }

    async fn delete_favorite(&self, favorite_id: &str) -> Result<(), DatabaseError> {
        self.check()?;
        self.state.write().await.favorites.retain(|f| f.id != favorite_id);
        Ok(())
    }

    async fn touch_watch_history(
        &self,
        user_id: &str,
        child_id: &str,
        video_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.check()?;
        let mut state = self.state.write().await;
        let existing = state
            .history
            .iter()
            .position(|h| h.user_id == user_id && h.child_id == child_id && h.video_id == video_id);
        match existing {
            Some(index) => state.history[index].watched_at = now,
            None => state.history.push(WatchHistory {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                child_id: child_id.to_string(),
                video_id: video_id.to_string(),
                watched_at: now,
            }),
        }
        Ok(())
    }

    async fn list_watch_history(
        &self,
        user_id: &str,
        child_id: &str,
        limit: i32,
    ) -> Result<Vec<WatchHistory>, DatabaseError> {
        self.check()?;
        let state = self.state.read().await;
        let mut history: Vec<WatchHistory> = state
            .history
            .iter()
            .filter(|h| h.user_id == user_id && h.child_id == child_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| (b.watched_at, &b.id).cmp(&(a.watched_at, &a.id)));
        history.truncate(limit.max(0) as usize);
        Ok(history)
    }

    async fn record_short_view(&self, update: &ShortViewUpdate) -> Result<(), DatabaseError> {
        self.check()?;
        let mut state = self.state.write().await;
        let existing = state.short_views.iter().position(|s| {
            s.user_id == update.user_id && s.child_id == update.child_id && s.video_id == update.video_id
        });
        match existing {
            Some(index) => {
                let existing = &mut state.short_views[index];
                existing.watched_ms += update.watched_ms;
                existing.completed = existing.completed || update.completed;
                existing.viewed_at = update.viewed_at;
            }
            None => state.short_views.push(update.clone()),
        }
        Ok(())
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn quiz_for_video(&self, video_id: &str) -> Result<Option<QuizDefinition>, DatabaseError> {
        self.check()?;
        Ok(self.state.read().await.quizzes.get(video_id).cloned())
    }

    async fn insert_attempt(&self, attempt: QuizAttempt, answers: &[QuizAnswer]) -> Result<QuizAttempt, DatabaseError> {
        self.check()?;
        self.state.write().await.attempts.push((attempt.clone(), answers.to_vec()));
        Ok(attempt)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        self.check()
    }
}
