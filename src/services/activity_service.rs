use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::catalog_service::{CatalogService, VideoItem};
use super::error::ServiceError;
use super::require_user;
use crate::config::CONFIG;
use crate::database::models::{ContentType, Favorite, ShortViewUpdate, Video};
use crate::database::{Store, VideoCriterion, VideoQuery};
use crate::policy::Viewer;

/// Upper bound for a single reported short view: one hour
pub const MAX_WATCHED_MS: i64 = 3_600_000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub video: VideoItem,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub watched_at: DateTime<Utc>,
    pub video: VideoItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteState {
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub ok: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortViewInput {
    pub watched_ms: Option<i64>,
    pub completed: Option<bool>,
}

impl ShortViewInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        match self.watched_ms {
            Some(ms) if !(0..=MAX_WATCHED_MS).contains(&ms) => Err(ServiceError::validation(format!(
                "watchedMs must be between 0 and {}",
                MAX_WATCHED_MS
            ))),
            _ => Ok(()),
        }
    }
}

pub struct ActivityService<'a> {
    store: &'a dyn Store,
}

impl<'a> ActivityService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Videos by id that the viewer may still see
    async fn visible_by_id(&self, viewer: &Viewer, ids: Vec<String>) -> Result<HashMap<String, Video>, ServiceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let query = VideoQuery::visible_to(&viewer.scope).with(VideoCriterion::IdIn(ids));
        Ok(self
            .store
            .find_videos(&query)
            .await?
            .into_iter()
            .map(|v| (v.id.clone(), v))
            .collect())
    }

    pub async fn favorites(&self, viewer: &Viewer) -> Result<Vec<FavoriteItem>, ServiceError> {
        let user_id = require_user(viewer)?;
        let child_id = match viewer.active_child_id() {
            Some(id) => id,
            None => return Ok(vec![]),
        };

        let favorites = self.store.list_favorites(user_id, child_id).await?;
        let mut videos = self
            .visible_by_id(viewer, favorites.iter().map(|f| f.video_id.clone()).collect())
            .await?;

        Ok(favorites
            .into_iter()
            .filter_map(|f| {
                videos.remove(&f.video_id).map(|video| FavoriteItem {
                    id: f.id,
                    created_at: f.created_at,
                    video: VideoItem::new(video, true, false),
                })
            })
            .collect())
    }

    pub async fn toggle_favorite(&self, viewer: &Viewer, video_id: &str) -> Result<FavoriteState, ServiceError> {
        let user_id = require_user(viewer)?;
        let child_id = viewer.active_child_id().ok_or_else(ServiceError::no_active_child)?;
        let video = CatalogService::new(self.store).resolve_video_id(viewer, video_id).await?;

        match self.store.find_favorite(user_id, child_id, &video.id).await? {
            Some(existing) => {
                self.store.delete_favorite(&existing.id).await?;
                Ok(FavoriteState { is_favorite: false })
            }
            None => {
                self.store
                    .insert_favorite(Favorite {
                        id: Uuid::new_v4().to_string(),
                        user_id: user_id.to_string(),
                        child_id: child_id.to_string(),
                        video_id: video.id,
                        created_at: Utc::now(),
                    })
                    .await?;
                Ok(FavoriteState { is_favorite: true })
            }
        }
    }

    /// No-op for anonymous or childless viewers
    pub async fn record_watch(&self, viewer: &Viewer, slug: &str) -> Result<Ack, ServiceError> {
        let (user_id, child_id) = match (viewer.user_id.as_deref(), viewer.active_child_id()) {
            (Some(user), Some(child)) => (user, child),
            _ => return Ok(Ack { ok: true }),
        };

        let video = CatalogService::new(self.store).resolve_video(viewer, slug).await?;
        self.store
            .touch_watch_history(user_id, child_id, &video.id, Utc::now())
            .await?;
        Ok(Ack { ok: true })
    }

    pub async fn record_short_view(
        &self,
        viewer: &Viewer,
        slug: &str,
        input: &ShortViewInput,
    ) -> Result<Ack, ServiceError> {
        input.validate()?;
        let (user_id, child_id) = match (viewer.user_id.as_deref(), viewer.active_child_id()) {
            (Some(user), Some(child)) => (user, child),
            _ => return Ok(Ack { ok: true }),
        };

        let query = VideoQuery::visible_to(&viewer.scope)
            .with(VideoCriterion::Slug(slug.to_string()))
            .with(VideoCriterion::ContentType(ContentType::Short));
        let video = self
            .store
            .find_video(&query)
            .await?
            .ok_or_else(ServiceError::video_not_found)?;

        let now = Utc::now();
        self.store
            .record_short_view(&ShortViewUpdate {
                user_id: user_id.to_string(),
                child_id: child_id.to_string(),
                video_id: video.id.clone(),
                watched_ms: input.watched_ms.unwrap_or(0),
                completed: input.completed.unwrap_or(false),
                viewed_at: now,
            })
            .await?;
        self.store.touch_watch_history(user_id, child_id, &video.id, now).await?;
        Ok(Ack { ok: true })
    }

    pub async fn history(&self, viewer: &Viewer) -> Result<Vec<HistoryItem>, ServiceError> {
        let user_id = require_user(viewer)?;
        let child_id = match viewer.active_child_id() {
            Some(id) => id,
            None => return Ok(vec![]),
        };

        let entries = self
            .store
            .list_watch_history(user_id, child_id, CONFIG.catalog.history_limit)
            .await?;
        let mut videos = self
            .visible_by_id(viewer, entries.iter().map(|h| h.video_id.clone()).collect())
            .await?;
        let favorites: Vec<String> = self
            .store
            .favorite_video_ids(user_id, child_id, &videos.keys().cloned().collect::<Vec<_>>())
            .await?;

        Ok(entries
            .into_iter()
            .filter_map(|h| {
                videos.remove(&h.video_id).map(|video| {
                    let is_favorite = favorites.contains(&video.id);
                    HistoryItem {
                        id: h.id,
                        watched_at: h.watched_at,
                        video: VideoItem::new(video, is_favorite, false),
                    }
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ActivityStore;
    use crate::policy::PolicyResolver;
    use crate::testing::{video_fixture, MemoryStore};
    use chrono::Duration;

    async fn setup() -> (MemoryStore, Viewer) {
        let store = MemoryStore::new();
        store.add_user("parent").await;
        store.add_child_at("kid", "parent", &["4-6"], true, Duration::minutes(-5)).await;
        store.add_video(video_fixture("a", "Science", "4-6")).await;
        store.add_video(video_fixture("b", "Cartoons", "4-6")).await;
        let mut short = video_fixture("s", "Science", "4-6");
        short.content_type = "SHORT".to_string();
        store.add_video(short).await;

        let viewer = PolicyResolver::new(&store)
            .viewer(Some("parent".to_string()), None)
            .await
            .unwrap();
        (store, viewer)
    }

    #[tokio::test]
    async fn toggle_adds_then_removes() {
        let (store, viewer) = setup().await;
        let activity = ActivityService::new(&store);

        assert!(activity.toggle_favorite(&viewer, "vid_a").await.unwrap().is_favorite);
        let favorites = activity.favorites(&viewer).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].video.slug, "a");
        assert!(favorites[0].video.is_favorite);

        assert!(!activity.toggle_favorite(&viewer, "vid_a").await.unwrap().is_favorite);
        assert!(activity.favorites(&viewer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blocked_video_cannot_be_favorited() {
        let (store, viewer) = setup().await;
        let result = ActivityService::new(&store).toggle_favorite(&viewer, "vid_b").await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn favorites_require_a_user_and_a_child() {
        let store = MemoryStore::new();
        store.add_user("parent").await;
        let activity = ActivityService::new(&store);

        let anonymous = Viewer::anonymous();
        assert!(matches!(activity.favorites(&anonymous).await, Err(ServiceError::Unauthorized)));

        let childless = PolicyResolver::new(&store)
            .viewer(Some("parent".to_string()), None)
            .await
            .unwrap();
        assert!(activity.favorites(&childless).await.unwrap().is_empty());
        assert!(matches!(
            activity.toggle_favorite(&childless, "vid_a").await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn watch_is_noop_for_anonymous() {
        let (store, _) = setup().await;
        let ack = ActivityService::new(&store)
            .record_watch(&Viewer::anonymous(), "missing")
            .await
            .unwrap();
        assert!(ack.ok);
    }

    #[tokio::test]
    async fn watch_history_is_upserted_and_filtered() {
        let (store, viewer) = setup().await;
        let activity = ActivityService::new(&store);

        activity.record_watch(&viewer, "a").await.unwrap();
        activity.record_watch(&viewer, "a").await.unwrap();
        assert!(matches!(activity.record_watch(&viewer, "b").await, Err(ServiceError::NotFound(_))));

        let history = activity.history(&viewer).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].video.slug, "a");
    }

    #[tokio::test]
    async fn history_is_capped_to_newest_entries() {
        let (store, viewer) = setup().await;
        let now = Utc::now();
        for i in 0..40 {
            let video = store.add_video(video_fixture(&format!("h{}", i), "Science", "4-6")).await;
            store
                .touch_watch_history("parent", "kid", &video.id, now - Duration::minutes(i))
                .await
                .unwrap();
        }

        let history = ActivityService::new(&store).history(&viewer).await.unwrap();
        assert_eq!(history.len(), CONFIG.catalog.history_limit as usize);
        assert_eq!(history[0].video.slug, "h0");
        assert_eq!(history[29].video.slug, "h29");
    }

    #[tokio::test]
    async fn short_views_accumulate() {
        let (store, viewer) = setup().await;
        let activity = ActivityService::new(&store);

        let first = ShortViewInput {
            watched_ms: Some(1_500),
            completed: Some(false),
        };
        let second = ShortViewInput {
            watched_ms: Some(2_000),
            completed: Some(true),
        };
        activity.record_short_view(&viewer, "s", &first).await.unwrap();
        activity.record_short_view(&viewer, "s", &second).await.unwrap();
        activity.record_short_view(&viewer, "s", &first).await.unwrap();

        let views = store.short_views().await;
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].watched_ms, 5_000);
        assert!(views[0].completed);
    }

    #[tokio::test]
    async fn short_view_rejects_bad_payload_and_long_videos() {
        let (store, viewer) = setup().await;
        let activity = ActivityService::new(&store);

        let too_long = ShortViewInput {
            watched_ms: Some(MAX_WATCHED_MS + 1),
            completed: None,
        };
        assert!(matches!(
            activity.record_short_view(&viewer, "s", &too_long).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            activity.record_short_view(&viewer, "a", &ShortViewInput::default()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn blocked_shorts_are_not_recorded() {
        let (store, viewer) = setup().await;
        for (slug, category, age) in [("fun", "Cartoons", "4-6"), ("older", "Science", "10-13")] {
            let mut short = video_fixture(slug, category, age);
            short.content_type = "SHORT".to_string();
            store.add_video(short).await;
        }

        let activity = ActivityService::new(&store);
        for slug in ["fun", "older"] {
            let result = activity.record_short_view(&viewer, slug, &ShortViewInput::default()).await;
            assert!(matches!(result, Err(ServiceError::NotFound(_))), "{}", slug);
        }
        assert!(store.short_views().await.is_empty());
        assert!(activity.history(&viewer).await.unwrap().is_empty());
    }
}
