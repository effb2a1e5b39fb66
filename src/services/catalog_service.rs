use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

use super::error::ServiceError;
use crate::config::CONFIG;
use crate::database::models::{CategoryCount, ContentType, Video};
use crate::database::{Store, VideoCriterion, VideoOrder, VideoQuery};
use crate::policy::Viewer;

/// Video as the client sees it. `videoUrl` is only present where the client plays the video.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub age_group: String,
    pub thumbnail_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub content_type: String,
    pub duration_sec: i32,
    pub views_count: i32,
    pub created_at: DateTime<Utc>,
    pub is_favorite: bool,
}

impl VideoItem {
    pub fn new(video: Video, is_favorite: bool, with_url: bool) -> Self {
        Self {
            id: video.id,
            slug: video.slug,
            title: video.title,
            description: video.description,
            category: video.category,
            age_group: video.age_group,
            thumbnail_url: video.thumbnail_url,
            video_url: with_url.then_some(video.video_url),
            content_type: video.content_type,
            duration_sec: video.duration_sec,
            views_count: video.views_count,
            created_at: video.created_at,
            is_favorite,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VideoListParams {
    pub limit: Option<i64>,
    pub q: Option<String>,
    pub category: Option<String>,
    pub age_group: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortsPage {
    pub items: Vec<VideoItem>,
    pub next_cursor: Option<String>,
}

/// Clamp an optional client-supplied page size
pub fn clamp_page_size(requested: Option<i64>, default: i32, max: i32) -> i32 {
    requested.unwrap_or(default as i64).clamp(1, max as i64) as i32
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn list_videos(&self, viewer: &Viewer, params: &VideoListParams) -> Result<Vec<VideoItem>, ServiceError> {
        let catalog = &CONFIG.catalog;
        let limit = clamp_page_size(params.limit, catalog.list_default_limit, catalog.list_max_limit);

        let mut query = VideoQuery::visible_to(&viewer.scope)
            .with(VideoCriterion::ContentType(ContentType::Long))
            .limit(limit);
        if let Some(q) = non_empty(params.q.as_deref()) {
            query = query.with(VideoCriterion::Search(q));
        }
        if let Some(category) = non_empty(params.category.as_deref()) {
            query = query.with(VideoCriterion::Category(category));
        }
        if let Some(age_group) = non_empty(params.age_group.as_deref()) {
            query = query.with(VideoCriterion::AgeGroup(age_group));
        }

        let videos = self.store.find_videos(&query).await?;
        self.with_favorites(viewer, videos, false).await
    }

    pub async fn categories(&self, viewer: &Viewer) -> Result<Vec<CategoryCount>, ServiceError> {
        let query = VideoQuery::visible_to(&viewer.scope);
        Ok(self.store.count_by_category(&query).await?)
    }

    /// A published video the viewer may see, or the same NotFound a missing slug gets
    pub async fn resolve_video(&self, viewer: &Viewer, slug: &str) -> Result<Video, ServiceError> {
        let query = VideoQuery::visible_to(&viewer.scope).with(VideoCriterion::Slug(slug.to_string()));
        match self.store.find_video(&query).await? {
            Some(video) => Ok(video),
            None => {
                if let Some(child_id) = viewer.active_child_id() {
                    warn!("Video {} not visible to child {}", slug, child_id);
                }
                Err(ServiceError::video_not_found())
            }
        }
    }

    /// Like [`resolve_video`](Self::resolve_video), by id
    pub async fn resolve_video_id(&self, viewer: &Viewer, video_id: &str) -> Result<Video, ServiceError> {
        let query = VideoQuery::visible_to(&viewer.scope).with(VideoCriterion::Id(video_id.to_string()));
        self.store
            .find_video(&query)
            .await?
            .ok_or_else(ServiceError::video_not_found)
    }

    pub async fn video_by_slug(&self, viewer: &Viewer, slug: &str) -> Result<VideoItem, ServiceError> {
        let video = self.resolve_video(viewer, slug).await?;
        let mut items = self.with_favorites(viewer, vec![video], true).await?;
        items.pop().ok_or_else(ServiceError::video_not_found)
    }

    pub async fn similar(&self, viewer: &Viewer, slug: &str) -> Result<Vec<VideoItem>, ServiceError> {
        let current = self.resolve_video(viewer, slug).await?;
        let query = VideoQuery::visible_to(&viewer.scope)
            .with(VideoCriterion::ExcludeId(current.id.clone()))
            .with(VideoCriterion::SameCategoryOrAgeGroup {
                category: current.category,
                age_group: current.age_group,
            })
            .order(VideoOrder::MostViewed)
            .limit(CONFIG.catalog.similar_limit);

        let videos = self.store.find_videos(&query).await?;
        self.with_favorites(viewer, videos, false).await
    }

    /// One page of the shorts feed; `cursor` is the id of the last short already shown
    pub async fn shorts(
        &self,
        viewer: &Viewer,
        cursor: Option<&str>,
        take: Option<i64>,
    ) -> Result<ShortsPage, ServiceError> {
        let catalog = &CONFIG.catalog;
        let take = clamp_page_size(take, catalog.shorts_default_take, catalog.shorts_max_take);

        // One extra row tells whether another page exists
        let mut query = VideoQuery::visible_to(&viewer.scope)
            .with(VideoCriterion::ContentType(ContentType::Short))
            .order(VideoOrder::Newest)
            .limit(take + 1);
        if let Some(cursor) = non_empty(cursor) {
            query = query.after(cursor);
        }

        let mut videos = self.store.find_videos(&query).await?;
        let has_more = videos.len() > take as usize;
        videos.truncate(take as usize);
        let next_cursor = if has_more { videos.last().map(|v| v.id.clone()) } else { None };

        Ok(ShortsPage {
            items: self.with_favorites(viewer, videos, true).await?,
            next_cursor,
        })
    }

    pub(crate) async fn with_favorites(
        &self,
        viewer: &Viewer,
        videos: Vec<Video>,
        with_url: bool,
    ) -> Result<Vec<VideoItem>, ServiceError> {
        let favorites: HashSet<String> = match (viewer.user_id.as_deref(), viewer.active_child_id()) {
            (Some(user_id), Some(child_id)) if !videos.is_empty() => {
                let ids: Vec<String> = videos.iter().map(|v| v.id.clone()).collect();
                self.store
                    .favorite_video_ids(user_id, child_id, &ids)
                    .await?
                    .into_iter()
                    .collect()
            }
            _ => HashSet::new(),
        };

        Ok(videos
            .into_iter()
            .map(|v| {
                let is_favorite = favorites.contains(&v.id);
                VideoItem::new(v, is_favorite, with_url)
            })
            .collect())
    }
}
