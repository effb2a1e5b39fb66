use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub age_group: String,
    pub thumbnail_url: String,
    pub video_url: String,
    pub content_type: String,
    pub duration_sec: i32,
    pub views_count: i32,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentType {
    Long,
    Short,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Long => "LONG",
            ContentType::Short => "SHORT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CategoryCount {
    #[sqlx(rename = "key")]
    pub name: String,
    pub count: i64,
}
