use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A child profile owned by a parent account.
///
/// `allowed_age_groups` holds the raw stored labels; the policy layer parses
/// them into [`AgeGroup`](crate::policy::AgeGroup) and fails closed on
/// anything outside the enumeration.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChildProfile {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub age: i32,
    pub avatar_color: String,
    pub interests: Vec<String>,
    pub allowed_age_groups: Vec<String>,
    pub educational_only: bool,
    pub daily_limit_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Settings written by the parental-controls endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentalControls {
    pub daily_limit_minutes: i32,
    pub educational_only: bool,
    pub allowed_age_groups: Vec<String>,
}
