use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ServiceError;
use super::require_user;
use crate::config::CONFIG;
use crate::database::models::{ChildProfile, ParentalControls};
use crate::database::Store;
use crate::policy::{AgeGroup, Viewer};

pub const DEFAULT_DAILY_LIMIT_MINUTES: i32 = 60;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildItem {
    #[serde(flatten)]
    pub profile: ChildProfile,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChild {
    pub name: String,
    pub age: i32,
    pub avatar_color: String,
    pub interests: Vec<String>,
}

impl NewChild {
    fn validate(&self) -> Result<(), ServiceError> {
        if self.name.trim().chars().count() < 2 {
            return Err(ServiceError::validation("Name must be at least 2 characters"));
        }
        if !(4..=13).contains(&self.age) {
            return Err(ServiceError::validation("Age must be between 4 and 13"));
        }
        if self.avatar_color.trim().is_empty() {
            return Err(ServiceError::validation("Avatar color is required"));
        }
        if self.interests.iter().all(|i| i.trim().is_empty()) {
            return Err(ServiceError::validation("At least one interest is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsInput {
    pub child_id: String,
    pub daily_limit_minutes: i32,
    pub educational_only: bool,
    pub allowed_age_groups: Vec<String>,
}

impl ControlsInput {
    /// Parsed, de-duplicated settings in the canonical label form
    fn validate(&self) -> Result<ParentalControls, ServiceError> {
        if !(30..=180).contains(&self.daily_limit_minutes) {
            return Err(ServiceError::validation("Daily limit must be between 30 and 180 minutes"));
        }

        let mut groups: Vec<AgeGroup> = Vec::with_capacity(self.allowed_age_groups.len());
        for label in &self.allowed_age_groups {
            let group: AgeGroup = label
                .parse()
                .map_err(|value| ServiceError::validation(format!("Unknown age group: {}", value)))?;
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        if groups.is_empty() || groups.len() > AgeGroup::ALL.len() {
            return Err(ServiceError::validation("Select between 1 and 3 age groups"));
        }

        Ok(ParentalControls {
            daily_limit_minutes: self.daily_limit_minutes,
            educational_only: self.educational_only,
            allowed_age_groups: groups.iter().map(|g| g.as_str().to_string()).collect(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsView {
    pub child_id: String,
    pub daily_limit_minutes: i32,
    pub educational_only: bool,
    pub allowed_age_groups: Vec<String>,
}

/// "aLiCe  smith" -> "Alice Smith"
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub struct ChildService<'a> {
    store: &'a dyn Store,
}

impl<'a> ChildService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn list(&self, viewer: &Viewer) -> Result<Vec<ChildItem>, ServiceError> {
        let user_id = require_user(viewer)?;
        let active = viewer.active_child_id();
        Ok(self
            .store
            .list_children(user_id)
            .await?
            .into_iter()
            .map(|profile| ChildItem {
                is_active: Some(profile.id.as_str()) == active,
                profile,
            })
            .collect())
    }

    pub async fn create(&self, viewer: &Viewer, input: &NewChild) -> Result<ChildProfile, ServiceError> {
        let user_id = require_user(viewer)?;
        input.validate()?;

        let limit = CONFIG.catalog.max_children_per_account;
        if self.store.count_children(user_id).await? >= limit {
            return Err(ServiceError::Conflict(format!("An account can have at most {} children", limit)));
        }

        let now = Utc::now();
        let child = ChildProfile {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: title_case(&input.name),
            age: input.age,
            avatar_color: input.avatar_color.trim().to_string(),
            interests: input
                .interests
                .iter()
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty())
                .collect(),
            allowed_age_groups: AgeGroup::ALL.iter().map(|g| g.as_str().to_string()).collect(),
            educational_only: false,
            daily_limit_minutes: DEFAULT_DAILY_LIMIT_MINUTES,
            created_at: now,
            updated_at: now,
        };
        Ok(self.store.insert_child(child).await?)
    }

    /// The owned child to make active; the caller persists the selection
    pub async fn switch(&self, viewer: &Viewer, child_id: &str) -> Result<ChildProfile, ServiceError> {
        let user_id = require_user(viewer)?;
        self.store
            .find_owned_child(user_id, child_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Child profile not found".to_string()))
    }

    pub async fn update_controls(&self, viewer: &Viewer, input: &ControlsInput) -> Result<ControlsView, ServiceError> {
        let user_id = require_user(viewer)?;
        let controls = input.validate()?;

        let child = self
            .store
            .find_owned_child(user_id, &input.child_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Child profile not found".to_string()))?;

        let updated = self.store.update_controls(&child.id, &controls, Utc::now()).await?;
        Ok(ControlsView {
            child_id: updated.id,
            daily_limit_minutes: updated.daily_limit_minutes,
            educational_only: updated.educational_only,
            allowed_age_groups: updated.allowed_age_groups,
        })
    }
}
