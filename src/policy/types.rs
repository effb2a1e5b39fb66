use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::PolicyError;
use crate::database::models::ChildProfile;

/// Viewing band shared by child settings and video targeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "4-6")]
    Preschool,
    #[serde(rename = "7-9")]
    Primary,
    #[serde(rename = "10-13")]
    Middle,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 3] = [AgeGroup::Preschool, AgeGroup::Primary, AgeGroup::Middle];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Preschool => "4-6",
            AgeGroup::Primary => "7-9",
            AgeGroup::Middle => "10-13",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgeGroup::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Safety settings of the active child, snapshotted for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPolicy {
    pub child_id: String,
    pub allowed_age_groups: Vec<AgeGroup>,
    pub educational_only: bool,
}

impl ContentPolicy {
    /// Stored labels outside the enumeration are rejected rather than skipped:
    /// dropping one could turn a restricted list into an empty, unrestricted one.
    pub fn from_child(child: &ChildProfile) -> Result<Self, PolicyError> {
        let allowed_age_groups = child
            .allowed_age_groups
            .iter()
            .map(|label| {
                label.parse::<AgeGroup>().map_err(|value| PolicyError::InvalidSettings {
                    child_id: child.id.clone(),
                    value,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            child_id: child.id.clone(),
            allowed_age_groups,
            educational_only: child.educational_only,
        })
    }
}

/// Whether video queries in this request are filtered by a child's policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "policy", rename_all = "snake_case")]
pub enum PolicyScope {
    Unrestricted,
    Restricted(ContentPolicy),
}

impl PolicyScope {
    pub fn policy(&self) -> Option<&ContentPolicy> {
        match self {
            PolicyScope::Unrestricted => None,
            PolicyScope::Restricted(policy) => Some(policy),
        }
    }
}
