use serde::Serialize;
use serde_json::{json, Value};

use super::types::{AgeGroup, PolicyScope};
use crate::database::models::Video;

/// Category labels treated as non-educational.
///
/// The catalog is authored in Russian, so the Russian labels are listed next to
/// the English ones. New entertainment categories must be added here.
pub const ENTERTAINMENT_CATEGORIES: [&str; 6] = [
    "Cartoons",
    "Games",
    "Entertainment",
    "Мультфильмы",
    "Игры",
    "Развлечения",
];

/// One restriction derived from a content policy.
///
/// Clauses are independent and always combined with AND, both with each other
/// and with the caller's own filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum PolicyClause {
    AgeGroupIn(Vec<AgeGroup>),
    CategoryNotIn(Vec<String>),
}

impl PolicyClause {
    /// Condition in the filter where dialect
    pub fn to_where(&self) -> Value {
        match self {
            PolicyClause::AgeGroupIn(groups) => {
                let labels: Vec<&str> = groups.iter().map(AgeGroup::as_str).collect();
                json!({ "age_group": { "$in": labels } })
            }
            PolicyClause::CategoryNotIn(categories) => json!({ "category": { "$nin": categories } }),
        }
    }

    pub fn matches(&self, video: &Video) -> bool {
        match self {
            PolicyClause::AgeGroupIn(groups) => groups.iter().any(|g| g.as_str() == video.age_group),
            PolicyClause::CategoryNotIn(categories) => !categories.iter().any(|c| *c == video.category),
        }
    }
}

/// Clauses every video query must AND into its filter for this scope
pub fn build_clauses(scope: &PolicyScope) -> Vec<PolicyClause> {
    let policy = match scope {
        PolicyScope::Unrestricted => return vec![],
        PolicyScope::Restricted(policy) => policy,
    };

    let mut clauses = Vec::with_capacity(2);
    if !policy.allowed_age_groups.is_empty() {
        clauses.push(PolicyClause::AgeGroupIn(policy.allowed_age_groups.clone()));
    }
    if policy.educational_only {
        clauses.push(PolicyClause::CategoryNotIn(
            ENTERTAINMENT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        ));
    }
    clauses
}
