use serde_json::{json, Value};
use std::cmp::Ordering;

use crate::database::models::{ContentType, Video};
use crate::filter::FilterData;
use crate::policy::{build_clauses, PolicyClause, PolicyScope};

/// One condition on the `videos` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoCriterion {
    Published,
    ContentType(ContentType),
    Id(String),
    IdIn(Vec<String>),
    ExcludeId(String),
    Slug(String),
    Category(String),
    AgeGroup(String),
    /// Case-insensitive substring of title or category
    Search(String),
    SameCategoryOrAgeGroup { category: String, age_group: String },
    Policy(PolicyClause),
}

impl VideoCriterion {
    pub fn to_where(&self) -> Value {
        match self {
            VideoCriterion::Published => json!({ "is_published": true }),
            VideoCriterion::ContentType(ct) => json!({ "content_type": ct.as_str() }),
            VideoCriterion::Id(id) => json!({ "id": id }),
            VideoCriterion::IdIn(ids) => json!({ "id": { "$in": ids } }),
            VideoCriterion::ExcludeId(id) => json!({ "id": { "$ne": id } }),
            VideoCriterion::Slug(slug) => json!({ "slug": slug }),
            VideoCriterion::Category(category) => json!({ "category": category }),
            VideoCriterion::AgeGroup(age_group) => json!({ "age_group": age_group }),
            VideoCriterion::Search(term) => {
                let pattern = format!("%{}%", escape_like(term));
                json!({ "$or": [
                    { "title": { "$ilike": pattern } },
                    { "category": { "$ilike": pattern } }
                ]})
            }
            VideoCriterion::SameCategoryOrAgeGroup { category, age_group } => json!({ "$or": [
                { "category": category },
                { "age_group": age_group }
            ]}),
            VideoCriterion::Policy(clause) => clause.to_where(),
        }
    }

    pub fn matches(&self, video: &Video) -> bool {
        match self {
            VideoCriterion::Published => video.is_published,
            VideoCriterion::ContentType(ct) => video.content_type == ct.as_str(),
            VideoCriterion::Id(id) => video.id == *id,
            VideoCriterion::IdIn(ids) => ids.contains(&video.id),
            VideoCriterion::ExcludeId(id) => video.id != *id,
            VideoCriterion::Slug(slug) => video.slug == *slug,
            VideoCriterion::Category(category) => video.category == *category,
            VideoCriterion::AgeGroup(age_group) => video.age_group == *age_group,
            VideoCriterion::Search(term) => {
                let term = term.to_lowercase();
                video.title.to_lowercase().contains(&term) || video.category.to_lowercase().contains(&term)
            }
            VideoCriterion::SameCategoryOrAgeGroup { category, age_group } => {
                video.category == *category || video.age_group == *age_group
            }
            VideoCriterion::Policy(clause) => clause.matches(video),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoOrder {
    /// created_at desc, id desc
    Newest,
    /// views_count desc, created_at desc
    MostViewed,
}

impl VideoOrder {
    fn to_order(self) -> Value {
        match self {
            VideoOrder::Newest => json!(["created_at desc", "id desc"]),
            VideoOrder::MostViewed => json!(["views_count desc", "created_at desc"]),
        }
    }

    /// `Less` when `a` comes before `b`
    pub fn compare(self, a: &Video, b: &Video) -> Ordering {
        match self {
            VideoOrder::Newest => (&b.created_at, &b.id).cmp(&(&a.created_at, &a.id)),
            VideoOrder::MostViewed => (b.views_count, b.created_at).cmp(&(a.views_count, a.created_at)),
        }
    }
}

/// A query over published videos, restricted by a policy scope.
///
/// The only constructor takes the scope, so no video query can be issued
/// without the policy clauses in it.
#[derive(Debug, Clone)]
pub struct VideoQuery {
    criteria: Vec<VideoCriterion>,
    order: VideoOrder,
    limit: Option<i32>,
    after: Option<String>,
}

impl VideoQuery {
    pub fn visible_to(scope: &PolicyScope) -> Self {
        let mut criteria = vec![VideoCriterion::Published];
        criteria.extend(build_clauses(scope).into_iter().map(VideoCriterion::Policy));
        Self {
            criteria,
            order: VideoOrder::Newest,
            limit: None,
            after: None,
        }
    }

    pub fn with(mut self, criterion: VideoCriterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn order(mut self, order: VideoOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Keyset pagination: rows strictly after the video with this id
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn criteria(&self) -> &[VideoCriterion] {
        &self.criteria
    }

    pub fn sort_order(&self) -> VideoOrder {
        self.order
    }

    pub fn limit_value(&self) -> Option<i32> {
        self.limit
    }

    pub fn cursor(&self) -> Option<&str> {
        self.after.as_deref()
    }

    pub fn matches(&self, video: &Video) -> bool {
        self.criteria.iter().all(|c| c.matches(video))
    }

    pub fn to_filter_data(&self) -> FilterData {
        let conditions: Vec<Value> = self.criteria.iter().map(VideoCriterion::to_where).collect();
        FilterData {
            where_clause: Some(json!({ "$and": conditions })),
            order: Some(self.order.to_order()),
            limit: self.limit,
            after: self.after.clone(),
            ..Default::default()
        }
    }
}

/// Escape LIKE wildcards so user input only ever matches literally
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
