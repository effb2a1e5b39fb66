use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    CategoryCount, ChildProfile, Favorite, ParentalControls, Quiz, QuizAnswer, QuizAttempt, QuizDefinition, QuizOption,
    QuizQuestion, Session, ShortViewUpdate, User, Video, WatchHistory,
};
use crate::database::repository::Repository;
use crate::database::store::{ActivityStore, ChildProfileStore, QuizStore, SessionStore, Store, VideoStore};
use crate::database::video_query::VideoQuery;
use crate::filter::FilterData;

/// PostgreSQL-backed store. Holds no connections itself; every call borrows
/// the shared pool from [`DatabaseManager`].
#[derive(Debug, Clone, Default)]
pub struct PgStore;

impl PgStore {
    pub fn new() -> Self {
        Self
    }

    async fn pool(&self) -> Result<PgPool, DatabaseError> {
        DatabaseManager::pool().await
    }

    async fn repository<T>(&self, table: &str) -> Result<Repository<T>, DatabaseError>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        Ok(Repository::new(table, self.pool().await?))
    }
}

fn find_where(where_clause: serde_json::Value) -> FilterData {
    FilterData {
        where_clause: Some(where_clause),
        ..Default::default()
    }
}

fn find_ordered(where_clause: serde_json::Value, order: serde_json::Value) -> FilterData {
    FilterData {
        where_clause: Some(where_clause),
        order: Some(order),
        ..Default::default()
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn find_session(&self, token: &str) -> Result<Option<Session>, DatabaseError> {
        self.repository::<Session>("sessions")
            .await?
            .select_one(find_where(json!({ "token": token })))
            .await
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool().await?)
            .await?;
        Ok(())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, DatabaseError> {
        self.repository::<User>("users")
            .await?
            .select_one(find_where(json!({ "id": user_id })))
            .await
    }

    async fn update_user_language(&self, user_id: &str, language: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET language = $2 WHERE id = $1")
            .bind(user_id)
            .bind(language)
            .execute(&self.pool().await?)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChildProfileStore for PgStore {
    async fn find_owned_child(&self, user_id: &str, child_id: &str) -> Result<Option<ChildProfile>, DatabaseError> {
        self.repository::<ChildProfile>("child_profiles")
            .await?
            .select_one(find_where(json!({ "id": child_id, "user_id": user_id })))
            .await
    }

    async fn first_child(&self, user_id: &str) -> Result<Option<ChildProfile>, DatabaseError> {
        let filter = FilterData {
            limit: Some(1),
            ..find_ordered(json!({ "user_id": user_id }), json!(["created_at asc", "id asc"]))
        };
        self.repository::<ChildProfile>("child_profiles")
            .await?
            .select_one(filter)
            .await
    }

    async fn list_children(&self, user_id: &str) -> Result<Vec<ChildProfile>, DatabaseError> {
        self.repository::<ChildProfile>("child_profiles")
            .await?
            .select_any(find_ordered(json!({ "user_id": user_id }), json!(["created_at asc", "id asc"])))
            .await
    }

    async fn count_children(&self, user_id: &str) -> Result<i64, DatabaseError> {
        self.repository::<ChildProfile>("child_profiles")
            .await?
            .count(find_where(json!({ "user_id": user_id })))
            .await
    }

    async fn insert_child(&self, child: ChildProfile) -> Result<ChildProfile, DatabaseError> {
        let row = sqlx::query_as::<_, ChildProfile>(
            "INSERT INTO child_profiles \
             (id, user_id, name, age, avatar_color, interests, allowed_age_groups, educational_only, daily_limit_minutes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
        )
        .bind(&child.id)
        .bind(&child.user_id)
        .bind(&child.name)
        .bind(child.age)
        .bind(&child.avatar_color)
        .bind(&child.interests)
        .bind(&child.allowed_age_groups)
        .bind(child.educational_only)
        .bind(child.daily_limit_minutes)
        .bind(child.created_at)
        .bind(child.updated_at)
        .fetch_one(&self.pool().await?)
        .await?;
        Ok(row)
    }

    async fn update_controls(
        &self,
        child_id: &str,
        controls: &ParentalControls,
        now: DateTime<Utc>,
    ) -> Result<ChildProfile, DatabaseError> {
        let row = sqlx::query_as::<_, ChildProfile>(
            "UPDATE child_profiles \
             SET daily_limit_minutes = $2, educational_only = $3, allowed_age_groups = $4, updated_at = $5 \
             WHERE id = $1 RETURNING *",
        )
        .bind(child_id)
        .bind(controls.daily_limit_minutes)
        .bind(controls.educational_only)
        .bind(&controls.allowed_age_groups)
        .bind(now)
        .fetch_one(&self.pool().await?)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl VideoStore for PgStore {
    async fn find_videos(&self, query: &VideoQuery) -> Result<Vec<Video>, DatabaseError> {
        self.repository::<Video>("videos")
            .await?
            .select_any(query.to_filter_data())
            .await
    }

    async fn find_video(&self, query: &VideoQuery) -> Result<Option<Video>, DatabaseError> {
        let filter = FilterData {
            limit: Some(1),
            ..query.to_filter_data()
        };
        self.repository::<Video>("videos").await?.select_one(filter).await
    }

    async fn count_by_category(&self, query: &VideoQuery) -> Result<Vec<CategoryCount>, DatabaseError> {
        self.repository::<Video>("videos")
            .await?
            .group_count::<CategoryCount>("category", query.to_filter_data())
            .await
    }
}

#[async_trait]
impl ActivityStore for PgStore {
    async fn favorite_video_ids(
        &self,
        user_id: &str,
        child_id: &str,
        video_ids: &[String],
    ) -> Result<Vec<String>, DatabaseError> {
        if video_ids.is_empty() {
            return Ok(vec![]);
        }
        let favorites = self
            .repository::<Favorite>("favorites")
            .await?
            .select_any(find_where(json!({
                "user_id": user_id,
                "child_id": child_id,
                "video_id": { "$in": video_ids }
            })))
            .await?;
        Ok(favorites.into_iter().map(|f| f.video_id).collect())
    }

    async fn list_favorites(&self, user_id: &str, child_id: &str) -> Result<Vec<Favorite>, DatabaseError> {
        self.repository::<Favorite>("favorites")
            .await?
            .select_any(find_ordered(
                json!({ "user_id": user_id, "child_id": child_id }),
                json!(["created_at desc", "id desc"]),
            ))
            .await
    }

    async fn find_favorite(
        &self,
        user_id: &str,
        child_id: &str,
        video_id: &str,
    ) -> Result<Option<Favorite>, DatabaseError> {
        self.repository::<Favorite>("favorites")
            .await?
            .select_one(find_where(json!({
                "user_id": user_id,
                "child_id": child_id,
                "video_id": video_id
            })))
            .await
    }

    async fn insert_favorite(&self, favorite: Favorite) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO favorites (id, user_id, child_id, video_id, created_at) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id, child_id, video_id) DO NOTHING",
        )
        .bind(&favorite.id)
        .bind(&favorite.user_id)
        .bind(&favorite.child_id)
        .bind(&favorite.video_id)
        .bind(favorite.created_at)
        .execute(&self.pool().await?)
        .await?;
        Ok(())
    }

    async fn delete_favorite(&self, favorite_id: &str) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM favorites WHERE id = $1")
            .bind(favorite_id)
            .execute(&self.pool().await?)
            .await?;
        Ok(())
    }

    async fn touch_watch_history(
        &self,
        user_id: &str,
        child_id: &str,
        video_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO watch_history (id, user_id, child_id, video_id, watched_at) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id, child_id, video_id) DO UPDATE SET watched_at = EXCLUDED.watched_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(child_id)
        .bind(video_id)
        .bind(now)
        .execute(&self.pool().await?)
        .await?;
        Ok(())
    }

    async fn list_watch_history(
        &self,
        user_id: &str,
        child_id: &str,
        limit: i32,
    ) -> Result<Vec<WatchHistory>, DatabaseError> {
        let filter = FilterData {
            limit: Some(limit),
            ..find_ordered(
                json!({ "user_id": user_id, "child_id": child_id }),
                json!(["watched_at desc", "id desc"]),
            )
        };
        self.repository::<WatchHistory>("watch_history")
            .await?
            .select_any(filter)
            .await
    }

    async fn record_short_view(&self, update: &ShortViewUpdate) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO short_views (id, user_id, child_id, video_id, watched_ms, completed, last_viewed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id, child_id, video_id) DO UPDATE SET \
             watched_ms = short_views.watched_ms + EXCLUDED.watched_ms, \
             completed = short_views.completed OR EXCLUDED.completed, \
             last_viewed_at = EXCLUDED.last_viewed_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&update.user_id)
        .bind(&update.child_id)
        .bind(&update.video_id)
        .bind(update.watched_ms)
        .bind(update.completed)
        .bind(update.viewed_at)
        .execute(&self.pool().await?)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn quiz_for_video(&self, video_id: &str) -> Result<Option<QuizDefinition>, DatabaseError> {
        let quiz = match self
            .repository::<Quiz>("quizzes")
            .await?
            .select_one(find_where(json!({ "video_id": video_id })))
            .await?
        {
            Some(quiz) => quiz,
            None => return Ok(None),
        };

        let questions = self
            .repository::<QuizQuestion>("quiz_questions")
            .await?
            .select_any(find_ordered(json!({ "quiz_id": quiz.id }), json!(["sort_order asc", "id asc"])))
            .await?;

        let question_ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        let options = if question_ids.is_empty() {
            vec![]
        } else {
            self.repository::<QuizOption>("quiz_options")
                .await?
                .select_any(find_ordered(
                    json!({ "question_id": { "$in": question_ids } }),
                    json!(["sort_order asc", "id asc"]),
                ))
                .await?
        };

        let mut by_question: HashMap<String, Vec<QuizOption>> = HashMap::new();
        for option in options {
            by_question.entry(option.question_id.clone()).or_default().push(option);
        }

        let questions = questions
            .into_iter()
            .map(|q| {
                let options = by_question.remove(&q.id).unwrap_or_default();
                (q, options)
            })
            .collect();

        Ok(Some(QuizDefinition { quiz, questions }))
    }

    async fn insert_attempt(&self, attempt: QuizAttempt, answers: &[QuizAnswer]) -> Result<QuizAttempt, DatabaseError> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;

        let saved = sqlx::query_as::<_, QuizAttempt>(
            "INSERT INTO quiz_attempts (id, quiz_id, user_id, child_id, score, max_score, percentage, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(&attempt.id)
        .bind(&attempt.quiz_id)
        .bind(&attempt.user_id)
        .bind(&attempt.child_id)
        .bind(attempt.score)
        .bind(attempt.max_score)
        .bind(attempt.percentage)
        .bind(attempt.created_at)
        .fetch_one(&mut *tx)
        .await?;

        for answer in answers {
            sqlx::query(
                "INSERT INTO quiz_attempt_answers (id, attempt_id, question_id, selected_option_id, is_correct) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&saved.id)
            .bind(&answer.question_id)
            .bind(&answer.selected_option_id)
            .bind(answer.is_correct)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(saved)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check().await
    }
}
