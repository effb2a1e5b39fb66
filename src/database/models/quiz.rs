use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quiz {
    pub id: String,
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizQuestion {
    pub id: String,
    pub quiz_id: String,
    pub text: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizOption {
    pub id: String,
    pub question_id: String,
    pub text: String,
    pub sort_order: i32,
    pub is_correct: bool,
}

/// A quiz with its questions and options, both sorted by `sort_order`
#[derive(Debug, Clone)]
pub struct QuizDefinition {
    pub quiz: Quiz,
    pub questions: Vec<(QuizQuestion, Vec<QuizOption>)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizAttempt {
    pub id: String,
    pub quiz_id: String,
    pub user_id: String,
    pub child_id: String,
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub question_id: String,
    pub selected_option_id: Option<String>,
    pub is_correct: bool,
}
