use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::catalog_service::CatalogService;
use super::error::ServiceError;
use super::require_user;
use crate::database::models::{QuizAnswer, QuizAttempt, QuizDefinition};
use crate::database::Store;
use crate::policy::Viewer;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub id: String,
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: String,
    pub text: String,
    pub options: Vec<OptionView>,
}

/// Answer option without its correctness flag
#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub id: String,
    pub text: String,
}

impl From<QuizDefinition> for QuizView {
    fn from(definition: QuizDefinition) -> Self {
        Self {
            id: definition.quiz.id,
            video_id: definition.quiz.video_id,
            title: definition.quiz.title,
            description: definition.quiz.description,
            questions: definition
                .questions
                .into_iter()
                .map(|(question, options)| QuestionView {
                    id: question.id,
                    text: question.text,
                    options: options
                        .into_iter()
                        .map(|o| OptionView { id: o.id, text: o.text })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: String,
    pub option_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizSubmission {
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptView {
    pub id: String,
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub created_at: DateTime<Utc>,
}

/// Grade answers against the quiz. Unanswered questions, and options that do
/// not belong to their question, count as wrong.
pub fn grade(definition: &QuizDefinition, submission: &QuizSubmission) -> (i32, Vec<QuizAnswer>) {
    // Repeated answers to one question: the last one counts
    let chosen: HashMap<&str, &str> = submission
        .answers
        .iter()
        .map(|a| (a.question_id.as_str(), a.option_id.as_str()))
        .collect();

    let mut score = 0;
    let answers = definition
        .questions
        .iter()
        .map(|(question, options)| {
            let selected = chosen
                .get(question.id.as_str())
                .and_then(|option_id| options.iter().find(|o| o.id == *option_id));
            let is_correct = selected.map(|o| o.is_correct).unwrap_or(false);
            if is_correct {
                score += 1;
            }
            QuizAnswer {
                question_id: question.id.clone(),
                selected_option_id: selected.map(|o| o.id.clone()),
                is_correct,
            }
        })
        .collect();
    (score, answers)
}

pub fn percentage(score: i32, max_score: i32) -> i32 {
    if max_score <= 0 {
        return 0;
    }
    (score as f64 * 100.0 / max_score as f64).round() as i32
}

pub struct QuizService<'a> {
    store: &'a dyn Store,
}

impl<'a> QuizService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    async fn definition(&self, viewer: &Viewer, slug: &str) -> Result<QuizDefinition, ServiceError> {
        let video = CatalogService::new(self.store).resolve_video(viewer, slug).await?;
        self.store
            .quiz_for_video(&video.id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Quiz not found".to_string()))
    }

    pub async fn quiz(&self, viewer: &Viewer, slug: &str) -> Result<QuizView, ServiceError> {
        require_user(viewer)?;
        Ok(self.definition(viewer, slug).await?.into())
    }

    pub async fn submit(
        &self,
        viewer: &Viewer,
        slug: &str,
        submission: &QuizSubmission,
    ) -> Result<AttemptView, ServiceError> {
        let user_id = require_user(viewer)?;
        let child_id = viewer.active_child_id().ok_or_else(ServiceError::no_active_child)?;
        if submission
            .answers
            .iter()
            .any(|a| a.question_id.trim().is_empty() || a.option_id.trim().is_empty())
        {
            return Err(ServiceError::validation("Each answer needs a questionId and an optionId"));
        }

        let definition = self.definition(viewer, slug).await?;
        let max_score = definition.questions.len() as i32;
        if max_score == 0 {
            return Err(ServiceError::validation("Quiz has no questions"));
        }

        let (score, answers) = grade(&definition, submission);
        let attempt = QuizAttempt {
            id: Uuid::new_v4().to_string(),
            quiz_id: definition.quiz.id.clone(),
            user_id: user_id.to_string(),
            child_id: child_id.to_string(),
            score,
            max_score,
            percentage: percentage(score, max_score),
            created_at: Utc::now(),
        };
        let saved = self.store.insert_attempt(attempt, &answers).await?;

        Ok(AttemptView {
            id: saved.id,
            score: saved.score,
            max_score: saved.max_score,
            percentage: saved.percentage,
            created_at: saved.created_at,
        })
    }
}
