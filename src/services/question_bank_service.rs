use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{LocalizedText, Question},
        dto::request::{CreateQuestionRequest, UpdateQuestionRequest},
    },
    repositories::QuestionRepository,
};

pub struct QuestionBankService {
    repository: Arc<dyn QuestionRepository>,
}

impl QuestionBankService {
    pub fn new(repository: Arc<dyn QuestionRepository>) -> Self {
        Self { repository }
    }

    pub async fn create_question(&self, request: CreateQuestionRequest) -> AppResult<Question> {
        request.validate()?;

        let code = request.code.trim().to_uppercase();
        if self.repository.find_by_code(&code).await?.is_some() {
            return Err(AppError::AlreadyExists(format!(
                "Question with code '{}' already exists",
                code
            )));
        }

        let statement = LocalizedText {
            fr: request.statement_fr.trim().to_string(),
            en: non_blank(request.statement_en),
            ar: non_blank(request.statement_ar),
        };

        let mut question = Question::new(
            &code,
            statement,
            request.correct_answer,
            request.points.unwrap_or(1),
        );
        question.is_mandatory = request.is_mandatory;
        question.image_url = non_blank(request.image_url);

        let question = self.repository.create(question).await?;
        log::info!("Question {} created ({})", question.code, question.id);
        Ok(question)
    }

    pub async fn update_question(
        &self,
        id: &str,
        request: UpdateQuestionRequest,
    ) -> AppResult<Question> {
        request.validate()?;

        let mut question = self.get_question(id).await?;

        if let Some(fr) = request.statement_fr {
            question.statement.fr = fr.trim().to_string();
        }
        if request.statement_en.is_some() {
            question.statement.en = non_blank(request.statement_en);
        }
        if request.statement_ar.is_some() {
            question.statement.ar = non_blank(request.statement_ar);
        }
        if let Some(correct_answer) = request.correct_answer {
            question.correct_answer = correct_answer;
        }
        if let Some(is_mandatory) = request.is_mandatory {
            question.is_mandatory = is_mandatory;
        }
        if let Some(points) = request.points {
            question.points = points;
        }
        if request.image_url.is_some() {
            question.image_url = non_blank(request.image_url);
        }
        if let Some(is_active) = request.is_active {
            question.is_active = is_active;
        }
        question.modified_at = Some(Utc::now());

        self.repository.update(question).await
    }

    /// Questions are never hard-deleted; test definitions may still
    /// reference them.
    pub async fn deactivate_question(&self, id: &str) -> AppResult<Question> {
        let mut question = self.get_question(id).await?;
        question.is_active = false;
        question.modified_at = Some(Utc::now());

        let question = self.repository.update(question).await?;
        log::info!("Question {} deactivated", question.code);
        Ok(question)
    }

    pub async fn get_question(&self, id: &str) -> AppResult<Question> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question with id '{}' not found", id)))
    }

    pub async fn list_questions(&self, include_inactive: bool) -> AppResult<Vec<Question>> {
        self.repository.list(include_inactive).await
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
