use async_graphql::InputObject;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Answer, AnswerSheet, Language},
};

pub static NATIONAL_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[A-Za-z0-9]{4,20}\s*$").expect("NATIONAL_ID_REGEX is a valid regex pattern")
});

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(regex(
        path = *NATIONAL_ID_REGEX,
        message = "National id must be 4 to 20 letters or digits"
    ))]
    pub national_id_number: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StaffLoginRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,

    #[validate(length(min = 4, max = 128))]
    pub access_code: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStaffRequest {
    #[validate(regex(path = *NATIONAL_ID_REGEX))]
    pub national_id_number: String,

    #[validate(length(min = 1, max = 200))]
    pub display_name: String,

    #[validate(length(min = 3, max = 50))]
    pub username: String,

    #[validate(length(min = 4, max = 128))]
    pub access_code: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,

    #[validate(length(min = 1, max = 2000))]
    pub statement_fr: String,

    #[validate(length(max = 2000))]
    pub statement_en: Option<String>,

    #[validate(length(max = 2000))]
    pub statement_ar: Option<String>,

    pub correct_answer: bool,

    #[serde(default)]
    pub is_mandatory: bool,

    #[validate(range(min = 1, max = 100))]
    pub points: Option<i32>,

    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub statement_fr: Option<String>,

    #[validate(length(max = 2000))]
    pub statement_en: Option<String>,

    #[validate(length(max = 2000))]
    pub statement_ar: Option<String>,

    pub correct_answer: Option<bool>,

    pub is_mandatory: Option<bool>,

    #[validate(range(min = 1, max = 100))]
    pub points: Option<i32>,

    #[validate(url)]
    pub image_url: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuestionsParams {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTestDefinitionRequest {
    #[validate(range(min = 1, max = 6))]
    pub version: i32,

    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,

    #[validate(range(min = 1, max = 30))]
    pub duration_minutes: i32,

    #[validate(length(min = 1))]
    pub question_order: Vec<String>,

    #[serde(default)]
    pub mandatory_question_ids: Vec<String>,

    #[validate(range(min = 1))]
    pub total_questions: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddQuestionRequest {
    #[validate(length(min = 1))]
    pub question_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetMandatoryQuestionsRequest {
    pub question_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReorderQuestionsRequest {
    #[validate(length(min = 1))]
    pub question_order: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTestDefinitionsParams {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageParams {
    pub language: Option<Language>,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct StartAttemptRequest {
    #[validate(range(min = 1, max = 6))]
    pub test_version: i32,

    pub language: Option<Language>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordAnswerRequest {
    #[validate(length(min = 1))]
    pub question_id: String,

    pub answer: Answer,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct FinishAttemptRequest {
    pub answers: Option<AnswerSheet>,

    #[validate(range(min = 0))]
    pub elapsed_seconds: Option<i64>,
}

impl FinishAttemptRequest {
    /// An empty body means "finish with what was recorded". Anything else
    /// must parse, so a malformed batch never finalizes the attempt.
    pub fn from_body(body: &[u8]) -> AppResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        serde_json::from_slice(body)
            .map_err(|e| AppError::ValidationError(format!("Invalid finish request: {}", e)))
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct ImportRow {
    pub national_id_number: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ImportRowsRequest {
    #[validate(length(min = 1, max = 5000))]
    pub rows: Vec<ImportRow>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateCertificateRequest {
    #[validate(length(min = 1))]
    pub attempt_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CertificateSearchParams {
    #[validate(regex(path = *NATIONAL_ID_REGEX))]
    pub national_id_number: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CertificateNameSearchParams {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct StatisticsParams {
    #[validate(range(min = 1, max = 6))]
    pub version: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationParams {
    #[validate(range(min = 0))]
    pub offset: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            offset: Some(0),
            limit: Some(20),
        }
    }
}

impl PaginationParams {
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }
}
