use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{
    Attempt, AttemptStatus, Certificate, Language, Participant, ParticipantRole, Question,
    TestDefinition,
};

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct ParticipantDto {
    pub id: String,
    pub display_name: String,
    pub national_id_number: String,
    pub role: ParticipantRole,
}

impl From<Participant> for ParticipantDto {
    fn from(participant: Participant) -> Self {
        ParticipantDto {
            id: participant.id,
            display_name: participant.display_name,
            national_id_number: participant.national_id_number,
            role: participant.role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub participant: ParticipantDto,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct TestDefinitionDto {
    pub id: String,
    pub version: i32,
    pub description: String,
    pub duration_minutes: i32,
    pub total_questions: i32,
    pub mandatory_questions_count: i32,
    pub optional_questions_count: i32,
    pub is_active: bool,
}

impl From<TestDefinition> for TestDefinitionDto {
    fn from(definition: TestDefinition) -> Self {
        TestDefinitionDto {
            mandatory_questions_count: definition.mandatory_questions_count(),
            optional_questions_count: definition.optional_questions_count(),
            id: definition.id,
            version: definition.version,
            description: definition.description,
            duration_minutes: definition.duration_minutes,
            total_questions: definition.total_questions,
            is_active: definition.is_active,
        }
    }
}

/// A question as shown to a participant: localized, correct answer withheld.
#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct QuestionForTaking {
    pub id: String,
    pub code: String,
    pub position: i32,
    pub statement: String,
    pub image_url: Option<String>,
    pub is_mandatory: bool,
    pub points: i32,
}

impl QuestionForTaking {
    pub fn new(question: &Question, position: usize, is_mandatory: bool, language: Language) -> Self {
        QuestionForTaking {
            id: question.id.clone(),
            code: question.code.clone(),
            position: position as i32,
            statement: question.statement_for(language).to_string(),
            image_url: question.image_url.clone(),
            is_mandatory,
            points: question.points,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TestForTaking {
    pub version: i32,
    pub description: String,
    pub duration_minutes: i32,
    pub language: Language,
    pub questions: Vec<QuestionForTaking>,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct AttemptStarted {
    pub attempt_id: String,
    pub status: AttemptStatus,
    pub test_version: i32,
    pub language: Language,
    pub started_at: DateTime<Utc>,
}

impl From<Attempt> for AttemptStarted {
    fn from(attempt: Attempt) -> Self {
        AttemptStarted {
            attempt_id: attempt.id,
            status: attempt.status,
            test_version: attempt.test_version,
            language: attempt.language,
            started_at: attempt.started_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct AttemptSummary {
    pub attempt_id: String,
    pub test_version: i32,
    pub language: Language,
    pub status: AttemptStatus,
    pub passed: bool,
    pub overall_score_percentage: f64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Attempt> for AttemptSummary {
    fn from(attempt: Attempt) -> Self {
        AttemptSummary {
            attempt_id: attempt.id,
            test_version: attempt.test_version,
            language: attempt.language,
            status: attempt.status,
            passed: attempt.passed,
            overall_score_percentage: attempt.overall.percentage,
            started_at: attempt.started_at,
            completed_at: attempt.completed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, SimpleObject)]
pub struct Statistics {
    pub test_version: Option<i32>,
    pub count: i64,
    pub pass_rate: f64,
    pub average_score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CertificateDto {
    pub certificate_number: String,
    pub attempt_id: String,
    pub participant_name: String,
    pub national_id_number: String,
    pub test_version: i32,
    pub score: i32,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_expired: bool,
    pub days_until_expiry: i64,
}

impl CertificateDto {
    pub fn new(certificate: Certificate, now: DateTime<Utc>) -> Self {
        CertificateDto {
            is_expired: certificate.is_expired(now),
            days_until_expiry: certificate.days_until_expiry(now),
            certificate_number: certificate.certificate_number,
            attempt_id: certificate.attempt_id,
            participant_name: certificate.participant_name,
            national_id_number: certificate.national_id_number,
            test_version: certificate.test_version,
            score: certificate.score,
            issued_at: certificate.issued_at,
            expires_at: certificate.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
