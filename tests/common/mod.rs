#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::RwLock;

use hse_induction_server::{
    app_state::AppState,
    auth::Claims,
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{
        Answer, Attempt, AttemptStatus, Certificate, Language, LocalizedText, Participant,
        ParticipantRole, Question, TestDefinition,
    },
    repositories::{
        AttemptRepository, CertificateRepository, CompletedTally, ParticipantRepository,
        QuestionRepository, Repositories, TestDefinitionRepository,
    },
};

pub const TEST_JWT_SECRET: &str = "integration_test_secret_key_0123456789";

pub fn test_config() -> Config {
    Config {
        mongo_conn_string: "mongodb://localhost:27017".to_string(),
        mongo_db_name: "hse-induction-it".to_string(),
        web_server_host: "127.0.0.1".to_string(),
        web_server_port: 8080,
        jwt_secret: SecretString::from(TEST_JWT_SECRET.to_string()),
        jwt_expiration_hours: 1,
        certificate_validity_days: 365,
        site_title: "HSE Induction (integration)".to_string(),
        default_language: Language::Fr,
        cors_allowed_origin: None,
        bootstrap_staff_username: None,
        bootstrap_staff_access_code: None,
    }
}

#[derive(Default)]
pub struct InMemoryQuestionRepository {
    questions: RwLock<HashMap<String, Question>>,
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn create(&self, question: Question) -> AppResult<Question> {
        let mut questions = self.questions.write().await;
        if questions
            .values()
            .any(|q| q.id == question.id || q.code == question.code)
        {
            return Err(AppError::AlreadyExists(format!(
                "Question {} already exists",
                question.code
            )));
        }
        questions.insert(question.id.clone(), question.clone());
        Ok(question)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>> {
        Ok(self.questions.read().await.get(id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Question>> {
        Ok(self
            .questions
            .read()
            .await
            .values()
            .find(|q| q.code == code)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Question>> {
        let questions = self.questions.read().await;
        Ok(ids.iter().filter_map(|id| questions.get(id).cloned()).collect())
    }

    async fn list(&self, include_inactive: bool) -> AppResult<Vec<Question>> {
        let mut items: Vec<Question> = self
            .questions
            .read()
            .await
            .values()
            .filter(|q| include_inactive || q.is_active)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(items)
    }

    async fn update(&self, question: Question) -> AppResult<Question> {
        let mut questions = self.questions.write().await;
        match questions.get_mut(&question.id) {
            Some(stored) => {
                *stored = question.clone();
                Ok(question)
            }
            None => Err(AppError::NotFound(format!("Question {} not found", question.id))),
        }
    }
}

impl InMemoryQuestionRepository {
    /// Simulates an administrator removing a question from the store.
    pub async fn remove(&self, id: &str) {
        self.questions.write().await.remove(id);
    }
}

#[derive(Default)]
pub struct InMemoryTestDefinitionRepository {
    definitions: RwLock<HashMap<String, TestDefinition>>,
}

#[async_trait]
impl TestDefinitionRepository for InMemoryTestDefinitionRepository {
    async fn create(&self, definition: TestDefinition) -> AppResult<TestDefinition> {
        let mut definitions = self.definitions.write().await;
        if definitions.values().any(|d| d.version == definition.version) {
            return Err(AppError::AlreadyExists(format!(
                "Version {} already exists",
                definition.version
            )));
        }
        definitions.insert(definition.id.clone(), definition.clone());
        Ok(definition)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<TestDefinition>> {
        Ok(self.definitions.read().await.get(id).cloned())
    }

    async fn find_by_version(&self, version: i32) -> AppResult<Option<TestDefinition>> {
        Ok(self
            .definitions
            .read()
            .await
            .values()
            .find(|d| d.version == version)
            .cloned())
    }

    async fn list(&self, include_inactive: bool) -> AppResult<Vec<TestDefinition>> {
        let mut items: Vec<TestDefinition> = self
            .definitions
            .read()
            .await
            .values()
            .filter(|d| include_inactive || d.is_active)
            .cloned()
            .collect();
        items.sort_by_key(|d| d.version);
        Ok(items)
    }

    async fn update(&self, definition: TestDefinition) -> AppResult<TestDefinition> {
        let mut definitions = self.definitions.write().await;
        match definitions.get_mut(&definition.id) {
            Some(stored) => {
                *stored = definition.clone();
                Ok(definition)
            }
            None => Err(AppError::NotFound(format!(
                "Test definition {} not found",
                definition.id
            ))),
        }
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        match self.definitions.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Test definition {} not found", id))),
        }
    }
}

/// Mirrors the Mongo semantics the services rely on: one in-progress
/// attempt per (participant, definition) and compare-and-swap completion.
#[derive(Default)]
pub struct InMemoryAttemptRepository {
    attempts: RwLock<HashMap<String, Attempt>>,
}

#[async_trait]
impl AttemptRepository for InMemoryAttemptRepository {
    async fn create(&self, attempt: Attempt) -> AppResult<Attempt> {
        let mut attempts = self.attempts.write().await;
        let open_exists = attempts.values().any(|a| {
            a.is_in_progress()
                && a.participant_id == attempt.participant_id
                && a.test_definition_id == attempt.test_definition_id
        });
        if open_exists || attempts.contains_key(&attempt.id) {
            return Err(AppError::AlreadyExists(
                "participant_definition_in_progress".to_string(),
            ));
        }
        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        Ok(self.attempts.read().await.get(id).cloned())
    }

    async fn find_in_progress(
        &self,
        participant_id: &str,
        test_definition_id: &str,
    ) -> AppResult<Option<Attempt>> {
        Ok(self
            .attempts
            .read()
            .await
            .values()
            .find(|a| {
                a.is_in_progress()
                    && a.participant_id == participant_id
                    && a.test_definition_id == test_definition_id
            })
            .cloned())
    }

    async fn record_answer(
        &self,
        id: &str,
        question_id: &str,
        answer: &Answer,
    ) -> AppResult<Option<Attempt>> {
        let mut attempts = self.attempts.write().await;
        match attempts.get_mut(id) {
            Some(stored) if stored.is_in_progress() => {
                stored
                    .answers
                    .insert(question_id.to_string(), Some(answer.clone()));
                Ok(Some(stored.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn complete(&self, attempt: &Attempt) -> AppResult<Option<Attempt>> {
        let mut attempts = self.attempts.write().await;
        match attempts.get_mut(&attempt.id) {
            Some(stored) if stored.is_in_progress() => {
                *stored = attempt.clone();
                Ok(Some(attempt.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn find_by_participant(
        &self,
        participant_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<Attempt>> {
        let mut items: Vec<Attempt> = self
            .attempts
            .read()
            .await
            .values()
            .filter(|a| a.participant_id == participant_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn tally_completed(&self, test_version: Option<i32>) -> AppResult<CompletedTally> {
        Ok(self
            .attempts
            .read()
            .await
            .values()
            .filter(|a| a.status.is_terminal())
            .filter(|a| test_version.map_or(true, |v| a.test_version == v))
            .fold(CompletedTally::default(), CompletedTally::add))
    }

    async fn count_completed_for_definition(&self, test_definition_id: &str) -> AppResult<u64> {
        Ok(self
            .attempts
            .read()
            .await
            .values()
            .filter(|a| a.status.is_terminal() && a.test_definition_id == test_definition_id)
            .count() as u64)
    }

    async fn delete_in_progress_for_definition(&self, test_definition_id: &str) -> AppResult<u64> {
        let mut attempts = self.attempts.write().await;
        let before = attempts.len();
        attempts.retain(|_, a| {
            !(a.status == AttemptStatus::InProgress && a.test_definition_id == test_definition_id)
        });
        Ok((before - attempts.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryParticipantRepository {
    participants: RwLock<HashMap<String, Participant>>,
}

#[async_trait]
impl ParticipantRepository for InMemoryParticipantRepository {
    async fn create(&self, participant: Participant) -> AppResult<Participant> {
        let mut participants = self.participants.write().await;
        let taken = participants.values().any(|p| {
            p.id == participant.id
                || p.national_id_number == participant.national_id_number
                || (participant.username.is_some() && p.username == participant.username)
        });
        if taken {
            return Err(AppError::AlreadyExists(format!(
                "Participant {} already exists",
                participant.national_id_number
            )));
        }
        participants.insert(participant.id.clone(), participant.clone());
        Ok(participant)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Participant>> {
        Ok(self.participants.read().await.get(id).cloned())
    }

    async fn find_by_national_id(&self, national_id_number: &str) -> AppResult<Option<Participant>> {
        Ok(self
            .participants
            .read()
            .await
            .values()
            .find(|p| p.national_id_number == national_id_number)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Participant>> {
        Ok(self
            .participants
            .read()
            .await
            .values()
            .find(|p| p.username.as_deref() == Some(username))
            .cloned())
    }

    async fn update(&self, participant: Participant) -> AppResult<Participant> {
        let mut participants = self.participants.write().await;
        match participants.get_mut(&participant.id) {
            Some(stored) => {
                *stored = participant.clone();
                Ok(participant)
            }
            None => Err(AppError::NotFound(format!(
                "Participant {} not found",
                participant.id
            ))),
        }
    }
}

#[derive(Default)]
pub struct InMemoryCertificateRepository {
    certificates: RwLock<HashMap<String, Certificate>>,
}

#[async_trait]
impl CertificateRepository for InMemoryCertificateRepository {
    async fn create(&self, certificate: Certificate) -> AppResult<Certificate> {
        let mut certificates = self.certificates.write().await;
        if certificates.contains_key(&certificate.attempt_id) {
            return Err(AppError::AlreadyExists(format!(
                "Attempt {} already has a certificate",
                certificate.attempt_id
            )));
        }
        certificates.insert(certificate.attempt_id.clone(), certificate.clone());
        Ok(certificate)
    }

    async fn find_by_attempt_id(&self, attempt_id: &str) -> AppResult<Option<Certificate>> {
        Ok(self.certificates.read().await.get(attempt_id).cloned())
    }

    async fn find_by_national_id(
        &self,
        national_id_number: &str,
        limit: i64,
    ) -> AppResult<Vec<Certificate>> {
        let mut items: Vec<Certificate> = self
            .certificates
            .read()
            .await
            .values()
            .filter(|c| c.national_id_number == national_id_number)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        items.truncate(limit.max(0) as usize);
        Ok(items)
    }

    async fn find_by_participant(
        &self,
        participant_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<Certificate>> {
        let mut items: Vec<Certificate> = self
            .certificates
            .read()
            .await
            .values()
            .filter(|c| c.participant_id == participant_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn search_by_name(&self, name: &str, limit: i64) -> AppResult<Vec<Certificate>> {
        let needle = name.to_lowercase();
        let mut items: Vec<Certificate> = self
            .certificates
            .read()
            .await
            .values()
            .filter(|c| c.participant_name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        items.truncate(limit.max(0) as usize);
        Ok(items)
    }
}

/// In-memory repositories with typed handles kept for direct seeding.
#[derive(Clone, Default)]
pub struct TestStore {
    pub questions: Arc<InMemoryQuestionRepository>,
    pub definitions: Arc<InMemoryTestDefinitionRepository>,
    pub attempts: Arc<InMemoryAttemptRepository>,
    pub participants: Arc<InMemoryParticipantRepository>,
    pub certificates: Arc<InMemoryCertificateRepository>,
}

impl TestStore {
    pub fn repositories(&self) -> Repositories {
        Repositories {
            questions: self.questions.clone(),
            test_definitions: self.definitions.clone(),
            attempts: self.attempts.clone(),
            participants: self.participants.clone(),
            certificates: self.certificates.clone(),
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::with_repositories(test_config(), self.repositories())
    }

    /// Stores a question whose id equals its code, to keep fixtures readable.
    pub async fn seed_question(&self, id: &str, correct_answer: bool) -> Question {
        let mut question = Question::new(
            id,
            LocalizedText {
                fr: format!("Énoncé {}", id),
                en: Some(format!("Statement {}", id)),
                ar: None,
            },
            correct_answer,
            1,
        );
        question.id = id.to_string();
        self.questions
            .create(question)
            .await
            .expect("question fixture should be stored")
    }

    /// Test v`version` with questions `q1..=q{total}`, the first
    /// `mandatory` of them mandatory. Every correct answer is `true`.
    pub async fn seed_definition(&self, version: i32, total: usize, mandatory: usize) -> TestDefinition {
        let ids: Vec<String> = (1..=total).map(|i| format!("v{}q{}", version, i)).collect();
        for id in &ids {
            self.seed_question(id, true).await;
        }
        let definition = TestDefinition::new(
            version,
            "Induction sécurité",
            10,
            ids.clone(),
            ids[..mandatory].to_vec(),
            None,
        )
        .expect("definition fixture should be valid");
        self.definitions
            .create(definition)
            .await
            .expect("definition fixture should be stored")
    }

    pub async fn seed_participant(&self, national_id: &str, name: &str) -> Participant {
        self.participants
            .create(Participant::new(national_id, name))
            .await
            .expect("participant fixture should be stored")
    }
}

pub fn claims_for(participant: &Participant) -> Claims {
    Claims {
        sub: participant.id.clone(),
        national_id_number: participant.national_id_number.clone(),
        display_name: participant.display_name.clone(),
        role: participant.role,
        iat: 0,
        exp: 9_999_999_999,
    }
}

pub fn staff_claims() -> Claims {
    Claims {
        sub: "staff-1".to_string(),
        national_id_number: "STAFF0001".to_string(),
        display_name: "Site Manager".to_string(),
        role: ParticipantRole::Staff,
        iat: 0,
        exp: 9_999_999_999,
    }
}
