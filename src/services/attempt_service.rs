use std::sync::Arc;

use chrono::Utc;

use crate::{
    auth::{require_owner, require_owner_or_staff, Claims},
    errors::{AppError, AppResult},
    models::domain::{Answer, AnswerSheet, Attempt, Language, ScoreResult, TestDefinition},
    repositories::{AttemptRepository, QuestionRepository, TestDefinitionRepository},
    services::scoring_engine::ScoringEngine,
};

/// Drives an attempt through `in_progress -> {passed, failed}`.
pub struct AttemptService {
    attempts: Arc<dyn AttemptRepository>,
    definitions: Arc<dyn TestDefinitionRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl AttemptService {
    pub fn new(
        attempts: Arc<dyn AttemptRepository>,
        definitions: Arc<dyn TestDefinitionRepository>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            attempts,
            definitions,
            questions,
        }
    }

    /// Idempotent while an attempt is open: the existing in-progress
    /// attempt is returned instead of a new one.
    pub async fn start(
        &self,
        participant_id: &str,
        test_version: i32,
        language: Language,
    ) -> AppResult<Attempt> {
        let definition = self
            .definitions
            .find_by_version(test_version)
            .await?
            .filter(|d| d.is_active)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No active test definition with version {}",
                    test_version
                ))
            })?;

        if let Some(existing) = self
            .attempts
            .find_in_progress(participant_id, &definition.id)
            .await?
        {
            log::debug!(
                "Participant {} resumed attempt {} on test v{}",
                participant_id,
                existing.id,
                test_version
            );
            return Ok(existing);
        }

        let attempt = Attempt::start(participant_id, &definition, language);
        match self.attempts.create(attempt).await {
            Ok(attempt) => {
                log::info!(
                    "Participant {} started attempt {} on test v{} ({})",
                    participant_id,
                    attempt.id,
                    test_version,
                    language
                );
                Ok(attempt)
            }
            // A concurrent start won the unique in-progress slot.
            Err(AppError::AlreadyExists(_)) => self
                .attempts
                .find_in_progress(participant_id, &definition.id)
                .await?
                .ok_or_else(|| {
                    AppError::InternalError(
                        "In-progress attempt vanished during start".to_string(),
                    )
                }),
            Err(err) => Err(err),
        }
    }

    pub async fn record_answer(
        &self,
        attempt_id: &str,
        claims: &Claims,
        question_id: &str,
        answer: Answer,
    ) -> AppResult<Attempt> {
        let attempt = self.find_attempt(attempt_id).await?;
        require_owner(claims, &attempt.participant_id)?;
        ensure_in_progress(&attempt)?;

        let definition = self.definition_for(&attempt).await?;
        if !definition.contains(question_id) {
            return Err(AppError::NotFound(format!(
                "Question '{}' is not part of test v{}",
                question_id, definition.version
            )));
        }

        if answer.as_bool().is_none() {
            return Err(AppError::ValidationError(format!(
                "Answer for question '{}' is not a true/false value",
                question_id
            )));
        }

        self.attempts
            .record_answer(attempt_id, question_id, &answer)
            .await?
            .ok_or_else(|| {
                AppError::InvalidState(format!("Attempt {} is already completed", attempt_id))
            })
    }

    /// Scores the merged answers and moves the attempt to its terminal
    /// state. Exactly one concurrent caller can win; the others get
    /// `InvalidState` and the stored scores never change afterwards.
    pub async fn finish(
        &self,
        attempt_id: &str,
        claims: &Claims,
        answers: Option<AnswerSheet>,
        elapsed_seconds: Option<i64>,
    ) -> AppResult<ScoreResult> {
        if elapsed_seconds.is_some_and(|s| s < 0) {
            return Err(AppError::ValidationError(
                "Elapsed time cannot be negative".to_string(),
            ));
        }

        let attempt = self.find_attempt(attempt_id).await?;
        require_owner(claims, &attempt.participant_id)?;
        ensure_in_progress(&attempt)?;

        let definition = self.definition_for(&attempt).await?;
        let bank = self.questions.find_by_ids(&definition.question_order).await?;

        let merged = attempt.merged_answers(answers);
        let score = ScoringEngine::score(&attempt, &definition, &bank, &merged);
        let completed = attempt.completed(merged, score, Utc::now(), elapsed_seconds);

        match self.attempts.complete(&completed).await? {
            Some(stored) => {
                log::info!(
                    "Attempt {} finished: {} (mandatory {}/{}, overall {}%)",
                    stored.id,
                    stored.status.as_str(),
                    score.mandatory.correct,
                    score.mandatory.total,
                    score.overall.percentage
                );
                Ok(stored.score())
            }
            None => {
                log::warn!("Attempt {} was finished concurrently", attempt_id);
                Err(AppError::InvalidState(format!(
                    "Attempt {} is already completed",
                    attempt_id
                )))
            }
        }
    }

    pub async fn get_attempt(&self, attempt_id: &str, claims: &Claims) -> AppResult<Attempt> {
        let attempt = self.find_attempt(attempt_id).await?;
        require_owner_or_staff(claims, &attempt.participant_id)?;
        Ok(attempt)
    }

    async fn find_attempt(&self, attempt_id: &str) -> AppResult<Attempt> {
        self.attempts
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attempt {} not found", attempt_id)))
    }

    async fn definition_for(&self, attempt: &Attempt) -> AppResult<TestDefinition> {
        self.definitions
            .find_by_id(&attempt.test_definition_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Test definition v{} for attempt {} no longer exists",
                    attempt.test_version, attempt.id
                ))
            })
    }
}

fn ensure_in_progress(attempt: &Attempt) -> AppResult<()> {
    if !attempt.is_in_progress() {
        return Err(AppError::InvalidState(format!(
            "Attempt {} is already {}",
            attempt.id,
            attempt.status.as_str()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::domain::{LocalizedText, ParticipantRole, Question},
        repositories::{
            attempt_repository::MockAttemptRepository, question_repository::MockQuestionRepository,
            test_definition_repository::MockTestDefinitionRepository,
        },
    };

    fn definition() -> TestDefinition {
        TestDefinition::new(
            1,
            "Induction",
            10,
            vec!["q1".to_string(), "q2".to_string()],
            vec!["q1".to_string()],
            None,
        )
        .expect("definition should be valid")
    }

    fn question(id: &str, correct: bool) -> Question {
        let mut q = Question::new(
            id,
            LocalizedText {
                fr: id.to_string(),
                en: None,
                ar: None,
            },
            correct,
            1,
        );
        q.id = id.to_string();
        q
    }

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            national_id_number: "AB12345".to_string(),
            display_name: "Amina".to_string(),
            role: ParticipantRole::Participant,
            iat: 0,
            exp: 9999999999,
        }
    }

    #[actix_web::test]
    async fn finish_reports_invalid_state_when_race_is_lost() {
        let def = definition();
        let attempt = Attempt::start("p1", &def, Language::Fr);
        let attempt_id = attempt.id.clone();

        let mut attempts = MockAttemptRepository::new();
        let stored = attempt.clone();
        attempts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        attempts.expect_complete().times(1).returning(|_| Ok(None));

        let mut definitions = MockTestDefinitionRepository::new();
        definitions
            .expect_find_by_id()
            .returning(move |_| Ok(Some(def.clone())));

        let mut questions = MockQuestionRepository::new();
        questions
            .expect_find_by_ids()
            .returning(|_| Ok(vec![question("q1", true), question("q2", false)]));

        let service = AttemptService::new(
            Arc::new(attempts),
            Arc::new(definitions),
            Arc::new(questions),
        );

        let result = service.finish(&attempt_id, &claims("p1"), None, None).await;
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[actix_web::test]
    async fn start_recovers_from_concurrent_insert() {
        let def = definition();
        let winner = Attempt::start("p1", &def, Language::Ar);
        let winner_id = winner.id.clone();

        let mut definitions = MockTestDefinitionRepository::new();
        let stored_def = def.clone();
        definitions
            .expect_find_by_version()
            .returning(move |_| Ok(Some(stored_def.clone())));

        let mut attempts = MockAttemptRepository::new();
        let mut lookups = 0;
        attempts.expect_find_in_progress().returning(move |_, _| {
            lookups += 1;
            if lookups == 1 {
                Ok(None)
            } else {
                Ok(Some(winner.clone()))
            }
        });
        attempts
            .expect_create()
            .returning(|_| Err(AppError::AlreadyExists("duplicate key".to_string())));

        let service = AttemptService::new(
            Arc::new(attempts),
            Arc::new(definitions),
            Arc::new(MockQuestionRepository::new()),
        );

        let attempt = service.start("p1", 1, Language::Ar).await.unwrap();
        assert_eq!(attempt.id, winner_id);
    }

    #[actix_web::test]
    async fn record_answer_rejects_non_boolean_tokens() {
        let def = definition();
        let attempt = Attempt::start("p1", &def, Language::Fr);
        let attempt_id = attempt.id.clone();

        let mut attempts = MockAttemptRepository::new();
        attempts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(attempt.clone())));
        attempts.expect_record_answer().never();

        let mut definitions = MockTestDefinitionRepository::new();
        definitions
            .expect_find_by_id()
            .returning(move |_| Ok(Some(def.clone())));

        let service = AttemptService::new(
            Arc::new(attempts),
            Arc::new(definitions),
            Arc::new(MockQuestionRepository::new()),
        );

        let result = service
            .record_answer(&attempt_id, &claims("p1"), "q1", Answer::from("maybe"))
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[actix_web::test]
    async fn finish_rejects_foreign_attempt() {
        let def = definition();
        let attempt = Attempt::start("owner", &def, Language::Fr);
        let attempt_id = attempt.id.clone();

        let mut attempts = MockAttemptRepository::new();
        attempts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(attempt.clone())));
        attempts.expect_complete().never();

        let service = AttemptService::new(
            Arc::new(attempts),
            Arc::new(MockTestDefinitionRepository::new()),
            Arc::new(MockQuestionRepository::new()),
        );

        let result = service
            .finish(&attempt_id, &claims("intruder"), None, None)
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
