use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{Language, TestDefinition},
        dto::{
            request::CreateTestDefinitionRequest,
            response::{QuestionForTaking, TestForTaking},
        },
    },
    repositories::{AttemptRepository, QuestionRepository, TestDefinitionRepository},
};

pub struct TestDefinitionService {
    definitions: Arc<dyn TestDefinitionRepository>,
    questions: Arc<dyn QuestionRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl TestDefinitionService {
    pub fn new(
        definitions: Arc<dyn TestDefinitionRepository>,
        questions: Arc<dyn QuestionRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            definitions,
            questions,
            attempts,
        }
    }

    pub async fn create_test_definition(
        &self,
        request: CreateTestDefinitionRequest,
    ) -> AppResult<TestDefinition> {
        request.validate()?;

        if self
            .definitions
            .find_by_version(request.version)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyExists(format!(
                "Test definition version {} already exists",
                request.version
            )));
        }

        self.ensure_questions_exist(&request.question_order).await?;

        let definition = TestDefinition::new(
            request.version,
            request.description.trim(),
            request.duration_minutes,
            request.question_order,
            request.mandatory_question_ids,
            request.total_questions,
        )?;

        let definition = self.definitions.create(definition).await?;
        log::info!(
            "Test definition v{} created with {} questions ({} mandatory)",
            definition.version,
            definition.total_questions,
            definition.mandatory_questions_count()
        );
        Ok(definition)
    }

    pub async fn get_by_version(&self, version: i32) -> AppResult<TestDefinition> {
        self.definitions
            .find_by_version(version)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Test definition version {} not found", version))
            })
    }

    pub async fn get_active_by_version(&self, version: i32) -> AppResult<TestDefinition> {
        let definition = self.get_by_version(version).await?;
        if !definition.is_active {
            return Err(AppError::NotFound(format!(
                "Test definition version {} is not active",
                version
            )));
        }
        Ok(definition)
    }

    pub async fn list(&self, include_inactive: bool) -> AppResult<Vec<TestDefinition>> {
        self.definitions.list(include_inactive).await
    }

    pub async fn add_question(&self, version: i32, question_id: &str) -> AppResult<TestDefinition> {
        let mut definition = self.get_by_version(version).await?;
        self.ensure_shape_is_mutable(&definition).await?;
        self.ensure_questions_exist(&[question_id.to_string()]).await?;

        if !definition.add_question(question_id) {
            return Ok(definition);
        }

        let definition = self.definitions.update(definition).await?;
        log::info!("Question {} appended to test v{}", question_id, version);
        Ok(definition)
    }

    pub async fn set_mandatory_questions(
        &self,
        version: i32,
        question_ids: Vec<String>,
    ) -> AppResult<TestDefinition> {
        let mut definition = self.get_by_version(version).await?;
        self.ensure_shape_is_mutable(&definition).await?;

        definition.set_mandatory_questions(question_ids)?;
        self.definitions.update(definition).await
    }

    /// Presentation order only, allowed even after attempts were completed.
    pub async fn reorder_questions(
        &self,
        version: i32,
        question_order: Vec<String>,
    ) -> AppResult<TestDefinition> {
        let mut definition = self.get_by_version(version).await?;
        definition.reorder(question_order)?;
        self.definitions.update(definition).await
    }

    pub async fn set_active(&self, version: i32, is_active: bool) -> AppResult<TestDefinition> {
        let mut definition = self.get_by_version(version).await?;
        definition.is_active = is_active;
        definition.modified_at = Some(Utc::now());

        let definition = self.definitions.update(definition).await?;
        log::info!(
            "Test definition v{} is now {}",
            version,
            if is_active { "active" } else { "inactive" }
        );
        Ok(definition)
    }

    /// Completed attempts are the audit trail for certificates, so a test
    /// that has any cannot be deleted. Open attempts are discarded with it.
    pub async fn delete_test_definition(&self, version: i32) -> AppResult<()> {
        let definition = self.get_by_version(version).await?;

        let completed = self
            .attempts
            .count_completed_for_definition(&definition.id)
            .await?;
        if completed > 0 {
            return Err(AppError::InvalidState(format!(
                "Test definition v{} has {} completed attempts and cannot be deleted",
                version, completed
            )));
        }

        let discarded = self
            .attempts
            .delete_in_progress_for_definition(&definition.id)
            .await?;
        self.definitions.delete(&definition.id).await?;

        log::warn!(
            "Test definition v{} deleted, {} open attempts discarded",
            version,
            discarded
        );
        Ok(())
    }

    pub async fn questions_for_taking(
        &self,
        version: i32,
        language: Language,
    ) -> AppResult<TestForTaking> {
        let definition = self.get_active_by_version(version).await?;
        let bank = self.questions.find_by_ids(&definition.question_order).await?;

        let questions = definition
            .questions_in_order(&bank)
            .into_iter()
            .enumerate()
            .map(|(index, question)| {
                QuestionForTaking::new(
                    question,
                    index + 1,
                    definition.is_mandatory(&question.id),
                    language,
                )
            })
            .collect();

        Ok(TestForTaking {
            version: definition.version,
            description: definition.description,
            duration_minutes: definition.duration_minutes,
            language,
            questions,
        })
    }

    async fn ensure_shape_is_mutable(&self, definition: &TestDefinition) -> AppResult<()> {
        let completed = self
            .attempts
            .count_completed_for_definition(&definition.id)
            .await?;
        if completed > 0 {
            return Err(AppError::InvalidState(format!(
                "Test definition v{} already has completed attempts",
                definition.version
            )));
        }
        Ok(())
    }

    async fn ensure_questions_exist(&self, ids: &[String]) -> AppResult<()> {
        let found: HashSet<String> = self
            .questions
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|q| q.id)
            .collect();

        let missing: Vec<&str> = ids
            .iter()
            .filter(|id| !found.contains(*id))
            .map(String::as_str)
            .collect();

        if !missing.is_empty() {
            return Err(AppError::NotFound(format!(
                "Unknown question ids: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}
