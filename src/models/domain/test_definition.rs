use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::domain::Question,
};

pub const MIN_VERSION: i32 = 1;
pub const MAX_VERSION: i32 = 6;
pub const MIN_DURATION_MINUTES: i32 = 1;
pub const MAX_DURATION_MINUTES: i32 = 30;

/// A versioned questionnaire. Questions are referenced by id, in the
/// order participants see them; `mandatory_question_ids` is always a
/// subset of `question_order`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestDefinition {
    pub id: String,
    pub version: i32,
    pub description: String,
    pub duration_minutes: i32,
    pub question_order: Vec<String>,
    pub mandatory_question_ids: Vec<String>,
    pub total_questions: i32,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl TestDefinition {
    pub fn new(
        version: i32,
        description: &str,
        duration_minutes: i32,
        question_order: Vec<String>,
        mandatory_question_ids: Vec<String>,
        total_questions: Option<i32>,
    ) -> AppResult<Self> {
        let total_questions = total_questions.unwrap_or(question_order.len() as i32);
        let definition = TestDefinition {
            id: Uuid::new_v4().to_string(),
            version,
            description: description.to_string(),
            duration_minutes,
            question_order: dedup_preserving_order(question_order),
            mandatory_question_ids: dedup_preserving_order(mandatory_question_ids),
            total_questions,
            is_active: true,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        };
        definition.validate()?;
        Ok(definition)
    }

    pub fn validate(&self) -> AppResult<()> {
        if !(MIN_VERSION..=MAX_VERSION).contains(&self.version) {
            return Err(AppError::ValidationError(format!(
                "Version must be between {} and {}, got {}",
                MIN_VERSION, MAX_VERSION, self.version
            )));
        }

        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&self.duration_minutes) {
            return Err(AppError::ValidationError(format!(
                "Duration must be between {} and {} minutes",
                MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
            )));
        }

        let ordered: HashSet<&String> = self.question_order.iter().collect();
        if let Some(stray) = self
            .mandatory_question_ids
            .iter()
            .find(|id| !ordered.contains(id))
        {
            return Err(AppError::ValidationError(format!(
                "Mandatory question '{}' is not part of the question order",
                stray
            )));
        }

        if self.total_questions < 1 {
            return Err(AppError::ValidationError(
                "A test must declare at least one question".to_string(),
            ));
        }

        if self.total_questions < self.mandatory_questions_count() {
            return Err(AppError::ValidationError(format!(
                "Total question count {} is lower than the mandatory count {}",
                self.total_questions,
                self.mandatory_questions_count()
            )));
        }

        Ok(())
    }

    pub fn mandatory_questions_count(&self) -> i32 {
        self.mandatory_question_ids
            .iter()
            .collect::<HashSet<_>>()
            .len() as i32
    }

    pub fn optional_questions_count(&self) -> i32 {
        self.total_questions - self.mandatory_questions_count()
    }

    pub fn is_mandatory(&self, question_id: &str) -> bool {
        self.mandatory_question_ids.iter().any(|id| id == question_id)
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.question_order.iter().any(|id| id == question_id)
    }

    /// Resolves the declared order against the given bank slice. Ids that
    /// are missing from `bank` or point to inactive questions are skipped.
    pub fn questions_in_order<'a>(&self, bank: &'a [Question]) -> Vec<&'a Question> {
        let by_id: HashMap<&str, &Question> = bank
            .iter()
            .filter(|q| q.is_active)
            .map(|q| (q.id.as_str(), q))
            .collect();

        self.question_order
            .iter()
            .filter_map(|id| by_id.get(id.as_str()).copied())
            .collect()
    }

    pub fn mandatory_questions<'a>(&self, bank: &'a [Question]) -> Vec<&'a Question> {
        self.questions_in_order(bank)
            .into_iter()
            .filter(|q| self.is_mandatory(&q.id))
            .collect()
    }

    pub fn optional_questions<'a>(&self, bank: &'a [Question]) -> Vec<&'a Question> {
        self.questions_in_order(bank)
            .into_iter()
            .filter(|q| !self.is_mandatory(&q.id))
            .collect()
    }

    /// Appends a question id. Returns false when it was already present.
    pub fn add_question(&mut self, question_id: &str) -> bool {
        if self.contains(question_id) {
            return false;
        }
        self.question_order.push(question_id.to_string());
        self.total_questions = self.question_order.len() as i32;
        self.modified_at = Some(Utc::now());
        true
    }

    pub fn set_mandatory_questions(&mut self, question_ids: Vec<String>) -> AppResult<()> {
        let previous = std::mem::replace(
            &mut self.mandatory_question_ids,
            dedup_preserving_order(question_ids),
        );
        if let Err(err) = self.validate() {
            self.mandatory_question_ids = previous;
            return Err(err);
        }
        self.modified_at = Some(Utc::now());
        Ok(())
    }

    /// The new order must be a permutation of the current one.
    pub fn reorder(&mut self, new_order: Vec<String>) -> AppResult<()> {
        let current: HashSet<&String> = self.question_order.iter().collect();
        let proposed: HashSet<&String> = new_order.iter().collect();

        if new_order.len() != self.question_order.len() || current != proposed {
            return Err(AppError::ValidationError(
                "New order must contain exactly the questions already in the test".to_string(),
            ));
        }

        self.question_order = new_order;
        self.modified_at = Some(Utc::now());
        Ok(())
    }
}

fn dedup_preserving_order(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
