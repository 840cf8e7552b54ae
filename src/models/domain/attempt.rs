use std::collections::BTreeMap;

use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::{Answer, Language, TestDefinition};

/// Question id to submitted answer. A `null` answer is kept so that an
/// explicitly skipped question is distinguishable from an unseen one.
pub type AnswerSheet = BTreeMap<String, Option<Answer>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Passed,
    Failed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Passed => "passed",
            AttemptStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptStatus::InProgress)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct CategoryScore {
    pub correct: i32,
    pub wrong: i32,
    pub total: i32,
    pub percentage: f64,
}

impl CategoryScore {
    pub fn zeroed(total: i32) -> Self {
        CategoryScore {
            correct: 0,
            wrong: 0,
            total,
            percentage: 0.0,
        }
    }

    /// Unanswered questions count as wrong. A zero total yields 0%.
    pub fn from_tally(correct: i32, total: i32) -> Self {
        CategoryScore {
            correct,
            wrong: (total - correct).max(0),
            total,
            percentage: percentage(correct, total),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct ScoreResult {
    pub passed: bool,
    pub mandatory: CategoryScore,
    pub optional: CategoryScore,
    pub overall: CategoryScore,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Attempt {
    pub id: String,
    pub participant_id: String,
    pub test_definition_id: String,
    pub test_version: i32,
    pub language: Language,
    pub status: AttemptStatus,
    #[serde(default)]
    pub answers: AnswerSheet,
    pub mandatory: CategoryScore,
    pub optional: CategoryScore,
    pub overall: CategoryScore,
    pub passed: bool,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_taken_seconds: Option<i64>,
}

impl Attempt {
    /// Fresh in-progress attempt with totals copied from the definition.
    pub fn start(participant_id: &str, definition: &TestDefinition, language: Language) -> Self {
        let mandatory_total = definition.mandatory_questions_count();
        let optional_total = definition.optional_questions_count();

        Attempt {
            id: Uuid::new_v4().to_string(),
            participant_id: participant_id.to_string(),
            test_definition_id: definition.id.clone(),
            test_version: definition.version,
            language,
            status: AttemptStatus::InProgress,
            answers: AnswerSheet::new(),
            mandatory: CategoryScore::zeroed(mandatory_total),
            optional: CategoryScore::zeroed(optional_total),
            overall: CategoryScore::zeroed(mandatory_total + optional_total),
            passed: false,
            started_at: Utc::now(),
            completed_at: None,
            time_taken_seconds: None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == AttemptStatus::InProgress
    }

    /// Overlays `incoming` on the recorded answers; later values win.
    pub fn merged_answers(&self, incoming: Option<AnswerSheet>) -> AnswerSheet {
        let mut merged = self.answers.clone();
        if let Some(incoming) = incoming {
            merged.extend(incoming);
        }
        merged
    }

    /// Returns the terminal copy of this attempt. The caller is
    /// responsible for persisting it only if the stored one is still in
    /// progress.
    pub fn completed(
        &self,
        answers: AnswerSheet,
        score: ScoreResult,
        completed_at: DateTime<Utc>,
        time_taken_seconds: Option<i64>,
    ) -> Self {
        let time_taken_seconds = time_taken_seconds
            .unwrap_or_else(|| (completed_at - self.started_at).num_seconds())
            .max(0);

        Attempt {
            status: if score.passed {
                AttemptStatus::Passed
            } else {
                AttemptStatus::Failed
            },
            answers,
            mandatory: score.mandatory,
            optional: score.optional,
            overall: score.overall,
            passed: score.passed,
            completed_at: Some(completed_at),
            time_taken_seconds: Some(time_taken_seconds),
            ..self.clone()
        }
    }

    pub fn score(&self) -> ScoreResult {
        ScoreResult {
            passed: self.passed,
            mandatory: self.mandatory,
            optional: self.optional,
            overall: self.overall,
        }
    }
}

pub fn percentage(correct: i32, total: i32) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    round_2(100.0 * f64::from(correct) / f64::from(total))
}

pub fn round_2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
