use std::collections::HashMap;

use crate::models::domain::{
    AnswerSheet, Attempt, CategoryScore, Question, ScoreResult, TestDefinition,
};

/// Pure scoring over an answer sheet. No I/O, no clock.
pub struct ScoringEngine;

impl ScoringEngine {
    /// Category totals come from the attempt (copied from the definition
    /// at start); mandatory membership comes from the definition.
    ///
    /// Answers are only counted when the question id belongs to the test's
    /// order and resolves to an active question in `bank`. Anything else is
    /// excluded from both tallies rather than penalized.
    pub fn score(
        attempt: &Attempt,
        definition: &TestDefinition,
        bank: &[Question],
        answers: &AnswerSheet,
    ) -> ScoreResult {
        let by_id: HashMap<&str, &Question> = bank
            .iter()
            .filter(|q| q.is_active)
            .map(|q| (q.id.as_str(), q))
            .collect();

        let mut mandatory_correct = 0;
        let mut optional_correct = 0;

        for (question_id, answer) in answers {
            if !definition.contains(question_id) {
                log::debug!(
                    "Attempt {}: ignoring answer for '{}', not part of test v{}",
                    attempt.id,
                    question_id,
                    definition.version
                );
                continue;
            }

            let Some(question) = by_id.get(question_id.as_str()) else {
                log::warn!(
                    "Attempt {}: question '{}' no longer resolves, excluded from scoring",
                    attempt.id,
                    question_id
                );
                continue;
            };

            if !question.check_answer(answer.as_ref()) {
                continue;
            }

            if definition.is_mandatory(question_id) {
                mandatory_correct += 1;
            } else {
                optional_correct += 1;
            }
        }

        let mandatory_total = attempt.mandatory.total;
        let optional_total = attempt.optional.total;
        // The mandatory set may have changed while the attempt was open.
        let mandatory_correct = mandatory_correct.min(mandatory_total);
        let optional_correct = optional_correct.min(optional_total);

        let mandatory = CategoryScore::from_tally(mandatory_correct, mandatory_total);
        let optional = CategoryScore::from_tally(optional_correct, optional_total);
        let overall = CategoryScore::from_tally(
            mandatory_correct + optional_correct,
            mandatory_total + optional_total,
        );

        ScoreResult {
            passed: mandatory.correct == mandatory.total,
            mandatory,
            optional,
            overall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{Answer, Language, LocalizedText};

    fn question(id: &str, correct_answer: bool) -> Question {
        let mut q = Question::new(
            &id.to_uppercase(),
            LocalizedText {
                fr: format!("Énoncé {}", id),
                en: None,
                ar: None,
            },
            correct_answer,
            1,
        );
        q.id = id.to_string();
        q
    }

    /// Q1 true, Q2 false, Q3 true are mandatory; Q4 true, Q5 false optional.
    fn fixture() -> (TestDefinition, Vec<Question>, Attempt) {
        let definition = TestDefinition::new(
            1,
            "Induction v1",
            10,
            ["q1", "q2", "q3", "q4", "q5"].iter().map(|s| s.to_string()).collect(),
            ["q1", "q2", "q3"].iter().map(|s| s.to_string()).collect(),
            None,
        )
        .expect("definition should be valid");

        let bank = vec![
            question("q1", true),
            question("q2", false),
            question("q3", true),
            question("q4", true),
            question("q5", false),
        ];

        let attempt = Attempt::start("participant-1", &definition, Language::Fr);
        (definition, bank, attempt)
    }

    fn sheet(entries: &[(&str, Option<Answer>)]) -> AnswerSheet {
        entries
            .iter()
            .map(|(id, answer)| (id.to_string(), answer.clone()))
            .collect()
    }

    #[test]
    fn all_mandatory_correct_passes_despite_wrong_optionals() {
        let (definition, bank, attempt) = fixture();
        let answers = sheet(&[
            ("q1", Some(Answer::Bool(true))),
            ("q2", Some(Answer::Bool(false))),
            ("q3", Some(Answer::Bool(true))),
            ("q4", Some(Answer::Bool(false))),
            ("q5", Some(Answer::Bool(true))),
        ]);

        let score = ScoringEngine::score(&attempt, &definition, &bank, &answers);

        assert!(score.passed);
        assert_eq!(score.mandatory.correct, 3);
        assert_eq!(score.mandatory.total, 3);
        assert_eq!(score.optional.correct, 0);
        assert_eq!(score.optional.total, 2);
        assert_eq!(score.optional.wrong, 2);
        assert_eq!(score.overall.percentage, 60.0);
    }

    #[test]
    fn one_wrong_mandatory_fails_even_with_perfect_optionals() {
        let (definition, bank, attempt) = fixture();
        let answers = sheet(&[
            ("q1", Some(Answer::from("faux"))),
            ("q2", Some(Answer::from("non"))),
            ("q3", Some(Answer::IntFlag(1))),
            ("q4", Some(Answer::from("TRUE"))),
            ("q5", Some(Answer::IntFlag(0))),
        ]);

        let score = ScoringEngine::score(&attempt, &definition, &bank, &answers);

        assert!(!score.passed);
        assert_eq!(score.mandatory.correct, 2);
        assert_eq!(score.mandatory.wrong, 1);
        assert_eq!(score.optional.correct, 2);
        assert_eq!(score.overall.percentage, 80.0);
    }

    #[test]
    fn deleted_question_is_excluded_without_error() {
        let (definition, mut bank, attempt) = fixture();
        bank.retain(|q| q.id != "q4");
        let answers = sheet(&[
            ("q1", Some(Answer::Bool(true))),
            ("q2", Some(Answer::Bool(false))),
            ("q3", Some(Answer::Bool(true))),
            ("q4", Some(Answer::Bool(true))),
            ("q5", Some(Answer::Bool(false))),
        ]);

        let score = ScoringEngine::score(&attempt, &definition, &bank, &answers);

        assert!(score.passed);
        assert_eq!(score.optional.correct, 1);
        assert_eq!(score.optional.total, 2);
        assert_eq!(score.overall.total, 5);
    }

    #[test]
    fn answers_outside_the_test_are_ignored() {
        let (definition, mut bank, attempt) = fixture();
        bank.push(question("stray", true));
        let answers = sheet(&[("stray", Some(Answer::Bool(true)))]);

        let score = ScoringEngine::score(&attempt, &definition, &bank, &answers);

        assert_eq!(score.overall.correct, 0);
        assert!(!score.passed);
    }

    #[test]
    fn unanswered_and_malformed_count_as_wrong() {
        let (definition, bank, attempt) = fixture();
        let answers = sheet(&[
            ("q1", Some(Answer::Bool(true))),
            ("q2", None),
            ("q3", Some(Answer::from("peut-être"))),
        ]);

        let score = ScoringEngine::score(&attempt, &definition, &bank, &answers);

        assert!(!score.passed);
        assert_eq!(score.mandatory.correct, 1);
        assert_eq!(score.mandatory.wrong, 2);
        assert_eq!(score.optional.wrong, 2);
        assert_eq!(score.mandatory.percentage, 33.33);
    }

    #[test]
    fn empty_test_scores_zero_without_dividing_by_zero() {
        let (mut definition, bank, mut attempt) = fixture();
        definition.mandatory_question_ids.clear();
        attempt.mandatory = CategoryScore::zeroed(0);
        attempt.optional = CategoryScore::zeroed(0);

        let score = ScoringEngine::score(&attempt, &definition, &bank, &AnswerSheet::new());

        assert_eq!(score.overall.percentage, 0.0);
        assert_eq!(score.mandatory.percentage, 0.0);
        assert!(score.passed);
    }

    #[test]
    fn passed_iff_all_mandatory_correct() {
        let (definition, bank, attempt) = fixture();
        let mandatory = ["q1", "q2", "q3"];
        let correct = [true, false, true];

        for mask in 0u8..8 {
            let answers: AnswerSheet = mandatory
                .iter()
                .zip(correct)
                .enumerate()
                .map(|(i, (id, expected))| {
                    let right = mask & (1 << i) != 0;
                    let given = if right { expected } else { !expected };
                    (id.to_string(), Some(Answer::Bool(given)))
                })
                .collect();

            let score = ScoringEngine::score(&attempt, &definition, &bank, &answers);
            assert_eq!(score.passed, score.mandatory.correct == score.mandatory.total);
            assert_eq!(score.passed, mask == 0b111);
        }
    }
}
