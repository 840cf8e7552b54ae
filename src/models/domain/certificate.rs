use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::{Attempt, Participant};

const CERTIFICATE_PREFIX: &str = "HSE";

/// Snapshot issued from exactly one passed attempt. Later edits to the
/// participant or the test never rewrite an issued certificate.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Certificate {
    pub id: String,
    pub certificate_number: String,
    pub attempt_id: String,
    pub participant_id: String,
    pub participant_name: String,
    pub national_id_number: String,
    pub test_version: i32,
    pub score: i32,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Certificate {
    pub fn issue(
        attempt: &Attempt,
        participant: &Participant,
        issued_at: DateTime<Utc>,
        validity_days: i64,
    ) -> Self {
        Certificate {
            id: Uuid::new_v4().to_string(),
            certificate_number: certificate_number(issued_at),
            attempt_id: attempt.id.clone(),
            participant_id: participant.id.clone(),
            participant_name: participant.display_name.clone(),
            national_id_number: participant.national_id_number.clone(),
            test_version: attempt.test_version,
            score: attempt.overall.percentage.trunc() as i32,
            issued_at,
            expires_at: issued_at + Duration::days(validity_days),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Zero once expired.
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_days().max(0)
    }
}

fn certificate_number(issued_at: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase();

    format!(
        "{}-{}-{}",
        CERTIFICATE_PREFIX,
        issued_at.format("%Y%m%d"),
        suffix
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::domain::{
        AnswerSheet, CategoryScore, Language, ScoreResult, TestDefinition,
    };

    fn passed_attempt() -> (Attempt, Participant) {
        let definition = TestDefinition::new(
            3,
            "",
            10,
            vec!["q1".to_string(), "q2".to_string(), "q3".to_string()],
            vec!["q1".to_string()],
            None,
        )
        .expect("definition should be valid");
        let participant = Participant::new("ab12345", "Amina Benali");
        let attempt = Attempt::start(&participant.id, &definition, Language::Fr);
        let score = ScoreResult {
            passed: true,
            mandatory: CategoryScore::from_tally(1, 1),
            optional: CategoryScore::from_tally(1, 2),
            overall: CategoryScore::from_tally(2, 3),
        };
        let done = attempt.completed(AnswerSheet::new(), score, Utc::now(), Some(60));
        (done, participant)
    }

    #[test]
    fn issue_snapshots_attempt_and_participant() {
        let (attempt, participant) = passed_attempt();
        let issued_at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();

        let certificate = Certificate::issue(&attempt, &participant, issued_at, 365);

        assert!(certificate.certificate_number.starts_with("HSE-20260314-"));
        assert_eq!(certificate.certificate_number.len(), "HSE-20260314-".len() + 6);
        assert_eq!(certificate.national_id_number, "AB12345");
        assert_eq!(certificate.test_version, 3);
        // 66.67% is truncated
        assert_eq!(certificate.score, 66);
        assert_eq!(certificate.expires_at, issued_at + Duration::days(365));
    }

    #[test]
    fn expiry_helpers() {
        let (attempt, participant) = passed_attempt();
        let issued_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let certificate = Certificate::issue(&attempt, &participant, issued_at, 30);

        let midway = issued_at + Duration::days(10);
        assert!(!certificate.is_expired(midway));
        assert_eq!(certificate.days_until_expiry(midway), 20);

        let later = issued_at + Duration::days(31);
        assert!(certificate.is_expired(later));
        assert_eq!(certificate.days_until_expiry(later), 0);
    }
}
