mod common;

use chrono::{Duration, Utc};

use common::TestStore;
use hse_induction_server::{
    errors::AppError,
    models::domain::{
        Answer, AnswerSheet, Attempt, CategoryScore, Certificate, Language, Participant,
        ScoreResult,
    },
    repositories::{
        AttemptRepository, CertificateRepository, CompletedTally, ParticipantRepository,
        QuestionRepository, TestDefinitionRepository,
    },
};

fn failed_score(mandatory_total: i32, optional_total: i32) -> ScoreResult {
    ScoreResult {
        passed: false,
        mandatory: CategoryScore::from_tally(0, mandatory_total),
        optional: CategoryScore::from_tally(0, optional_total),
        overall: CategoryScore::from_tally(0, mandatory_total + optional_total),
    }
}

#[tokio::test]
async fn attempt_repository_enforces_single_open_attempt_and_cas() {
    let store = TestStore::default();
    let definition = store.seed_definition(1, 3, 1).await;

    let first = Attempt::start("p1", &definition, Language::Fr);
    store.attempts.create(first.clone()).await.unwrap();

    let duplicate = store
        .attempts
        .create(Attempt::start("p1", &definition, Language::En))
        .await;
    assert!(matches!(duplicate, Err(AppError::AlreadyExists(_))));

    let other_participant = store
        .attempts
        .create(Attempt::start("p2", &definition, Language::Fr))
        .await;
    assert!(other_participant.is_ok());

    let recorded = store
        .attempts
        .record_answer(&first.id, "v1q1", &Answer::Bool(true))
        .await
        .unwrap()
        .expect("open attempt accepts answers");
    assert_eq!(recorded.answers.get("v1q1"), Some(&Some(Answer::Bool(true))));

    let done = first.completed(AnswerSheet::new(), failed_score(1, 2), Utc::now(), Some(5));
    assert!(store.attempts.complete(&done).await.unwrap().is_some());
    assert!(store.attempts.complete(&done).await.unwrap().is_none());
    assert!(store
        .attempts
        .record_answer(&first.id, "v1q2", &Answer::Bool(true))
        .await
        .unwrap()
        .is_none());

    // A terminal attempt frees the slot.
    let retry = store
        .attempts
        .create(Attempt::start("p1", &definition, Language::Fr))
        .await;
    assert!(retry.is_ok());

    assert_eq!(
        store
            .attempts
            .count_completed_for_definition(&definition.id)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        store
            .attempts
            .delete_in_progress_for_definition(&definition.id)
            .await
            .unwrap(),
        2
    );
    assert_eq!(store.attempts.tally_completed(Some(1)).await.unwrap().count, 1);
    assert_eq!(
        store.attempts.tally_completed(Some(2)).await.unwrap(),
        CompletedTally::default()
    );
}

#[tokio::test]
async fn question_and_definition_repositories_reject_duplicates() {
    let store = TestStore::default();
    let definition = store.seed_definition(1, 2, 1).await;

    let mut clone = definition.clone();
    clone.id = "another-id".to_string();
    let duplicate_version = store.definitions.create(clone).await;
    assert!(matches!(duplicate_version, Err(AppError::AlreadyExists(_))));

    let question = store.questions.find_by_id("v1q1").await.unwrap().unwrap();
    let mut same_code = question.clone();
    same_code.id = "fresh".to_string();
    assert!(matches!(
        store.questions.create(same_code).await,
        Err(AppError::AlreadyExists(_))
    ));

    let found = store
        .questions
        .find_by_ids(&["v1q2".to_string(), "missing".to_string()])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    let mut inactive = question;
    inactive.is_active = false;
    store.questions.update(inactive).await.unwrap();
    assert_eq!(store.questions.list(false).await.unwrap().len(), 1);
    assert_eq!(store.questions.list(true).await.unwrap().len(), 2);

    assert!(matches!(
        store.definitions.delete("nope").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn participant_repository_keys_on_national_id_and_username() {
    let store = TestStore::default();
    let amina = store.seed_participant("AB12345", "Amina Benali").await;

    let same_id = store
        .participants
        .create(Participant::new("ab12345", "Someone Else"))
        .await;
    assert!(matches!(same_id, Err(AppError::AlreadyExists(_))));

    store
        .participants
        .create(Participant::new_staff("ST0001", "Manager", "Manager", "hash".into()))
        .await
        .unwrap();
    let same_username = store
        .participants
        .create(Participant::new_staff("ST0002", "Deputy", "manager", "hash".into()))
        .await;
    assert!(matches!(same_username, Err(AppError::AlreadyExists(_))));

    assert!(store
        .participants
        .find_by_username("manager")
        .await
        .unwrap()
        .is_some());
    assert_eq!(
        store
            .participants
            .find_by_national_id("AB12345")
            .await
            .unwrap()
            .map(|p| p.id),
        Some(amina.id)
    );
}

#[tokio::test]
async fn certificate_repository_is_unique_per_attempt_and_sorted() {
    let store = TestStore::default();
    let definition = store.seed_definition(1, 1, 1).await;
    let participant = store.seed_participant("AB12345", "Amina Benali").await;
    let now = Utc::now();

    for days_ago in [30, 1, 10, 20, 5, 15] {
        let attempt = Attempt::start(&participant.id, &definition, Language::Fr);
        let certificate =
            Certificate::issue(&attempt, &participant, now - Duration::days(days_ago), 365);
        store.certificates.create(certificate).await.unwrap();
    }

    let latest = store
        .certificates
        .find_by_national_id("AB12345", 5)
        .await
        .unwrap();
    assert_eq!(latest.len(), 5);
    assert!(latest.windows(2).all(|w| w[0].issued_at >= w[1].issued_at));
    assert_eq!((now - latest[0].issued_at).num_days(), 1);

    let mut same_attempt = Attempt::start(&participant.id, &definition, Language::Fr);
    same_attempt.id = latest[0].attempt_id.clone();
    let again = Certificate::issue(&same_attempt, &participant, now, 365);
    assert!(matches!(
        store.certificates.create(again).await,
        Err(AppError::AlreadyExists(_))
    ));
}
