pub mod attempt_repository;
pub mod certificate_repository;
pub mod participant_repository;
pub mod question_repository;
pub mod test_definition_repository;

use std::sync::Arc;

use crate::{db::Database, errors::AppResult};

pub use attempt_repository::{AttemptRepository, CompletedTally, MongoAttemptRepository};
pub use certificate_repository::{CertificateRepository, MongoCertificateRepository};
pub use participant_repository::{MongoParticipantRepository, ParticipantRepository};
pub use question_repository::{MongoQuestionRepository, QuestionRepository};
pub use test_definition_repository::{MongoTestDefinitionRepository, TestDefinitionRepository};

/// One handle per aggregate. Services receive the subset they need.
#[derive(Clone)]
pub struct Repositories {
    pub questions: Arc<dyn QuestionRepository>,
    pub test_definitions: Arc<dyn TestDefinitionRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub participants: Arc<dyn ParticipantRepository>,
    pub certificates: Arc<dyn CertificateRepository>,
}

impl Repositories {
    /// Builds the MongoDB-backed repositories and makes sure their indexes
    /// exist.
    pub async fn mongo(db: &Database) -> AppResult<Self> {
        let questions = MongoQuestionRepository::new(db);
        questions.ensure_indexes().await?;

        let test_definitions = MongoTestDefinitionRepository::new(db);
        test_definitions.ensure_indexes().await?;

        let attempts = MongoAttemptRepository::new(db);
        attempts.ensure_indexes().await?;

        let participants = MongoParticipantRepository::new(db);
        participants.ensure_indexes().await?;

        let certificates = MongoCertificateRepository::new(db);
        certificates.ensure_indexes().await?;

        log::info!("MongoDB indexes are in place for '{}'", db.db_name());

        Ok(Self {
            questions: Arc::new(questions),
            test_definitions: Arc::new(test_definitions),
            attempts: Arc::new(attempts),
            participants: Arc::new(participants),
            certificates: Arc::new(certificates),
        })
    }
}
