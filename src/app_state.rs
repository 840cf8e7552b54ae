use std::sync::Arc;

use crate::{
    auth::JwtService,
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::Repositories,
    services::{
        AttemptService, CertificateService, ParticipantService, QuestionBankService,
        ResultsService, TestDefinitionService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt_service: Arc<JwtService>,
    pub question_bank_service: Arc<QuestionBankService>,
    pub test_definition_service: Arc<TestDefinitionService>,
    pub attempt_service: Arc<AttemptService>,
    pub results_service: Arc<ResultsService>,
    pub certificate_service: Arc<CertificateService>,
    pub participant_service: Arc<ParticipantService>,
}

impl AppState {
    pub async fn new(config: Config, db: &Database) -> AppResult<Self> {
        let repositories = Repositories::mongo(db).await?;
        Ok(Self::with_repositories(config, repositories))
    }

    /// Wires every service from an existing repository bundle, e.g. the
    /// in-memory one used by integration tests.
    pub fn with_repositories(config: Config, repositories: Repositories) -> Self {
        let jwt_service = Arc::new(JwtService::new(
            &config.jwt_secret,
            config.jwt_expiration_hours,
        ));

        let question_bank_service =
            Arc::new(QuestionBankService::new(repositories.questions.clone()));

        let test_definition_service = Arc::new(TestDefinitionService::new(
            repositories.test_definitions.clone(),
            repositories.questions.clone(),
            repositories.attempts.clone(),
        ));

        let attempt_service = Arc::new(AttemptService::new(
            repositories.attempts.clone(),
            repositories.test_definitions.clone(),
            repositories.questions.clone(),
        ));

        let results_service = Arc::new(ResultsService::new(repositories.attempts.clone()));

        let certificate_service = Arc::new(CertificateService::new(
            repositories.certificates.clone(),
            repositories.attempts.clone(),
            repositories.participants.clone(),
            config.certificate_validity_days,
        ));

        let participant_service = Arc::new(ParticipantService::new(repositories.participants));

        Self {
            config: Arc::new(config),
            jwt_service,
            question_bank_service,
            test_definition_service,
            attempt_service,
            results_service,
            certificate_service,
            participant_service,
        }
    }
}
