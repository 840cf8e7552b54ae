pub mod attempt_service;
pub mod certificate_service;
pub mod participant_service;
pub mod question_bank_service;
pub mod results_service;
pub mod scoring_engine;
pub mod test_definition_service;

pub use attempt_service::AttemptService;
pub use certificate_service::CertificateService;
pub use participant_service::ParticipantService;
pub use question_bank_service::QuestionBankService;
pub use results_service::ResultsService;
pub use scoring_engine::ScoringEngine;
pub use test_definition_service::TestDefinitionService;
