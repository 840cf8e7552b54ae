pub mod attempt;
pub mod certificate;
pub mod participant;
pub mod question;
pub mod test_definition;

pub use attempt::{AnswerSheet, Attempt, AttemptStatus, CategoryScore, ScoreResult};
pub use certificate::Certificate;
pub use participant::{normalize_national_id, Participant, ParticipantRole};
pub use question::{Answer, Language, LocalizedText, Question};
pub use test_definition::TestDefinition;
