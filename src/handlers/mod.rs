pub mod attempt_handler;
pub mod auth_handler;
pub mod certificate_handler;
pub mod graphql_handler;
pub mod health_handler;
pub mod participant_handler;
pub mod question_handler;
pub mod test_definition_handler;

use actix_web::web;

/// Registers every REST route and the GraphQL endpoint.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_handler::health_check)
        .service(health_handler::health_check_live)
        .service(health_handler::health_check_ready)
        .service(auth_handler::login)
        .service(auth_handler::staff_login)
        .service(question_handler::list_questions)
        .service(question_handler::create_question)
        .service(question_handler::get_question)
        .service(question_handler::update_question)
        .service(question_handler::deactivate_question)
        .service(test_definition_handler::list_test_definitions)
        .service(test_definition_handler::create_test_definition)
        .service(test_definition_handler::questions_for_taking)
        .service(test_definition_handler::add_question)
        .service(test_definition_handler::set_mandatory_questions)
        .service(test_definition_handler::reorder_questions)
        .service(test_definition_handler::set_active)
        .service(test_definition_handler::delete_test_definition)
        .service(attempt_handler::start_attempt)
        .service(attempt_handler::record_answer)
        .service(attempt_handler::finish_attempt)
        .service(attempt_handler::get_attempt)
        .service(attempt_handler::my_attempts)
        .service(participant_handler::participant_history)
        .service(participant_handler::import_participants)
        .service(participant_handler::import_participants_csv)
        .service(participant_handler::create_staff)
        .service(participant_handler::statistics)
        .service(certificate_handler::generate_certificate)
        .service(certificate_handler::search_certificates)
        .service(certificate_handler::search_certificates_by_name)
        .service(certificate_handler::my_certificates)
        .service(graphql_handler::graphql);
}
