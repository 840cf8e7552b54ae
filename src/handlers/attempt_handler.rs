use actix_web::{get, patch, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        request::{FinishAttemptRequest, PaginationParams, RecordAnswerRequest, StartAttemptRequest},
        response::{AttemptStarted, AttemptSummary},
    },
};

#[post("/api/attempts/start")]
async fn start_attempt(
    state: web::Data<AppState>,
    request: web::Json<StartAttemptRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let language = request.language.unwrap_or(state.config.default_language);
    let attempt = state
        .attempt_service
        .start(&auth.0.sub, request.test_version, language)
        .await?;
    Ok(HttpResponse::Ok().json(AttemptStarted::from(attempt)))
}

#[patch("/api/attempts/{id}/answers")]
async fn record_answer(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<RecordAnswerRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let RecordAnswerRequest {
        question_id,
        answer,
    } = request.into_inner();

    let attempt = state
        .attempt_service
        .record_answer(&id, &auth.0, &question_id, answer)
        .await?;
    Ok(HttpResponse::Ok().json(attempt))
}

/// An empty body finishes with the answers recorded so far. A body that
/// does not parse is rejected and leaves the attempt in progress.
#[post("/api/attempts/{id}/finish")]
async fn finish_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Bytes,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let request = FinishAttemptRequest::from_body(&body)?;
    request.validate()?;

    let score = state
        .attempt_service
        .finish(&id, &auth.0, request.answers, request.elapsed_seconds)
        .await?;
    Ok(HttpResponse::Ok().json(score))
}

#[get("/api/attempts/{id}")]
async fn get_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state.attempt_service.get_attempt(&id, &auth.0).await?;
    Ok(HttpResponse::Ok().json(attempt))
}

/// The caller's own history, newest first.
#[get("/api/attempts")]
async fn my_attempts(
    state: web::Data<AppState>,
    query: web::Query<PaginationParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let history: Vec<AttemptSummary> = state
        .results_service
        .history(&auth.0.sub, query.offset(), query.limit())
        .await?;
    Ok(HttpResponse::Ok().json(history))
}
