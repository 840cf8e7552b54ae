use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{require_owner_or_staff, require_staff, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::{CreateStaffRequest, ImportRowsRequest, PaginationParams, StatisticsParams},
        response::ParticipantDto,
    },
};

#[get("/api/participants/{id}/history")]
async fn participant_history(
    state: web::Data<AppState>,
    id: web::Path<String>,
    query: web::Query<PaginationParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_owner_or_staff(&auth.0, &id)?;
    if auth.0.sub != *id {
        state.participant_service.get_participant(&id).await?;
    }

    let history = state
        .results_service
        .history(&id, query.offset(), query.limit())
        .await?;
    Ok(HttpResponse::Ok().json(history))
}

#[post("/api/participants/import")]
async fn import_participants(
    state: web::Data<AppState>,
    request: web::Json<ImportRowsRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;
    request.validate()?;

    let report = state
        .participant_service
        .import_rows(request.into_inner().rows)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Body is the raw CSV text with a `national_id_number,full_name` header.
#[post("/api/participants/import/csv")]
async fn import_participants_csv(
    state: web::Data<AppState>,
    body: String,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;

    if body.trim().is_empty() {
        return Err(AppError::ValidationError("CSV body is empty".to_string()));
    }

    let report = state.participant_service.import_csv(&body).await?;
    Ok(HttpResponse::Ok().json(report))
}

#[post("/api/participants/staff")]
async fn create_staff(
    state: web::Data<AppState>,
    request: web::Json<CreateStaffRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;

    let staff = state
        .participant_service
        .create_staff(request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(ParticipantDto::from(staff)))
}

#[get("/api/statistics")]
async fn statistics(
    state: web::Data<AppState>,
    query: web::Query<StatisticsParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;
    query.validate()?;

    let stats = state.results_service.statistics(query.version).await?;
    Ok(HttpResponse::Ok().json(stats))
}
