use actix_web::{post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{
        request::{LoginRequest, StaffLoginRequest},
        response::LoginResponse,
    },
};

/// Participants identify with their national id only.
#[post("/api/auth/login")]
async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let participant = state
        .participant_service
        .authenticate_participant(&request.national_id_number)
        .await?;
    let token = state.jwt_service.create_token(&participant)?;

    log::info!("Participant {} signed in", participant.id);

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        participant: participant.into(),
    }))
}

#[post("/api/auth/staff-login")]
async fn staff_login(
    state: web::Data<AppState>,
    request: web::Json<StaffLoginRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let staff = state
        .participant_service
        .authenticate_staff(&request.username, &request.access_code)
        .await?;
    let token = state.jwt_service.create_token(&staff)?;

    log::info!("Staff member {} signed in", staff.id);

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        participant: staff.into(),
    }))
}
