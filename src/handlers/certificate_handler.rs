use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{require_staff, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::{
            CertificateNameSearchParams, CertificateSearchParams, GenerateCertificateRequest,
            PaginationParams,
        },
        response::CertificateDto,
    },
};

#[post("/api/certificates/generate")]
async fn generate_certificate(
    state: web::Data<AppState>,
    request: web::Json<GenerateCertificateRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let certificate = state
        .certificate_service
        .generate(&request.attempt_id, &auth.0)
        .await?;
    Ok(HttpResponse::Ok().json(CertificateDto::new(certificate, Utc::now())))
}

/// Public lookup used by site security to check a worker's induction.
#[get("/api/certificates/search")]
async fn search_certificates(
    state: web::Data<AppState>,
    query: web::Query<CertificateSearchParams>,
) -> Result<HttpResponse, AppError> {
    query.validate()?;

    let now = Utc::now();
    let certificates: Vec<CertificateDto> = state
        .certificate_service
        .search_by_national_id(&query.national_id_number)
        .await?
        .into_iter()
        .map(|c| CertificateDto::new(c, now))
        .collect();
    Ok(HttpResponse::Ok().json(certificates))
}

/// The caller's own certificates, newest first.
#[get("/api/certificates")]
async fn my_certificates(
    state: web::Data<AppState>,
    query: web::Query<PaginationParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    let certificates: Vec<CertificateDto> = state
        .certificate_service
        .list_for_participant(&auth.0.sub, query.offset(), query.limit())
        .await?
        .into_iter()
        .map(|c| CertificateDto::new(c, now))
        .collect();
    Ok(HttpResponse::Ok().json(certificates))
}

#[get("/api/certificates/by-name")]
async fn search_certificates_by_name(
    state: web::Data<AppState>,
    query: web::Query<CertificateNameSearchParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;
    query.validate()?;

    let now = Utc::now();
    let certificates: Vec<CertificateDto> = state
        .certificate_service
        .search_by_name(&query.name, &auth.0)
        .await?
        .into_iter()
        .map(|c| CertificateDto::new(c, now))
        .collect();
    Ok(HttpResponse::Ok().json(certificates))
}
