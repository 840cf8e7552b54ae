use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::{require_staff, AuthenticatedUser},
    errors::AppError,
    models::dto::request::{CreateQuestionRequest, ListQuestionsParams, UpdateQuestionRequest},
};

#[get("/api/questions")]
async fn list_questions(
    state: web::Data<AppState>,
    query: web::Query<ListQuestionsParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;

    let questions = state
        .question_bank_service
        .list_questions(query.include_inactive)
        .await?;
    Ok(HttpResponse::Ok().json(questions))
}

#[post("/api/questions")]
async fn create_question(
    state: web::Data<AppState>,
    request: web::Json<CreateQuestionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;

    let question = state
        .question_bank_service
        .create_question(request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(question))
}

#[get("/api/questions/{id}")]
async fn get_question(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;

    let question = state.question_bank_service.get_question(&id).await?;
    Ok(HttpResponse::Ok().json(question))
}

#[put("/api/questions/{id}")]
async fn update_question(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<UpdateQuestionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;

    let question = state
        .question_bank_service
        .update_question(&id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(question))
}

/// Soft delete.
#[delete("/api/questions/{id}")]
async fn deactivate_question(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;

    let question = state.question_bank_service.deactivate_question(&id).await?;
    Ok(HttpResponse::Ok().json(question))
}
