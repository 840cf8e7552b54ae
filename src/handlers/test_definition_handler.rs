use actix_web::{delete, get, post, put, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{require_staff, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::{
            AddQuestionRequest, CreateTestDefinitionRequest, LanguageParams,
            ListTestDefinitionsParams, ReorderQuestionsRequest, SetActiveRequest,
            SetMandatoryQuestionsRequest,
        },
        response::{MessageResponse, TestDefinitionDto},
    },
};

/// Participants only ever see active definitions.
#[get("/api/test-definitions")]
async fn list_test_definitions(
    state: web::Data<AppState>,
    query: web::Query<ListTestDefinitionsParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let include_inactive = query.include_inactive && auth.0.is_staff();

    let definitions: Vec<TestDefinitionDto> = state
        .test_definition_service
        .list(include_inactive)
        .await?
        .into_iter()
        .map(TestDefinitionDto::from)
        .collect();
    Ok(HttpResponse::Ok().json(definitions))
}

#[get("/api/test-definitions/{version}/questions")]
async fn questions_for_taking(
    state: web::Data<AppState>,
    version: web::Path<i32>,
    query: web::Query<LanguageParams>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let language = query.language.unwrap_or(state.config.default_language);

    let test = state
        .test_definition_service
        .questions_for_taking(*version, language)
        .await?;
    Ok(HttpResponse::Ok().json(test))
}

#[post("/api/test-definitions")]
async fn create_test_definition(
    state: web::Data<AppState>,
    request: web::Json<CreateTestDefinitionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;

    let definition = state
        .test_definition_service
        .create_test_definition(request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(definition))
}

#[post("/api/test-definitions/{version}/questions")]
async fn add_question(
    state: web::Data<AppState>,
    version: web::Path<i32>,
    request: web::Json<AddQuestionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;
    request.validate()?;

    let definition = state
        .test_definition_service
        .add_question(*version, &request.question_id)
        .await?;
    Ok(HttpResponse::Ok().json(definition))
}

#[put("/api/test-definitions/{version}/mandatory")]
async fn set_mandatory_questions(
    state: web::Data<AppState>,
    version: web::Path<i32>,
    request: web::Json<SetMandatoryQuestionsRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;

    let definition = state
        .test_definition_service
        .set_mandatory_questions(*version, request.into_inner().question_ids)
        .await?;
    Ok(HttpResponse::Ok().json(definition))
}

#[put("/api/test-definitions/{version}/order")]
async fn reorder_questions(
    state: web::Data<AppState>,
    version: web::Path<i32>,
    request: web::Json<ReorderQuestionsRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;
    request.validate()?;

    let definition = state
        .test_definition_service
        .reorder_questions(*version, request.into_inner().question_order)
        .await?;
    Ok(HttpResponse::Ok().json(definition))
}

#[put("/api/test-definitions/{version}/active")]
async fn set_active(
    state: web::Data<AppState>,
    version: web::Path<i32>,
    request: web::Json<SetActiveRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;

    let definition = state
        .test_definition_service
        .set_active(*version, request.is_active)
        .await?;
    Ok(HttpResponse::Ok().json(definition))
}

#[delete("/api/test-definitions/{version}")]
async fn delete_test_definition(
    state: web::Data<AppState>,
    version: web::Path<i32>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_staff(&auth.0)?;

    state
        .test_definition_service
        .delete_test_definition(*version)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: format!("Test definition v{} deleted", version),
    }))
}
