use async_graphql::{Context, Json, Object};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::extract_claims_from_context,
    errors::AppError,
    graphql::helpers::gql,
    models::{
        domain::{AnswerSheet, ScoreResult},
        dto::{request::StartAttemptRequest, response::AttemptStarted},
    },
};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn start_attempt(
        &self,
        ctx: &Context<'_>,
        input: StartAttemptRequest,
    ) -> async_graphql::Result<AttemptStarted> {
        let state = ctx.data::<AppState>()?;
        let claims = gql(extract_claims_from_context(ctx))?;

        gql(input.validate().map_err(AppError::from))?;

        let language = input.language.unwrap_or(state.config.default_language);
        let attempt = gql(state
            .attempt_service
            .start(&claims.sub, input.test_version, language)
            .await)?;

        Ok(attempt.into())
    }

    /// `answers` maps question ids to a boolean, 0/1 or a true/false token.
    async fn finish_attempt(
        &self,
        ctx: &Context<'_>,
        attempt_id: String,
        answers: Option<Json<AnswerSheet>>,
        elapsed_seconds: Option<i64>,
    ) -> async_graphql::Result<ScoreResult> {
        let state = ctx.data::<AppState>()?;
        let claims = gql(extract_claims_from_context(ctx))?;

        gql(state
            .attempt_service
            .finish(
                &attempt_id,
                &claims,
                answers.map(|Json(sheet)| sheet),
                elapsed_seconds,
            )
            .await)
    }
}
