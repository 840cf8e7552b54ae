use async_graphql::{Context, Object};

use crate::{
    app_state::AppState,
    auth::{extract_claims_from_context, require_owner_or_staff, require_staff},
    graphql::helpers::{gql, page},
    models::dto::response::{AttemptSummary, Statistics, TestDefinitionDto},
};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn test_definitions(
        &self,
        ctx: &Context<'_>,
        include_inactive: Option<bool>,
    ) -> async_graphql::Result<Vec<TestDefinitionDto>> {
        let state = ctx.data::<AppState>()?;
        let claims = gql(extract_claims_from_context(ctx))?;

        let include_inactive = include_inactive.unwrap_or(false) && claims.is_staff();
        let definitions = gql(state.test_definition_service.list(include_inactive).await)?;

        Ok(definitions.into_iter().map(TestDefinitionDto::from).collect())
    }

    /// Defaults to the caller's own history.
    async fn history(
        &self,
        ctx: &Context<'_>,
        participant_id: Option<String>,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> async_graphql::Result<Vec<AttemptSummary>> {
        let state = ctx.data::<AppState>()?;
        let claims = gql(extract_claims_from_context(ctx))?;

        let participant_id = participant_id.unwrap_or_else(|| claims.sub.clone());
        gql(require_owner_or_staff(&claims, &participant_id))?;
        if participant_id != claims.sub {
            gql(state.participant_service.get_participant(&participant_id).await)?;
        }

        let (offset, limit) = page(offset, limit);
        gql(state
            .results_service
            .history(&participant_id, offset, limit)
            .await)
    }

    async fn statistics(
        &self,
        ctx: &Context<'_>,
        version: Option<i32>,
    ) -> async_graphql::Result<Statistics> {
        let state = ctx.data::<AppState>()?;
        let claims = gql(extract_claims_from_context(ctx))?;

        gql(require_staff(&claims))?;

        gql(state.results_service.statistics(version).await)
    }
}
