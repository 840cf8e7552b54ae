use actix_web::{post, web, HttpRequest};
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};

use crate::{auth::optional_claims, graphql::Schema};

/// Claims from the bearer token, if any, are handed to resolvers as
/// request data.
#[post("/graphql")]
async fn graphql(
    schema: web::Data<Schema>,
    req: HttpRequest,
    gql_request: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = gql_request.into_inner();
    if let Some(claims) = optional_claims(&req) {
        request = request.data(claims);
    }
    schema.execute(request).await.into()
}
