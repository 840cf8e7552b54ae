use async_graphql::ErrorExtensions;

use crate::errors::AppResult;

/// Converts a service result into a GraphQL result, keeping the error kind
/// in the `code` extension.
pub fn gql<T>(result: AppResult<T>) -> async_graphql::Result<T> {
    result.map_err(|err| err.extend())
}

pub fn page(offset: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    (offset.unwrap_or(0).max(0), limit.unwrap_or(20).clamp(1, 100))
}
