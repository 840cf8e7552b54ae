use async_graphql::Context;

use crate::{
    auth::Claims,
    errors::{AppError, AppResult},
};

pub fn require_staff(claims: &Claims) -> AppResult<()> {
    if !claims.is_staff() {
        return Err(AppError::Unauthorized(
            "Only staff can perform this action".to_string(),
        ));
    }
    Ok(())
}

pub fn require_owner(claims: &Claims, resource_owner: &str) -> AppResult<()> {
    if claims.sub != resource_owner {
        return Err(AppError::Unauthorized(
            "This attempt belongs to another participant".to_string(),
        ));
    }
    Ok(())
}

pub fn require_owner_or_staff(claims: &Claims, resource_owner: &str) -> AppResult<()> {
    if !claims.is_staff() && claims.sub != resource_owner {
        return Err(AppError::Unauthorized(
            "You can only access your own records".to_string(),
        ));
    }
    Ok(())
}

pub fn extract_claims_from_context(ctx: &Context<'_>) -> AppResult<Claims> {
    ctx.data::<Claims>()
        .cloned()
        .map_err(|_| AppError::Unauthorized("Authentication required".to_string()))
}
