// ABOUTME: Authentication context for API requests
// ABOUTME: Extracts and validates the bearer identity token into the acting principal

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use cloudtrain_core::Principal;
use cloudtrain_security::{IdentityTokenValidator, TokenError};

use crate::error::AppError;

/// Current authenticated user
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

fn bearer_token(parts: &Parts) -> Result<&str, TokenError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(TokenError::Missing)?
        .to_str()
        .map_err(|_| TokenError::Invalid("authorization header is not valid ASCII".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .ok_or_else(|| TokenError::Invalid("expected a bearer token".to_string()))
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Arc<IdentityTokenValidator>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let validator = Arc::<IdentityTokenValidator>::from_ref(state);

        let principal = bearer_token(parts)
            .and_then(|token| validator.validate(token))
            .map_err(|e| {
                warn!("Rejected request to {}: {}", parts.uri.path(), e);
                AppError::Unauthorized(e)
            })?;

        Ok(Self(principal))
    }
}
