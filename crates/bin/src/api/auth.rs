//! Bearer-token extractors.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use dossier::auth::{Claims, extract_bearer_token};

use super::{ApiError, AppState};

/// The caller identified by a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn account_id(&self) -> &str {
        &self.0.sub
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;
        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::Unauthorized("Malformed Authorization header".to_string()))?;

        let claims = state.dossier.verify_token(token).map_err(|err| {
            tracing::debug!(error = %err, "Rejected bearer token");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;
        Ok(AuthUser(claims))
    }
}

/// A missing `Authorization` header yields `None`; a present but invalid one
/// is still rejected.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(None);
        }
        <AuthUser as FromRequestParts<AppState>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}

/// An authenticated caller whose token carries the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) =
            <AuthUser as FromRequestParts<AppState>>::from_request_parts(parts, state).await?;
        if !claims.is_admin() {
            return Err(ApiError::Forbidden("Admin role required".to_string()));
        }
        Ok(AdminUser(claims))
    }
}
