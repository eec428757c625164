use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::error::AppError;
use crate::AppState;

/// A caller whose `Authorization: Bearer <token>` header verified against
/// the configured signing key.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::InvalidCredentials)?;

        let claims = state.tokens.verify(token).map_err(|e| {
            tracing::warn!(error = %e, "Bearer token rejected");
            e
        })?;

        Ok(AuthenticatedUser { id: claims.sub })
    }
}
