use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::jwt::{verify_token, TokenError};
use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;

/// Extracts the authenticated user from a `Bearer` token.
///
/// Every protected handler takes `AuthUser` as an argument; the extractor
/// verifies the token, loads the user row and rejects deactivated accounts.
pub struct AuthUser(pub UserRow);

/// Like `AuthUser`, but additionally requires the `admin` role.
pub struct AdminUser(pub UserRow);

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Access denied. No token provided.".to_string()))
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let claims = verify_token(token, &state.config.jwt_secret).map_err(|e| match e {
            TokenError::Expired => {
                AppError::Unauthorized("Token expired. Please login again.".to_string())
            }
            TokenError::Invalid => AppError::Unauthorized("Invalid token.".to_string()),
        })?;

        let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(claims.sub)
            .fetch_optional(&state.db)
            .await?;

        let user = user.ok_or_else(|| {
            AppError::Unauthorized("User not found. Token may be invalid.".to_string())
        })?;

        if !user.is_active {
            return Err(AppError::Unauthorized(
                "User account is deactivated.".to_string(),
            ));
        }

        Ok(AuthUser(user))
    }
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}
