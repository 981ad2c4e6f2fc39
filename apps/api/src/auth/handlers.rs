//! Axum route handlers for registration, login and profile management.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::extractor::AuthUser;
use crate::auth::jwt::generate_token;
use crate::auth::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use crate::errors::AppError;
use crate::models::user::{UserProfile, UserRow, ROLE_USER};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() || req.name.trim().is_empty() {
        return Err(AppError::Validation(
            "Email, password, and name are required.".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(AppError::Validation("Invalid email address.".to_string()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }

    let existing: Option<(uuid::Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation("Email already registered.".to_string()));
    }

    let password_hash = hash_password(&req.password)?;

    let user: UserRow = sqlx::query_as(
        r#"
        INSERT INTO users (email, password_hash, name, role)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(req.name.trim())
    .bind(ROLE_USER)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match e {
        // Unique violation: a concurrent registration won the race.
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Validation("Email already registered.".to_string())
        }
        other => AppError::Database(other),
    })?;

    info!("Registered user {} ({})", user.id, user.email);

    let token = generate_token(user.id, &state.config.jwt_secret)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required.".to_string(),
        ));
    }

    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(req.email.trim().to_lowercase())
        .fetch_optional(&state.db)
        .await?;

    // Same message for unknown email and bad password.
    let invalid = || AppError::Unauthorized("Invalid email or password.".to_string());
    let user = user.ok_or_else(invalid)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }
    if !user.is_active {
        return Err(AppError::Unauthorized(
            "Account is deactivated. Please contact support.".to_string(),
        ));
    }

    let user: UserRow = sqlx::query_as(
        "UPDATE users SET last_login = $1, updated_at = $1 WHERE id = $2 RETURNING *",
    )
    .bind(Utc::now())
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    let token = generate_token(user.id, &state.config.jwt_secret)?;
    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

/// GET /api/v1/auth/profile
pub async fn handle_get_profile(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(user.into())
}

/// PUT /api/v1/auth/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let name = match req.name {
        Some(n) if !n.trim().is_empty() => n.trim().to_string(),
        _ => user.name.clone(),
    };

    let email = match req.email {
        Some(e) if !e.trim().is_empty() => {
            let e = e.trim().to_lowercase();
            if e != user.email {
                let taken: Option<(uuid::Uuid,)> =
                    sqlx::query_as("SELECT id FROM users WHERE email = $1")
                        .bind(&e)
                        .fetch_optional(&state.db)
                        .await?;
                if taken.is_some() {
                    return Err(AppError::Validation("Email already in use.".to_string()));
                }
            }
            e
        }
        _ => user.email.clone(),
    };

    let updated: UserRow = sqlx::query_as(
        "UPDATE users SET name = $1, email = $2, updated_at = now() WHERE id = $3 RETURNING *",
    )
    .bind(&name)
    .bind(&email)
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated.into()))
}

/// PUT /api/v1/auth/password
pub async fn handle_change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    if req.current_password.is_empty() || req.new_password.is_empty() {
        return Err(AppError::Validation(
            "Current password and new password are required.".to_string(),
        ));
    }
    if req.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "New password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    if !verify_password(&req.current_password, &user.password_hash)? {
        return Err(AppError::Unauthorized(
            "Current password is incorrect.".to_string(),
        ));
    }

    let password_hash = hash_password(&req.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
        .bind(&password_hash)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
