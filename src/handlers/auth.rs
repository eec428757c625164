use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::db::accounts;
use crate::error::AppError;
use crate::validation::{sanitize_string, validate_email, validate_password, validate_username};
use crate::AppState;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Missing or malformed field"),
        (status = 409, description = "Username or email already registered")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username = sanitize_string(&payload.username);
    let email = payload.email.trim().to_lowercase();

    validate_username(&username)?;
    validate_email(&email)?;
    validate_password(&payload.password)?;

    let password = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let mut conn = state.db.acquire().await?;
    let user = accounts::insert_user(&mut conn, &username, &email, &password_hash)
        .await
        .map_err(|e| {
            let duplicate = matches!(
                &e,
                sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
            );
            if duplicate {
                AppError::Conflict("username or email already registered".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            message: "User registered".to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token issued", body = TokenResponse),
        (status = 401, description = "Wrong username or password")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.acquire().await?;
    let user = accounts::find_by_username(&mut conn, payload.username.trim()).await?;
    drop(conn);

    let invalid = || AppError::Unauthorized("invalid username or password".to_string());
    let user = user.ok_or_else(invalid)?;

    let hash = user.password_hash.clone();
    let password = payload.password;
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !matches {
        return Err(invalid());
    }

    let token = state.tokens.issue(user.id, &user.role)?;
    Ok(Json(TokenResponse { token }))
}
