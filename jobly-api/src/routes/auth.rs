/// Authentication endpoints
///
/// - `POST /auth/token`: exchange username/password for a JWT
/// - `POST /auth/register`: create a non-admin account and return its JWT

use crate::{app::AppState, error::ApiResult, extract::ValidatedJson};
use axum::{extract::State, http::StatusCode, Json};
use jobly_shared::models::user::{NewUser, User};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// Token request
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TokenRequest {
    #[validate(length(min = 1, max = 25, message = "Username must be 1-25 characters"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 25, message = "Username must be 1-25 characters"))]
    pub username: String,

    #[validate(length(min = 5, max = 20, message = "Password must be 5-20 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 30, message = "First name must be 1-30 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 30, message = "Last name must be 1-30 characters"))]
    pub last_name: String,

    #[validate(
        email(message = "Invalid email format"),
        length(min = 6, max = 60, message = "Email must be 6-60 characters")
    )]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Login
///
/// ```text
/// POST /auth/token
/// { "username": "u1", "password": "password1" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Schema validation failed
/// - `401 Unauthorized`: Invalid username/password
pub async fn token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = User::authenticate(&state.db, &req.username, &req.password).await?;
    let token = state.issue_token(&user.username, user.is_admin)?;

    Ok(Json(TokenResponse { token }))
}

/// Self-registration
///
/// Accounts created here are never admins.
///
/// ```text
/// POST /auth/register
/// {
///   "username": "new",
///   "password": "password",
///   "firstName": "first",
///   "lastName": "last",
///   "email": "new@email.com"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Schema validation failed or duplicate username
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    let user = User::register(
        &state.db,
        NewUser {
            username: req.username,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            is_admin: false,
        },
    )
    .await?;

    info!(username = %user.username, "User self-registered");
    let token = state.issue_token(&user.username, user.is_admin)?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}
