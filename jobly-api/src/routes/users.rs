/// User endpoints
///
/// - `POST /users` (admin): create any user, including admins
/// - `GET /users` (admin)
/// - `GET /users/:username` (admin or self)
/// - `PATCH /users/:username` (admin or self; only admins may change `isAdmin`)
/// - `DELETE /users/:username` (admin or self)
/// - `POST /users/:username/jobs/:id` (admin or self)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{parse_job_id, ValidatedJson, ValidatedPatch},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use jobly_shared::{
    auth::middleware::AuthContext,
    models::user::{NewUser, User, UserDetail},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

/// Admin-created user
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUserRequest {
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

    #[serde(default)]
    pub is_admin: bool,
}

/// User update request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 5, max = 20, message = "Password must be 5-20 characters"))]
    pub password: Option<String>,

    #[validate(length(min = 1, max = 30, message = "First name must be 1-30 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 30, message = "Last name must be 1-30 characters"))]
    pub last_name: Option<String>,

    #[validate(
        email(message = "Invalid email format"),
        length(min = 6, max = 60, message = "Email must be 6-60 characters")
    )]
    pub email: Option<String>,

    pub is_admin: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse<T> {
    pub user: T,
}

#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: String,
}

#[derive(Debug, Serialize)]
pub struct AppliedResponse {
    pub applied: i32,
}

pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<NewUserRequest>,
) -> ApiResult<(StatusCode, Json<CreatedUserResponse>)> {
    let user = User::register(
        &state.db,
        NewUser {
            username: req.username,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            is_admin: req.is_admin,
        },
    )
    .await?;

    let token = state.issue_token(&user.username, user.is_admin)?;

    info!(username = %user.username, is_admin = user.is_admin, "Admin created user");
    Ok((StatusCode::CREATED, Json(CreatedUserResponse { user, token })))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<UsersResponse>> {
    let users = User::find_all(&state.db).await?;
    Ok(Json(UsersResponse { users }))
}

pub async fn get(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<UserResponse<UserDetail>>> {
    let user = User::get(&state.db, &username).await?;
    Ok(Json(UserResponse { user }))
}

pub async fn update(
    State(state): State<AppState>,
    Path(username): Path<String>,
    auth: Option<Extension<AuthContext>>,
    ValidatedPatch { data, patch }: ValidatedPatch<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse<User>>> {
    let caller_is_admin = auth.map(|Extension(auth)| auth.is_admin).unwrap_or(false);
    if data.is_admin.is_some() && !caller_is_admin {
        warn!(username = %username, "Non-admin tried to change admin status");
        return Err(ApiError::Unauthorized(
            "Only admins can change admin status".to_string(),
        ));
    }

    let user = User::update(&state.db, &username, &patch).await?;

    info!(username = %username, "Updated user");
    Ok(Json(UserResponse { user }))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    User::remove(&state.db, &username).await?;

    info!(username = %username, "Deleted user");
    Ok(Json(DeletedResponse { deleted: username }))
}

pub async fn apply(
    State(state): State<AppState>,
    Path((username, id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<AppliedResponse>)> {
    let application = User::apply_for_job(&state.db, &username, parse_job_id(&id)?).await?;

    Ok((
        StatusCode::CREATED,
        Json(AppliedResponse {
            applied: application.job_id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_user_request_defaults_to_non_admin() {
        let req: NewUserRequest = serde_json::from_value(json!({
            "username": "u-new",
            "password": "password-new",
            "firstName": "First-new",
            "lastName": "Last-newL",
            "email": "new@email.com"
        }))
        .unwrap();

        assert!(req.validate().is_ok());
        assert!(!req.is_admin);
    }

    #[test]
    fn test_update_request_rules() {
        let req: UpdateUserRequest =
            serde_json::from_value(json!({ "email": "not-an-email", "password": "pw" })).unwrap();
        assert_eq!(req.validate().unwrap_err().field_errors().len(), 2);

        let req: UpdateUserRequest = serde_json::from_value(json!({ "firstName": "New" })).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.is_admin.is_none());
    }

    #[test]
    fn test_applied_response_shape() {
        let json = serde_json::to_value(AppliedResponse { applied: 3 }).unwrap();
        assert_eq!(json, json!({ "applied": 3 }));
    }
}
