/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`. Errors render as one envelope:
///
/// ```json
/// { "error": { "status": 404, "message": "No company: nope" } }
/// ```
///
/// Schema validation failures carry a list of messages instead of a string:
///
/// ```json
/// { "error": { "status": 400, "message": ["email: Invalid email format"] } }
/// ```
///
/// # Example
///
/// ```no_run
/// use jobly_api::error::ApiResult;
/// use axum::{extract::State, Json};
/// use jobly_api::app::AppState;
/// use jobly_shared::models::company::{Company, CompanyDetail};
///
/// async fn handler(State(state): State<AppState>) -> ApiResult<Json<CompanyDetail>> {
///     // ModelError::NotFound becomes a 404 envelope via `?`
///     let company = Company::get(&state.db, "c1").await?;
///     Ok(Json(company))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jobly_shared::{
    auth::{authorization::AuthzError, jwt::JwtError, password::PasswordError},
    models::ModelError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401), used for every authentication and authorization failure
    Unauthorized(String),

    /// Not found (404)
    NotFound(String),

    /// Request body failed schema validation (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Error envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: ErrorMessage,
}

/// A single message, or one message per failed validation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    Text(String),
    List(Vec<String>),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match self {
            ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) | ApiError::NotFound(msg) => {
                ErrorMessage::Text(msg)
            }
            ApiError::ValidationError(errors) => {
                ErrorMessage::List(errors.iter().map(ToString::to_string).collect())
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                ErrorMessage::Text("An internal error occurred".to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorBody {
                status: status.as_u16(),
                message,
            },
        });

        (status, body).into_response()
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NotFound(msg) => ApiError::NotFound(msg),
            ModelError::Duplicate(msg)
            | ModelError::ReferenceNotFound(msg)
            | ModelError::BadRequest(msg) => ApiError::BadRequest(msg),
            ModelError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            ModelError::Database(err) => err.into(),
            ModelError::Password(err) => err.into(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors: Vec<ValidationErrorDetail> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed {} check", error.code)),
                })
            })
            .collect();

        // field_errors() is a HashMap
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(errors)
    }
}
