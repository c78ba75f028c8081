/// Request extractors that reject with the API error envelope
///
/// - [`ValidatedJson`]: deserializes a body and runs its `validator` rules
/// - [`ValidatedPatch`]: same, but also keeps the raw JSON object so the
///   repository sees exactly the keys the client sent
/// - [`QueryPairs`]: raw query parameters in request order
///
/// Axum's own rejections are plain text; these map every failure to
/// [`ApiError`] instead.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use jobly_shared::models::Patch;
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

use crate::error::ApiError;

/// JSON body that passed schema validation
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        value.validate()?;
        Ok(Self(value))
    }
}

/// Partial-update body: the validated typed view plus the raw object
#[derive(Debug, Clone)]
pub struct ValidatedPatch<T> {
    pub data: T,
    pub patch: Patch,
}

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedPatch<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        let patch = match value {
            Value::Object(map) => map,
            _ => {
                return Err(ApiError::BadRequest(
                    "Request body must be a JSON object".to_string(),
                ))
            }
        };

        let data: T = serde_json::from_value(Value::Object(patch.clone()))
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        data.validate()?;

        Ok(Self { data, patch })
    }
}

/// Query string as ordered `(key, value)` pairs
#[derive(Debug, Clone, Default)]
pub struct QueryPairs(pub Vec<(String, String)>);

impl QueryPairs {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for QueryPairs
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        Ok(Self(pairs))
    }
}

/// Parses a job id path segment
pub fn parse_job_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid job id: '{}'", raw)))
}
