/// Repositories for Jobly entities
///
/// Each model exposes its CRUD operations as associated functions taking an
/// injected `&PgPool`:
///
/// - `company`: Companies and their nested job listings
/// - `job`: Job postings
/// - `user`: Accounts, authentication and job applications
///
/// Partial updates accept a [`Patch`] (an insertion-ordered JSON object). Keys
/// outside a model's updatable set are rejected before any SQL is compiled.
///
/// # Example
///
/// ```no_run
/// use jobly_shared::models::company::{Company, CompanyFilters};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let filters = CompanyFilters::from_params([("nameLike", "net")])?;
/// let companies = Company::find_all(&pool, &filters).await?;
/// # Ok(())
/// # }
/// ```

pub mod company;
pub mod job;
pub mod user;

use crate::auth::password::PasswordError;
use crate::db::sql::{ColumnKind, SqlError, SqlValue};
use std::str::FromStr;

/// Sparse update data keyed by API field name
pub type Patch = serde_json::Map<String, serde_json::Value>;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// No row matches the given key
    #[error("{0}")]
    NotFound(String),

    /// A row with the same natural key already exists
    #[error("{0}")]
    Duplicate(String),

    /// A referenced row does not exist
    #[error("{0}")]
    ReferenceNotFound(String),

    /// Input rejected before reaching the database
    #[error("{0}")]
    BadRequest(String),

    /// Credentials did not match
    #[error("{0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<SqlError> for ModelError {
    fn from(err: SqlError) -> Self {
        ModelError::BadRequest(err.to_string())
    }
}

/// Checks `patch` against `allowed` and coerces each value
///
/// Fails on the first key (in patch order) that is not updatable.
pub(crate) fn patch_fields<'a>(
    patch: &'a Patch,
    allowed: &[(&str, ColumnKind)],
) -> Result<Vec<(&'a str, SqlValue)>, ModelError> {
    if let Some(field) = patch
        .keys()
        .find(|key| !allowed.iter().any(|(name, _)| *name == key.as_str()))
    {
        return Err(ModelError::BadRequest(format!(
            "Data field not allowed: '{}'",
            field
        )));
    }

    patch
        .iter()
        .map(|(key, value)| {
            let kind = allowed
                .iter()
                .find(|(name, _)| *name == key.as_str())
                .map(|(_, kind)| *kind)
                .unwrap_or(ColumnKind::Text);
            Ok((key.as_str(), kind.coerce(key, value)?))
        })
        .collect()
}

/// Rejects listing query parameters outside `allowed`
pub(crate) fn check_filter_keys<'a, I>(params: I, allowed: &[&str]) -> Result<(), ModelError>
where
    I: IntoIterator<Item = &'a str>,
{
    for key in params {
        if !allowed.contains(&key) {
            return Err(ModelError::BadRequest(format!("Filter not allowed: {}", key)));
        }
    }
    Ok(())
}

/// Parses a single listing query parameter
pub(crate) fn parse_filter_value<T: FromStr>(key: &str, raw: &str, expected: &str) -> Result<T, ModelError> {
    raw.trim()
        .parse()
        .map_err(|_| ModelError::BadRequest(format!("{} must be {}", key, expected)))
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}
