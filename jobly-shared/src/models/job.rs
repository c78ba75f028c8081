/// Job model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE jobs (
///     id SERIAL PRIMARY KEY,
///     title TEXT NOT NULL,
///     salary INTEGER CHECK (salary >= 0),
///     equity NUMERIC CHECK (equity >= 0 AND equity <= 1.0),
///     company_handle VARCHAR(25) NOT NULL REFERENCES companies ON DELETE CASCADE
/// );
/// ```
///
/// Titles are unique per application-level check only, applied by both
/// `create` and `update`. Two concurrent writes with the same title can both
/// pass the check.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;

use super::{
    check_filter_keys, is_foreign_key_violation, parse_filter_value, patch_fields, ModelError,
    Patch,
};
use crate::db::sql::{
    bind_values, sql_for_partial_update, ColumnKind, FilterBuilder, SqlValue, WhereClause,
};

/// Fields accepted by [`Job::update`]
///
/// Neither `id` nor `companyHandle` can change.
pub const UPDATABLE_FIELDS: &[(&str, ColumnKind)] = &[
    ("title", ColumnKind::Text),
    ("salary", ColumnKind::NullableInteger),
    ("equity", ColumnKind::NullableNumeric),
];

/// Query parameters accepted by the job listing
pub const FILTERS: &[&str] = &["title", "minSalary", "hasEquity"];

const COLUMNS: &str = "id, title, salary, equity, company_handle";

/// A job posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

/// Input for creating a job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

/// Filters for [`Job::find_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilters {
    /// Case-insensitive substring of the title
    pub title: Option<String>,

    /// Inclusive lower bound on salary
    pub min_salary: Option<i32>,

    /// Only jobs with non-zero equity when true; no restriction when false
    pub has_equity: bool,
}

impl JobFilters {
    /// Builds filters from raw query parameters
    ///
    /// # Errors
    ///
    /// Returns `ModelError::BadRequest` for a key outside [`FILTERS`], a
    /// malformed or negative `minSalary`, or a `hasEquity` that is not a boolean.
    pub fn from_params<'a, I>(params: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let params: Vec<(&str, &str)> = params.into_iter().collect();
        check_filter_keys(params.iter().map(|(key, _)| *key), FILTERS)?;

        let mut filters = JobFilters::default();
        for (key, raw) in params {
            match key {
                "title" => filters.title = Some(raw.to_string()),
                "minSalary" => {
                    let min: i32 = parse_filter_value(key, raw, "an integer")?;
                    if min < 0 {
                        return Err(ModelError::BadRequest("minSalary must be >= 0".to_string()));
                    }
                    filters.min_salary = Some(min);
                }
                "hasEquity" => filters.has_equity = parse_filter_value(key, raw, "a boolean")?,
                _ => {}
            }
        }

        Ok(filters)
    }

    /// Compiles the filters into a parameterised `WHERE` clause
    pub fn where_clause(&self) -> WhereClause {
        let mut builder = FilterBuilder::new();

        if let Some(title) = &self.title {
            builder.contains_ignore_case("title", title);
        }
        if let Some(min) = self.min_salary {
            builder.compare("salary", ">=", min);
        }
        if self.has_equity {
            builder.predicate("equity > 0");
        }

        builder.build()
    }
}

impl Job {
    /// Inserts a new job
    ///
    /// # Errors
    ///
    /// - `ModelError::Duplicate` if a job with this exact title exists
    /// - `ModelError::ReferenceNotFound` if the company does not exist
    pub async fn create(pool: &PgPool, data: NewJob) -> Result<Self, ModelError> {
        ensure_title_free(pool, &data.title, None).await?;

        let company_handle = data.company_handle.clone();

        let result = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (title, salary, equity, company_handle)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(data.title)
        .bind(data.salary)
        .bind(data.equity)
        .bind(data.company_handle)
        .fetch_one(pool)
        .await;

        match result {
            Ok(job) => Ok(job),
            Err(e) if is_foreign_key_violation(&e) => Err(ModelError::ReferenceNotFound(format!(
                "Company handle doesn't exist: '{}'",
                company_handle
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Lists jobs matching `filters`, ordered by title
    pub async fn find_all(pool: &PgPool, filters: &JobFilters) -> Result<Vec<Self>, ModelError> {
        let clause = filters.where_clause();
        let sql = format!("SELECT {COLUMNS} FROM jobs {} ORDER BY title, id", clause.sql);
        debug!(sql = %sql, "Listing jobs");

        let jobs = bind_values(sqlx::query_as::<_, Job>(&sql), clause.values)
            .fetch_all(pool)
            .await?;

        Ok(jobs)
    }

    /// Fetches a job by id
    pub async fn get(pool: &PgPool, id: i32) -> Result<Self, ModelError> {
        sqlx::query_as::<_, Job>(&format!("SELECT {COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Applies a partial update
    ///
    /// Accepted keys: `title`, `salary`, `equity`. A new title must not belong
    /// to another job.
    pub async fn update(pool: &PgPool, id: i32, patch: &Patch) -> Result<Self, ModelError> {
        let fields = patch_fields(patch, UPDATABLE_FIELDS)?;

        for (field, value) in &fields {
            if let ("title", SqlValue::Text(Some(title))) = (*field, value) {
                ensure_title_free(pool, title, Some(id)).await?;
            }
        }
        let update = sql_for_partial_update(fields, &[])?;

        let sql = format!(
            "UPDATE jobs SET {} WHERE id = {} RETURNING {COLUMNS}",
            update.set_cols,
            update.next_placeholder()
        );
        debug!(sql = %sql, "Updating job");

        bind_values(sqlx::query_as::<_, Job>(&sql), update.values)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn remove(pool: &PgPool, id: i32) -> Result<(), ModelError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        Ok(())
    }
}

/// Fails with `Duplicate` if a job other than `except` already has `title`
async fn ensure_title_free(pool: &PgPool, title: &str, except: Option<i32>) -> Result<(), ModelError> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM jobs WHERE title = $1 AND id IS DISTINCT FROM $2)",
    )
    .bind(title)
    .bind(except)
    .fetch_one(pool)
    .await?;

    if exists {
        return Err(ModelError::Duplicate(format!("Duplicate job: '{}'", title)));
    }

    Ok(())
}

fn not_found(id: i32) -> ModelError {
    ModelError::NotFound(format!("No job found: {}", id))
}
