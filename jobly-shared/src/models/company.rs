/// Company model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE companies (
///     handle VARCHAR(25) PRIMARY KEY,
///     name TEXT NOT NULL,
///     description TEXT NOT NULL,
///     num_employees INTEGER CHECK (num_employees >= 0),
///     logo_url TEXT
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use jobly_shared::models::company::{Company, NewCompany};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let company = Company::create(
///     &pool,
///     NewCompany {
///         handle: "anderson".to_string(),
///         name: "Anderson, Arias and Morrow".to_string(),
///         description: "Somebody program how I.".to_string(),
///         num_employees: Some(245),
///         logo_url: None,
///     },
/// )
/// .await?;
///
/// let detail = Company::get(&pool, &company.handle).await?;
/// println!("{} has {} jobs", detail.company.name, detail.jobs.len());
/// # Ok(())
/// # }
/// ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;

use super::{check_filter_keys, is_unique_violation, parse_filter_value, patch_fields, ModelError, Patch};
use crate::db::sql::{bind_values, sql_for_partial_update, ColumnKind, FilterBuilder, WhereClause};

/// Fields accepted by [`Company::update`]
///
/// `handle` is deliberately absent: it is the immutable key.
pub const UPDATABLE_FIELDS: &[(&str, ColumnKind)] = &[
    ("name", ColumnKind::Text),
    ("description", ColumnKind::Text),
    ("numEmployees", ColumnKind::NullableInteger),
    ("logoUrl", ColumnKind::NullableText),
];

const JS_TO_SQL: &[(&str, &str)] = &[("numEmployees", "num_employees"), ("logoUrl", "logo_url")];

/// Query parameters accepted by the company listing
pub const FILTERS: &[&str] = &["nameLike", "minEmployees", "maxEmployees"];

const COLUMNS: &str = "handle, name, description, num_employees, logo_url";

/// A company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// A job as listed under its company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CompanyJob {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
}

/// A company together with its jobs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,

    /// Ordered by job id; empty when the company has no jobs
    pub jobs: Vec<CompanyJob>,
}

/// Input for creating a company
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// Filters for [`Company::find_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyFilters {
    /// Case-insensitive substring of the name
    pub name_like: Option<String>,

    /// Inclusive lower bound on employee count
    pub min_employees: Option<i32>,

    /// Inclusive upper bound on employee count
    pub max_employees: Option<i32>,
}

impl CompanyFilters {
    /// Builds filters from raw query parameters
    ///
    /// # Errors
    ///
    /// Returns `ModelError::BadRequest` for a key outside [`FILTERS`], a
    /// non-integer bound, or `minEmployees > maxEmployees`.
    pub fn from_params<'a, I>(params: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let params: Vec<(&str, &str)> = params.into_iter().collect();
        check_filter_keys(params.iter().map(|(key, _)| *key), FILTERS)?;

        let mut filters = CompanyFilters::default();
        for (key, raw) in params {
            match key {
                "nameLike" => filters.name_like = Some(raw.to_string()),
                "minEmployees" => {
                    filters.min_employees = Some(parse_filter_value(key, raw, "an integer")?)
                }
                "maxEmployees" => {
                    filters.max_employees = Some(parse_filter_value(key, raw, "an integer")?)
                }
                _ => {}
            }
        }

        filters.validate()?;
        Ok(filters)
    }

    /// Rejects an inverted employee range
    pub fn validate(&self) -> Result<(), ModelError> {
        if let (Some(min), Some(max)) = (self.min_employees, self.max_employees) {
            if min > max {
                return Err(ModelError::BadRequest(
                    "maxEmployees must be greater than minEmployees".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Compiles the filters into a parameterised `WHERE` clause
    pub fn where_clause(&self) -> WhereClause {
        let mut builder = FilterBuilder::new();

        if let Some(name) = &self.name_like {
            builder.contains_ignore_case("name", name);
        }
        if let Some(min) = self.min_employees {
            builder.compare("num_employees", ">=", min);
        }
        if let Some(max) = self.max_employees {
            builder.compare("num_employees", "<=", max);
        }

        builder.build()
    }
}

impl Company {
    /// Inserts a new company
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Duplicate` if the handle is taken.
    pub async fn create(pool: &PgPool, data: NewCompany) -> Result<Self, ModelError> {
        let handle = data.handle.clone();

        let result = sqlx::query_as::<_, Company>(&format!(
            r#"
            INSERT INTO companies (handle, name, description, num_employees, logo_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(data.handle)
        .bind(data.name)
        .bind(data.description)
        .bind(data.num_employees)
        .bind(data.logo_url)
        .fetch_one(pool)
        .await;

        match result {
            Ok(company) => Ok(company),
            Err(e) if is_unique_violation(&e) => {
                Err(ModelError::Duplicate(format!("Duplicate company: {}", handle)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Lists companies matching `filters`, ordered by name
    pub async fn find_all(pool: &PgPool, filters: &CompanyFilters) -> Result<Vec<Self>, ModelError> {
        let clause = filters.where_clause();
        let sql = format!(
            "SELECT {COLUMNS} FROM companies {} ORDER BY name, handle",
            clause.sql
        );
        debug!(sql = %sql, "Listing companies");

        let companies = bind_values(sqlx::query_as::<_, Company>(&sql), clause.values)
            .fetch_all(pool)
            .await?;

        Ok(companies)
    }

    /// Fetches a company and its jobs
    ///
    /// # Errors
    ///
    /// Returns `ModelError::NotFound` if no company has this handle.
    pub async fn get(pool: &PgPool, handle: &str) -> Result<CompanyDetail, ModelError> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {COLUMNS} FROM companies WHERE handle = $1"
        ))
        .bind(handle)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ModelError::NotFound(format!("No company: {}", handle)))?;

        let jobs = sqlx::query_as::<_, CompanyJob>(
            r#"
            SELECT id, title, salary, equity
            FROM jobs
            WHERE company_handle = $1
            ORDER BY id
            "#,
        )
        .bind(handle)
        .fetch_all(pool)
        .await?;

        Ok(CompanyDetail { company, jobs })
    }

    /// Applies a partial update
    ///
    /// Accepted keys: `name`, `description`, `numEmployees`, `logoUrl`.
    ///
    /// # Errors
    ///
    /// - `ModelError::BadRequest` for an empty patch or any other key
    /// - `ModelError::NotFound` if no company has this handle
    pub async fn update(pool: &PgPool, handle: &str, patch: &Patch) -> Result<Self, ModelError> {
        let fields = patch_fields(patch, UPDATABLE_FIELDS)?;
        let update = sql_for_partial_update(fields, JS_TO_SQL)?;

        let sql = format!(
            "UPDATE companies SET {} WHERE handle = {} RETURNING {COLUMNS}",
            update.set_cols,
            update.next_placeholder()
        );
        debug!(sql = %sql, "Updating company");

        bind_values(sqlx::query_as::<_, Company>(&sql), update.values)
            .bind(handle)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ModelError::NotFound(format!("No company: {}", handle)))
    }

    /// Deletes a company and, by cascade, its jobs
    pub async fn remove(pool: &PgPool, handle: &str) -> Result<(), ModelError> {
        let result = sqlx::query("DELETE FROM companies WHERE handle = $1")
            .bind(handle)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ModelError::NotFound(format!("No company: {}", handle)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sql::SqlValue;

    #[test]
    fn test_filters_from_params() {
        let filters = CompanyFilters::from_params([
            ("nameLike", "net"),
            ("minEmployees", "10"),
            ("maxEmployees", "300"),
        ])
        .unwrap();

        assert_eq!(
            filters,
            CompanyFilters {
                name_like: Some("net".to_string()),
                min_employees: Some(10),
                max_employees: Some(300),
            }
        );
    }

    #[test]
    fn test_filters_reject_unknown_key() {
        let err = CompanyFilters::from_params([("nameLike", "net"), ("color", "red")]).unwrap_err();
        assert_eq!(err.to_string(), "Filter not allowed: color");
    }

    #[test]
    fn test_filters_reject_inverted_range() {
        let err = CompanyFilters::from_params([("minEmployees", "5"), ("maxEmployees", "2")])
            .unwrap_err();
        assert!(matches!(err, ModelError::BadRequest(_)));
    }

    #[test]
    fn test_filters_reject_non_integer() {
        let err = CompanyFilters::from_params([("minEmployees", "many")]).unwrap_err();
        assert_eq!(err.to_string(), "minEmployees must be an integer");
    }

    #[test]
    fn test_where_clause_empty() {
        assert!(CompanyFilters::default().where_clause().is_empty());
    }

    #[test]
    fn test_where_clause_all_filters() {
        let clause = CompanyFilters {
            name_like: Some("C1".to_string()),
            min_employees: Some(1),
            max_employees: Some(3),
        }
        .where_clause();

        assert_eq!(
            clause.sql,
            "WHERE name ILIKE $1 AND num_employees >= $2 AND num_employees <= $3"
        );
        assert_eq!(
            clause.values,
            vec![SqlValue::from("%C1%"), SqlValue::from(1), SqlValue::from(3)]
        );
    }

    #[test]
    fn test_handle_is_not_updatable() {
        assert!(!UPDATABLE_FIELDS.iter().any(|(name, _)| *name == "handle"));
    }

    #[test]
    fn test_detail_serializes_flat() {
        let detail = CompanyDetail {
            company: Company {
                handle: "c1".to_string(),
                name: "C1".to_string(),
                description: "Desc1".to_string(),
                num_employees: Some(1),
                logo_url: None,
            },
            jobs: vec![],
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["handle"], "c1");
        assert_eq!(json["numEmployees"], 1);
        assert!(json["logoUrl"].is_null());
        assert_eq!(json["jobs"], serde_json::json!([]));
    }
}
