/// User model, authentication and job applications
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     username VARCHAR(25) PRIMARY KEY,
///     password_hash TEXT NOT NULL,
///     first_name TEXT NOT NULL,
///     last_name TEXT NOT NULL,
///     email TEXT NOT NULL CHECK (position('@' IN email) > 1),
///     is_admin BOOLEAN NOT NULL DEFAULT FALSE
/// );
///
/// CREATE TABLE applications (
///     username VARCHAR(25) REFERENCES users ON DELETE CASCADE,
///     job_id INTEGER REFERENCES jobs ON DELETE CASCADE,
///     PRIMARY KEY (username, job_id)
/// );
/// ```
///
/// Passwords are stored as Argon2id hashes and never leave this module:
/// [`User`] has no password field.
///
/// # Example
///
/// ```no_run
/// use jobly_shared::models::user::{NewUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::register(
///     &pool,
///     NewUser {
///         username: "u1".to_string(),
///         password: "password1".to_string(),
///         first_name: "U1F".to_string(),
///         last_name: "U1L".to_string(),
///         email: "u1@email.com".to_string(),
///         is_admin: false,
///     },
/// )
/// .await?;
///
/// let same = User::authenticate(&pool, "u1", "password1").await?;
/// assert_eq!(user, same);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, info};

use super::{is_foreign_key_violation, is_unique_violation, patch_fields, ModelError, Patch};
use crate::auth::password::{hash_password, verify_password};
use crate::db::sql::{bind_values, sql_for_partial_update, ColumnKind, SqlValue};

/// Fields accepted by [`User::update`]
pub const UPDATABLE_FIELDS: &[(&str, ColumnKind)] = &[
    ("firstName", ColumnKind::Text),
    ("lastName", ColumnKind::Text),
    ("password", ColumnKind::Text),
    ("email", ColumnKind::Text),
    ("isAdmin", ColumnKind::Boolean),
];

const JS_TO_SQL: &[(&str, &str)] = &[
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("isAdmin", "is_admin"),
    ("password", "password_hash"),
];

const COLUMNS: &str = "username, first_name, last_name, email, is_admin";

/// A user account, without credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

/// A user together with the ids of jobs they applied to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,

    /// Ascending job ids; empty when the user has not applied anywhere
    pub jobs: Vec<i32>,
}

/// Input for registering a user
///
/// `password` is plaintext here and hashed by [`User::register`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// A user's application to a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub username: String,
    pub job_id: i32,
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    username: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    email: String,
    is_admin: bool,
}

impl From<CredentialsRow> for User {
    fn from(row: CredentialsRow) -> Self {
        Self {
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            is_admin: row.is_admin,
        }
    }
}

impl User {
    /// Checks a username/password pair
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Unauthorized` with the same message whether the
    /// user does not exist or the password is wrong.
    pub async fn authenticate(pool: &PgPool, username: &str, password: &str) -> Result<Self, ModelError> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT username, password_hash, first_name, last_name, email, is_admin
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        if let Some(row) = row {
            if verify_password(password, &row.password_hash)? {
                return Ok(row.into());
            }
        }

        debug!(username = %username, "Authentication failed");
        Err(ModelError::Unauthorized("Invalid username/password".to_string()))
    }

    /// Creates a user with a hashed password
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Duplicate` if the username is taken; no second row
    /// is written.
    pub async fn register(pool: &PgPool, data: NewUser) -> Result<Self, ModelError> {
        let password_hash = hash_password(&data.password)?;
        let username = data.username.clone();

        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password_hash, first_name, last_name, email, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(data.username)
        .bind(password_hash)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .bind(data.is_admin)
        .fetch_one(pool)
        .await;

        match result {
            Ok(user) => {
                info!(username = %user.username, is_admin = user.is_admin, "Registered user");
                Ok(user)
            }
            Err(e) if is_unique_violation(&e) => {
                Err(ModelError::Duplicate(format!("Duplicate username: {}", username)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Lists all users ordered by username
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>, ModelError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users ORDER BY username"
        ))
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Fetches a user and the jobs they applied to
    pub async fn get(pool: &PgPool, username: &str) -> Result<UserDetail, ModelError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(username))?;

        let jobs: Vec<i32> = sqlx::query_scalar(
            "SELECT job_id FROM applications WHERE username = $1 ORDER BY job_id",
        )
        .bind(username)
        .fetch_all(pool)
        .await?;

        Ok(UserDetail { user, jobs })
    }

    /// Applies a partial update
    ///
    /// Accepted keys: `firstName`, `lastName`, `password`, `email`, `isAdmin`.
    /// A new password is hashed before it is stored.
    pub async fn update(pool: &PgPool, username: &str, patch: &Patch) -> Result<Self, ModelError> {
        let mut fields = patch_fields(patch, UPDATABLE_FIELDS)?;

        for (field, value) in fields.iter_mut() {
            let hashed = match (*field, &*value) {
                ("password", SqlValue::Text(Some(password))) => hash_password(password)?,
                _ => continue,
            };
            *value = SqlValue::from(hashed);
        }

        let update = sql_for_partial_update(fields, JS_TO_SQL)?;

        let sql = format!(
            "UPDATE users SET {} WHERE username = {} RETURNING {COLUMNS}",
            update.set_cols,
            update.next_placeholder()
        );
        debug!(username = %username, set = %update.set_cols, "Updating user");

        bind_values(sqlx::query_as::<_, User>(&sql), update.values)
            .bind(username)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| not_found(username))
    }

    /// Deletes a user and, by cascade, their applications
    pub async fn remove(pool: &PgPool, username: &str) -> Result<(), ModelError> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(username));
        }

        Ok(())
    }

    /// Records an application from `username` to `job_id`
    ///
    /// # Errors
    ///
    /// - `ModelError::NotFound` if the user or the job does not exist
    /// - `ModelError::Duplicate` if the user already applied to this job
    pub async fn apply_for_job(pool: &PgPool, username: &str, job_id: i32) -> Result<Application, ModelError> {
        let (user_exists, job_exists): (bool, bool) = sqlx::query_as(
            r#"
            SELECT
                EXISTS (SELECT 1 FROM users WHERE username = $1),
                EXISTS (SELECT 1 FROM jobs WHERE id = $2)
            "#,
        )
        .bind(username)
        .bind(job_id)
        .fetch_one(pool)
        .await?;

        if !user_exists {
            return Err(ModelError::NotFound(format!("No user found: '{}'", username)));
        }
        if !job_exists {
            return Err(ModelError::NotFound(format!("No job found: '{}'", job_id)));
        }

        let result = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (username, job_id)
            VALUES ($1, $2)
            RETURNING username, job_id
            "#,
        )
        .bind(username)
        .bind(job_id)
        .fetch_one(pool)
        .await;

        match result {
            Ok(application) => {
                info!(username = %username, job_id, "Recorded application");
                Ok(application)
            }
            Err(e) if is_unique_violation(&e) => Err(ModelError::Duplicate(format!(
                "Duplicate application: job ID {}",
                job_id
            ))),
            // User or job deleted between the check and the insert
            Err(e) if is_foreign_key_violation(&e) => Err(ModelError::NotFound(format!(
                "No user or job found: '{}', '{}'",
                username, job_id
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

fn not_found(username: &str) -> ModelError {
    ModelError::NotFound(format!("No user: {}", username))
}
