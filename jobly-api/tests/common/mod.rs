//! Common test utilities for API integration tests
//!
//! Requires a running PostgreSQL database. Tests return early when
//! `DATABASE_URL` is not set.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use jobly_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig, JwtConfig},
};
use jobly_shared::{
    db::{migrations::run_migrations, pool},
    models::{
        company::{Company, NewCompany},
        job::{Job, NewJob},
        user::{NewUser, User},
    },
};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test context with a migrated database, a router and two signed-in users
pub struct TestContext {
    pub db: PgPool,
    pub state: AppState,
    pub app: Router,
    pub admin: User,
    pub admin_token: String,
    pub user: User,
    pub user_token: String,
}

impl TestContext {
    /// Creates a new test context, or `None` when no database is configured
    pub async fn try_new() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                production: false,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: url.clone(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
                expiration_hours: 1,
            },
        };

        let db = pool::create_pool(pool::DatabaseConfig {
            url,
            max_connections: 5,
            min_connections: 1,
            ..Default::default()
        })
        .await
        .expect("Failed to create pool");
        run_migrations(&db).await.expect("Failed to run migrations");

        let state = AppState::new(db.clone(), config);
        let app = build_router(state.clone());

        let admin = create_user(&db, true).await;
        let admin_token = state
            .issue_token(&admin.username, true)
            .expect("Failed to sign admin token");
        let user = create_user(&db, false).await;
        let user_token = state
            .issue_token(&user.username, false)
            .expect("Failed to sign user token");

        Some(Self {
            db,
            state,
            app,
            admin,
            admin_token,
            user,
            user_token,
        })
    }

    /// Sends one request through the router and decodes the JSON body
    ///
    /// The body is `Value::Null` when the response has no content.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response is not JSON")
        };

        (status, json)
    }

    pub async fn create_company(&self, num_employees: Option<i32>) -> Company {
        let handle = unique("c");
        Company::create(
            &self.db,
            NewCompany {
                name: format!("Name {}", handle),
                handle,
                description: "Desc".to_string(),
                num_employees,
                logo_url: None,
            },
        )
        .await
        .expect("Failed to create company")
    }

    pub async fn create_job(&self, company_handle: &str) -> Job {
        Job::create(
            &self.db,
            NewJob {
                title: unique("job"),
                salary: Some(100),
                equity: None,
                company_handle: company_handle.to_string(),
            },
        )
        .await
        .expect("Failed to create job")
    }

    pub async fn count(&self, sql: &str, key: &str) -> i64 {
        sqlx::query_scalar(sql)
            .bind(key)
            .fetch_one(&self.db)
            .await
            .expect("Failed to count rows")
    }
}

/// Short unique key that fits the 25-character columns
pub fn unique(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &id[..12])
}

async fn create_user(db: &PgPool, is_admin: bool) -> User {
    let username = unique(if is_admin { "admin" } else { "u" });
    User::register(
        db,
        NewUser {
            email: format!("{}@email.com", username),
            username,
            password: "password1".to_string(),
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
            is_admin,
        },
    )
    .await
    .expect("Failed to create test user")
}
