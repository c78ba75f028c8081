/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use jobly_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
///
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{
        auth::{ensure_admin, ensure_admin_or_self},
        security::SecurityHeadersLayer,
    },
    routes,
};
use axum::{
    handler::Handler,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use chrono::Duration;
use jobly_shared::auth::{
    jwt::{self, Claims, JwtError},
    middleware::create_jwt_middleware,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Signs a token for `username` with the configured lifetime
    ///
    /// # Errors
    ///
    /// Returns `JwtError::CreateError` when the configured lifetime cannot be
    /// represented, or when signing fails.
    pub fn issue_token(&self, username: &str, is_admin: bool) -> Result<String, JwtError> {
        let hours = self.config.jwt.expiration_hours;
        let lifetime = Duration::try_hours(hours).ok_or_else(|| {
            JwtError::CreateError(format!("Token lifetime out of range: {} hours", hours))
        })?;

        let claims = Claims::with_expiration(username, is_admin, lifetime)?;
        jwt::create_token(&claims, self.jwt_secret())
    }
}

/// Builds the complete Axum router
///
/// ```text
/// /
/// ├── GET    /health
/// ├── /auth
/// │   ├── POST /token
/// │   └── POST /register
/// ├── /companies
/// │   ├── POST   /                 admin
/// │   ├── GET    /
/// │   ├── GET    /:handle
/// │   ├── PATCH  /:handle          admin
/// │   └── DELETE /:handle          admin
/// ├── /jobs
/// │   ├── POST   /                 admin
/// │   ├── GET    /
/// │   ├── GET    /:id
/// │   ├── PATCH  /:id              admin
/// │   └── DELETE /:id              admin
/// └── /users
///     ├── POST   /                 admin
///     ├── GET    /                 admin
///     ├── GET    /:username        admin or self
///     ├── PATCH  /:username        admin or self
///     ├── DELETE /:username        admin or self
///     └── POST   /:username/jobs/:id   admin or self
/// ```
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, tracing, JWT authentication
/// (lenient, every route), then per-method guards.
pub fn build_router(state: AppState) -> Router {
    let admin = || from_fn(ensure_admin);
    let admin_or_self = || from_fn(ensure_admin_or_self);

    let auth_routes = Router::new()
        .route("/token", post(routes::auth::token))
        .route("/register", post(routes::auth::register));

    let company_routes = Router::new()
        .route(
            "/",
            get(routes::companies::list).post(routes::companies::create.layer(admin())),
        )
        .route(
            "/:handle",
            get(routes::companies::get)
                .patch(routes::companies::update.layer(admin()))
                .delete(routes::companies::remove.layer(admin())),
        );

    let job_routes = Router::new()
        .route(
            "/",
            get(routes::jobs::list).post(routes::jobs::create.layer(admin())),
        )
        .route(
            "/:id",
            get(routes::jobs::get)
                .patch(routes::jobs::update.layer(admin()))
                .delete(routes::jobs::remove.layer(admin())),
        );

    let user_routes = Router::new()
        .route(
            "/",
            get(routes::users::list.layer(admin())).post(routes::users::create.layer(admin())),
        )
        .route(
            "/:username",
            get(routes::users::get.layer(admin_or_self()))
                .patch(routes::users::update.layer(admin_or_self()))
                .delete(routes::users::remove.layer(admin_or_self())),
        )
        .route(
            "/:username/jobs/:id",
            post(routes::users::apply.layer(admin_or_self())),
        );

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/auth", auth_routes)
        .nest("/companies", company_routes)
        .nest("/jobs", job_routes)
        .nest("/users", user_routes)
        .fallback(not_found)
        .layer(from_fn(create_jwt_middleware(state.config.jwt.secret.clone())))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not Found".to_string())
}
