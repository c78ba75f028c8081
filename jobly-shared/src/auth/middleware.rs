/// JWT authentication middleware for Axum
///
/// Authentication is lenient: a valid `Authorization: Bearer <token>` header
/// adds an [`AuthContext`] to the request extensions, and anything else (no
/// header, wrong scheme, bad or expired token) simply leaves the request
/// anonymous. Rejecting requests is the job of the guards layered on
/// individual routes.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use jobly_shared::auth::middleware::{create_jwt_middleware, AuthContext};
///
/// async fn whoami(auth: Option<Extension<AuthContext>>) -> String {
///     match auth {
///         Some(Extension(auth)) => auth.username,
///         None => "anonymous".to_string(),
///     }
/// }
///
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn(create_jwt_middleware("secret")));
/// ```

use std::{future::Future, pin::Pin};

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::jwt::{validate_token, Claims};

/// Identity of the caller, present only for a valid token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub username: String,
    pub is_admin: bool,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.username,
            is_admin: claims.is_admin,
        }
    }
}

/// Returns the token from an `Authorization: Bearer` header, if any
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Attaches an [`AuthContext`] when the request carries a valid token
///
/// Never fails the request.
pub async fn authenticate_jwt(secret: String, mut req: Request, next: Next) -> Response {
    if let Some(token) = bearer_token(req.headers()) {
        match validate_token(token, &secret) {
            Ok(claims) => {
                debug!(username = %claims.username, is_admin = claims.is_admin, "Authenticated request");
                req.extensions_mut().insert(AuthContext::from(claims));
            }
            Err(e) => {
                debug!("Ignoring invalid token: {}", e);
            }
        }
    }

    next.run(req).await
}

/// Creates an [`authenticate_jwt`] closure bound to `secret`
pub fn create_jwt_middleware(
    secret: impl Into<String>,
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone {
    let secret = secret.into();
    move |req, next| {
        let secret = secret.clone();
        Box::pin(authenticate_jwt(secret, req, next))
    }
}
