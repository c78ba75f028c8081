/// Route guards
///
/// Each guard reads the optional `AuthContext` left by
/// `jobly_shared::auth::middleware::authenticate_jwt` and either passes the
/// request on or answers 401. They are attached per method with
/// `Handler::layer`, so they run after routing and can see path parameters.
///
/// ```no_run
/// use axum::{handler::Handler, middleware::from_fn, routing::get, Router};
/// use jobly_api::middleware::auth::ensure_admin;
///
/// async fn list() {}
/// async fn create() {}
///
/// let app: Router = Router::new().route(
///     "/companies",
///     get(list).post(create.layer(from_fn(ensure_admin))),
/// );
/// ```

use axum::{
    extract::{Path, Request},
    middleware::Next,
    response::Response,
    Extension,
};
use jobly_shared::auth::{
    authorization::{require_admin, require_admin_or_user, require_logged_in},
    middleware::AuthContext,
};
use std::collections::HashMap;
use tracing::debug;

use crate::error::ApiError;

type MaybeAuth = Option<Extension<AuthContext>>;

fn context(auth: &MaybeAuth) -> Option<&AuthContext> {
    auth.as_ref().map(|Extension(auth)| auth)
}

/// Requires any valid token
pub async fn ensure_logged_in(auth: MaybeAuth, req: Request, next: Next) -> Result<Response, ApiError> {
    require_logged_in(context(&auth))?;
    Ok(next.run(req).await)
}

/// Requires a token with `isAdmin = true`
pub async fn ensure_admin(auth: MaybeAuth, req: Request, next: Next) -> Result<Response, ApiError> {
    if let Err(e) = require_admin(context(&auth)) {
        debug!(path = %req.uri().path(), "Rejected non-admin request");
        return Err(e.into());
    }
    Ok(next.run(req).await)
}

/// Requires an admin, or the user named by the `:username` path parameter
pub async fn ensure_admin_or_self(
    auth: MaybeAuth,
    Path(params): Path<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let username = params.get("username").map(String::as_str).unwrap_or_default();

    if let Err(e) = require_admin_or_user(context(&auth), username) {
        debug!(username = %username, "Rejected request for another user");
        return Err(e.into());
    }
    Ok(next.run(req).await)
}
