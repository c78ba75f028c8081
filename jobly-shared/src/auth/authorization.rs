/// Authorization predicates
///
/// Three rules cover every protected route:
///
/// 1. **Logged in**: any valid token
/// 2. **Admin**: a token with `isAdmin = true`
/// 3. **Admin or self**: an admin, or the user named in the route
///
/// The predicates are pure functions over the optional [`AuthContext`] that
/// the JWT middleware leaves in request extensions. The API's guard
/// middleware turns their errors into 401 responses.
///
/// # Example
///
/// ```
/// use jobly_shared::auth::authorization::{require_admin, require_admin_or_user};
/// use jobly_shared::auth::middleware::AuthContext;
///
/// let auth = AuthContext { username: "u1".to_string(), is_admin: false };
///
/// assert!(require_admin(Some(&auth)).is_err());
/// assert!(require_admin_or_user(Some(&auth), "u1").is_ok());
/// assert!(require_admin_or_user(Some(&auth), "u2").is_err());
/// ```

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("Must be logged in")]
    NotLoggedIn,

    #[error("Must be an admin")]
    NotAdmin,

    #[error("Must be an admin or the same user")]
    NotAdminOrSelf,
}

/// Passes for any authenticated caller
pub fn require_logged_in(auth: Option<&AuthContext>) -> Result<&AuthContext, AuthzError> {
    auth.ok_or(AuthzError::NotLoggedIn)
}

/// Passes only for an admin
pub fn require_admin(auth: Option<&AuthContext>) -> Result<&AuthContext, AuthzError> {
    match auth {
        Some(auth) if auth.is_admin => Ok(auth),
        _ => Err(AuthzError::NotAdmin),
    }
}

/// Passes for an admin, or for the caller whose username is `username`
pub fn require_admin_or_user<'a>(
    auth: Option<&'a AuthContext>,
    username: &str,
) -> Result<&'a AuthContext, AuthzError> {
    match auth {
        Some(auth) if auth.is_admin || auth.username == username => Ok(auth),
        _ => Err(AuthzError::NotAdminOrSelf),
    }
}
