/// JWT token generation and validation
///
/// Tokens are signed with HS256 and carry the username and admin flag, which
/// is all the authorization guards need. They are never stored server-side.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: 24 hours by default, configurable via [`Claims::with_expiration`]
/// - **Validation**: Signature, expiration, not-before and issuer
/// - **Secret**: at least 32 bytes, enforced by the API configuration
///
/// # Example
///
/// ```
/// use jobly_shared::auth::jwt::{create_token, validate_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "test-secret-key-at-least-32-bytes-long";
///
/// let token = create_token(&Claims::new("u1", false), secret)?;
///
/// let claims = validate_token(&token, secret)?;
/// assert_eq!(claims.username, "u1");
/// assert!(!claims.is_admin);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Value of the `iss` claim on every token
pub const ISSUER: &str = "jobly";

/// Lifetime of a token created with [`Claims::new`]
pub const DEFAULT_EXPIRATION_HOURS: i64 = 24;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// JWT claims
///
/// `username` and `isAdmin` are the payload; the rest are registered claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,

    #[serde(rename = "isAdmin")]
    pub is_admin: bool,

    /// Always [`ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims valid for [`DEFAULT_EXPIRATION_HOURS`]
    pub fn new(username: impl Into<String>, is_admin: bool) -> Self {
        let now = Utc::now();
        Self::issued_at(username, is_admin, now, now + Duration::hours(DEFAULT_EXPIRATION_HOURS))
    }

    /// Creates claims valid for `expires_in` from now
    ///
    /// ```
    /// use jobly_shared::auth::jwt::Claims;
    /// use chrono::Duration;
    ///
    /// let claims = Claims::with_expiration("admin", true, Duration::hours(1)).unwrap();
    /// assert_eq!(claims.exp - claims.iat, 3600);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `JwtError::CreateError` if the expiry falls outside the
    /// representable date range.
    pub fn with_expiration(
        username: impl Into<String>,
        is_admin: bool,
        expires_in: Duration,
    ) -> Result<Self, JwtError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(expires_in).ok_or_else(|| {
            JwtError::CreateError(format!("Token lifetime out of range: {}", expires_in))
        })?;

        Ok(Self::issued_at(username, is_admin, now, expires_at))
    }

    fn issued_at(
        username: impl Into<String>,
        is_admin: bool,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            username: username.into(),
            is_admin,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs `claims` with HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies a token and returns its claims
///
/// # Errors
///
/// - `JwtError::Expired` past `exp`
/// - `JwtError::InvalidIssuer` if `iss` is not [`ISSUER`]
/// - `JwtError::ValidationError` for a bad signature or malformed token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_new() {
        let claims = Claims::new("u1", true);

        assert_eq!(claims.username, "u1");
        assert!(claims.is_admin);
        assert_eq!(claims.iss, "jobly");
        assert_eq!(claims.iat, claims.nbf);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_claims_serialize_is_admin_camel_case() {
        let json = serde_json::to_value(Claims::new("u1", false)).unwrap();

        assert_eq!(json["username"], "u1");
        assert_eq!(json["isAdmin"], false);
        assert!(json.get("is_admin").is_none());
    }

    #[test]
    fn test_create_and_validate_token() {
        let claims = Claims::new("u1", false);
        let token = create_token(&claims, SECRET).expect("Token creation should succeed");

        assert_eq!(token.split('.').count(), 3);

        let validated = validate_token(&token, SECRET).expect("Validation should succeed");
        assert_eq!(validated, claims);
    }

    #[test]
    fn test_validate_token_wrong_secret() {
        let token = create_token(&Claims::new("u1", false), SECRET).unwrap();

        let result = validate_token(&token, "another-secret-key-at-least-32-bytes");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_validate_token_expired() {
        // Beyond the default 60s leeway
        let claims = Claims::with_expiration("u1", false, Duration::hours(-2)).unwrap();
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_with_expiration_out_of_range() {
        let result = Claims::with_expiration("u1", false, Duration::hours(10_000_000_000));
        assert!(matches!(result, Err(JwtError::CreateError(_))));

        let claims = Claims::with_expiration("u1", false, Duration::hours(24 * 365)).unwrap();
        assert_eq!(claims.exp - claims.iat, 24 * 365 * 3600);
    }

    #[test]
    fn test_validate_token_wrong_issuer() {
        let mut claims = Claims::new("u1", false);
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_token(&token, SECRET),
            Err(JwtError::InvalidIssuer { .. })
        ));
    }

    #[test]
    fn test_validate_token_malformed() {
        assert!(validate_token("not.a.token", SECRET).is_err());
        assert!(validate_token("", SECRET).is_err());
    }
}
