/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: JWT token generation and validation
/// - [`middleware`]: Lenient JWT middleware that attaches an `AuthContext`
/// - [`authorization`]: Logged-in / admin / admin-or-self predicates
///
/// # Example
///
/// ```no_run
/// use jobly_shared::auth::jwt::{create_token, validate_token, Claims};
/// use jobly_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("password1")?;
/// assert!(verify_password("password1", &hash)?);
///
/// let token = create_token(&Claims::new("u1", false), "secret-key")?;
/// let claims = validate_token(&token, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
