/// Configuration management for the API server
///
/// Configuration is read from environment variables, with a `.env` file
/// loaded first when present.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 3001)
/// - `API_PRODUCTION`: Enables HSTS when `true` (default: false)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing, at least 32 characters (required)
/// - `JWT_EXPIRATION_HOURS`: Token lifetime, at most one year (default: 24)
/// - `RUST_LOG`: Log filter (default: jobly_api=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use jobly_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;

/// Longest accepted token lifetime: one year
pub const MAX_EXPIRATION_HOURS: i64 = 24 * 365;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Turns on production-only behavior such as HSTS
    pub production: bool,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub expiration_hours: i64,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value does not
    /// parse, or `JWT_SECRET` is shorter than 32 characters.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            api: ApiConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("API_PORT", 3001)?,
                production: parse_var("API_PRODUCTION", false)?,
                cors_origins: parse_origins(
                    &env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
                ),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET")
                    .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?,
                expiration_hours: parse_var("JWT_EXPIRATION_HOURS", 24)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks values that parse but are unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt.secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }
        if self.jwt.expiration_hours <= 0 || self.jwt.expiration_hours > MAX_EXPIRATION_HOURS {
            anyhow::bail!(
                "JWT_EXPIRATION_HOURS must be between 1 and {}",
                MAX_EXPIRATION_HOURS
            );
        }
        if self.database.max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }
        Ok(())
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 3001,
                production: false,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/jobly_test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                expiration_hours: 24,
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(config().bind_address(), "127.0.0.1:3001");
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());

        let mut short_secret = config();
        short_secret.jwt.secret = "too-short".to_string();
        assert!(short_secret.validate().is_err());

        let mut no_lifetime = config();
        no_lifetime.jwt.expiration_hours = 0;
        assert!(no_lifetime.validate().is_err());

        let mut one_year = config();
        one_year.jwt.expiration_hours = MAX_EXPIRATION_HOURS;
        assert!(one_year.validate().is_ok());

        let mut too_long = config();
        too_long.jwt.expiration_hours = 10_000_000_000;
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(
            parse_origins("http://localhost:3000, https://jobly.dev,"),
            vec!["http://localhost:3000", "https://jobly.dev"]
        );
        assert!(parse_origins("").is_empty());
    }
}
