/// Database layer for Jobly
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool, created at startup and injected into repositories
/// - `migrations`: Schema migration runner
/// - `sql`: Partial-update and filter compilers used by the repositories
///
/// Repositories themselves live in the `models` module at crate root level.
///
/// # Example
///
/// ```no_run
/// use jobly_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
pub mod sql;
