//! # Jobly Shared Library
//!
//! Data layer and authentication primitives used by the Jobly API server.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool, migrations and SQL fragment compilers
//! - `models`: Company, job and user repositories
//! - `auth`: Passwords, JWTs, authentication middleware and authorization rules

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Jobly shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
