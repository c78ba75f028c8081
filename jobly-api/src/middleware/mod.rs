/// Middleware modules for the API server
///
/// - `auth`: Per-route authorization guards
/// - `security`: Security response headers

pub mod auth;
pub mod security;
