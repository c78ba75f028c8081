/// API route handlers, one module per resource
///
/// - `health`: Health check
/// - `auth`: Token and self-registration
/// - `companies`: Company CRUD and filtered listing
/// - `jobs`: Job CRUD and filtered listing
/// - `users`: User management and job applications

pub mod auth;
pub mod companies;
pub mod health;
pub mod jobs;
pub mod users;
