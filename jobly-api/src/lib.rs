//! # Jobly API Server Library
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from environment variables
//! - `error`: Error envelope and HTTP status mapping
//! - `extract`: Validating request extractors
//! - `middleware`: Route guards and security headers
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
