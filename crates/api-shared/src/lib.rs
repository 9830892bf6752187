//! # API Shared
//!
//! Shared utilities and definitions for the PCM REST API.
//!
//! Contains:
//! - Request and response types with OpenAPI schemas (`types` module)
//! - Shared services like `HealthService`
//! - API key authentication
//!
//! Used by `api-rest` and the `pcm-run` binary.

pub mod auth;
pub mod health;
pub mod types;

pub use auth::{validate_api_key, AuthError, API_KEY_HEADER};
pub use health::HealthService;
pub use types::*;
