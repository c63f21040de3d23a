//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - Security: CORS and request body limits
//! - Observability: request IDs and request tracing
//! - Recovery: timeouts and panic handling
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use axum::Router;
//! use tabflow_server::middleware::{
//!     CorsConfig, RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt,
//!     RouterSecurityExt,
//! };
//!
//! let app: Router = Router::new()
//!     .with_recovery(&RecoveryConfig::default())
//!     .with_observability()
//!     .with_security(&CorsConfig::default(), 32 * 1024 * 1024);
//! ```

mod observability;
mod recovery;
mod security;

pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{CorsConfig, RouterSecurityExt};
