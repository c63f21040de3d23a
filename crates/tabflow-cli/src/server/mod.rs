//! HTTP server startup and lifecycle management.
//!
//! Binds the configured address, serves the router and drains in-flight
//! requests when a termination signal arrives.

mod error;
mod http_server;
mod lifecycle;

use axum::Router;
pub use error::{ServerError, ServerResult};
use http_server::serve_http;

use crate::config::ServerConfig;

/// Starts the HTTP server and runs it until a termination signal is received.
///
/// `on_shutdown` runs as soon as the signal arrives, before in-flight
/// requests are drained.
///
/// # Errors
///
/// Returns an error if:
/// - The server configuration is invalid
/// - Cannot bind to the specified address/port
/// - Server encounters a fatal error during operation
/// - In-flight requests outlive the shutdown timeout
pub async fn serve<H>(app: Router, config: ServerConfig, on_shutdown: H) -> ServerResult<()>
where
    H: FnOnce() + Send + 'static,
{
    serve_http(app, config, on_shutdown).await
}
