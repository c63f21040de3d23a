#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use tabflow_server::handler::routes;
use tabflow_server::middleware::{RouterObservabilityExt, RouterRecoveryExt, RouterSecurityExt};
use tabflow_server::service::ServiceState;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "tabflow_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "tabflow_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "tabflow_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.validate()?;
    cli.log();

    let state = ServiceState::from_config(&cli.service)
        .context("failed to create service state")?;
    let runner = state.runner().clone();
    let router = create_router(state, &cli);

    server::serve(router, cli.server, move || {
        runner.close();
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "Workflow runner closed to new runs"
        );
    })
    .await?;

    Ok(())
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Recovery (outermost) - catches panics and enforces timeouts
/// 2. Observability - request IDs and tracing spans
/// 3. Security - CORS and body size limits
/// 4. Routes (innermost) - workflow and monitor handlers
fn create_router(state: ServiceState, cli: &Cli) -> Router {
    routes()
        .with_state(state)
        .with_security(&cli.middleware.cors, cli.service.max_upload_bytes)
        .with_observability()
        .with_recovery(&cli.middleware.recovery)
}
