//! HTTP server startup with a bounded graceful shutdown.

use std::future::{Future, pending};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Notify;

use super::lifecycle::serve_with_shutdown;
use super::{ServerError, ServerResult};
use crate::config::ServerConfig;
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Starts an HTTP server with graceful shutdown.
///
/// On SIGINT or SIGTERM the server stops accepting connections, runs
/// `on_shutdown` and waits up to the configured shutdown timeout for
/// in-flight requests.
///
/// # Errors
///
/// Returns an error if:
/// - Server configuration is invalid
/// - Cannot bind to the specified address/port
/// - Server encounters a fatal error during operation
/// - In-flight requests outlive the shutdown timeout
pub async fn serve_http<H>(
    app: Router,
    server_config: ServerConfig,
    on_shutdown: H,
) -> ServerResult<()>
where
    H: FnOnce() + Send + 'static,
{
    if let Err(validation_error) = server_config.validate() {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            error = %validation_error,
            "Invalid server configuration"
        );

        return Err(ServerError::InvalidConfig(validation_error.to_string()));
    }

    let server_addr = server_config.server_addr();
    let listener = TcpListener::bind(server_addr).await.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            addr = %server_addr,
            error = %err,
            "Failed to bind to address"
        );
        ServerError::bind_error(server_addr, err)
    })?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        addr = %server_addr,
        "Successfully bound to address"
    );

    let shutdown_timeout = server_config.shutdown_timeout();
    serve_with_shutdown(&server_config, || async move {
        serve_until_drained(listener, app, shutdown_timeout, termination_signal(), on_shutdown)
            .await
    })
    .await
}

/// Serves until `trigger` resolves and in-flight requests finish, or until
/// `shutdown_timeout` elapses after the trigger.
///
/// `on_shutdown` runs once, as soon as the trigger fires.
async fn serve_until_drained<T, H>(
    listener: TcpListener,
    app: Router,
    shutdown_timeout: Duration,
    trigger: T,
    on_shutdown: H,
) -> ServerResult<()>
where
    T: Future<Output = &'static str> + Send + 'static,
    H: FnOnce() + Send + 'static,
{
    let signalled = Arc::new(Notify::new());
    let notify = Arc::clone(&signalled);

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let cause = trigger.await;
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            cause,
            timeout_secs = shutdown_timeout.as_secs(),
            "Graceful shutdown initiated"
        );
        on_shutdown();
        notify.notify_one();
    })
    .into_future();

    let deadline = async move {
        signalled.notified().await;
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = server => result.map_err(ServerError::Runtime),
        () = deadline => {
            tracing::warn!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                timeout_secs = shutdown_timeout.as_secs(),
                "In-flight requests outlived the shutdown timeout"
            );
            Err(ServerError::ShutdownTimeout(shutdown_timeout))
        }
    }
}

/// Resolves with the name of the first termination signal delivered.
///
/// A signal whose handler cannot be installed is logged and never fires.
async fn termination_signal() -> &'static str {
    let interrupt = async {
        match signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(err) => unavailable("SIGINT", err).await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "SIGTERM"
            }
            Err(err) => unavailable("SIGTERM", err).await,
        }
    };

    #[cfg(not(unix))]
    let terminate = pending::<&'static str>();

    tokio::select! {
        cause = interrupt => cause,
        cause = terminate => cause,
    }
}

async fn unavailable(name: &'static str, err: std::io::Error) -> &'static str {
    tracing::error!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        signal = name,
        error = %err,
        "Failed to install signal handler"
    );
    pending().await
}
