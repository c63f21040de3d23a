//! Liveness check handler.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use tabflow_runtime::registry::NodeRegistry;

use crate::handler::response::HealthResponse;
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "tabflow_server::handler::monitors";

#[tracing::instrument(skip_all)]
async fn health_status(State(registry): State<Arc<NodeRegistry>>) -> Json<HealthResponse> {
    tracing::trace!(target: TRACING_TARGET, "Health status requested");
    Json(HealthResponse::ok(registry.len()))
}

/// Returns a [`Router`] with all health monitoring routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/", get(health_status))
}
