use serde::{Deserialize, Serialize};

/// Liveness report for `GET /`.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the server answers.
    pub status: String,
    /// Version of the server crate.
    pub version: String,
    /// Number of step types the server can run.
    pub node_types: usize,
}

impl HealthResponse {
    /// Creates a healthy report.
    pub fn ok(node_types: usize) -> Self {
        Self {
            status: "ok".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            node_types,
        }
    }
}
