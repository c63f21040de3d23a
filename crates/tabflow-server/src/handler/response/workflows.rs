use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabflow_runtime::definition::NodeId;
use tabflow_runtime::engine::RunOutcome;
use tabflow_runtime::registry::{NodeRegistry, NodeTypeInfo};

/// Result of a successful workflow run.
#[must_use]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunWorkflowResponse {
    /// Always `true`; failures are reported through the error response.
    pub success: bool,
    /// Canonical form of the terminal node's output.
    pub result: Value,
    /// ID of the node whose output is the result.
    pub terminal: NodeId,
    /// Nodes in the order they completed.
    pub order: Vec<NodeId>,
}

impl From<RunOutcome> for RunWorkflowResponse {
    fn from(outcome: RunOutcome) -> Self {
        let terminal = outcome.terminal().clone();
        let order = outcome.order().to_vec();

        Self {
            success: true,
            result: outcome.into_result(),
            terminal,
            order,
        }
    }
}

/// Step types the server can run.
#[must_use]
#[derive(Debug, Clone, Serialize)]
pub struct NodeTypesResponse {
    /// Registered types, sorted by type identifier.
    pub nodes: Vec<NodeTypeInfo>,
}

impl From<&NodeRegistry> for NodeTypesResponse {
    fn from(registry: &NodeRegistry) -> Self {
        Self {
            nodes: registry.descriptors().map(|d| d.info()).collect(),
        }
    }
}
