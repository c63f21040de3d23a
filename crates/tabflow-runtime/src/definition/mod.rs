//! Workflow definition types.
//!
//! These are the serializable, front-end facing shapes of a workflow: a list
//! of nodes and a list of edges. They carry no behavior. Turning a definition
//! into something runnable is the job of [`crate::graph::GraphBuilder`].

use serde::{Deserialize, Serialize};

mod edge;
mod metadata;
mod node;

pub use edge::{EdgeSpec, EdgeSpecBuilder};
pub use metadata::WorkflowMetadata;
pub use node::{NodeId, NodeSpec};

use crate::error::WorkflowResult;

/// Serializable workflow definition.
///
/// Nodes keep their declaration order, which the engine uses to break ties
/// between nodes that are ready at the same time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Nodes in declaration order.
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    /// Edges connecting nodes.
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
    /// Workflow metadata.
    #[serde(default)]
    pub metadata: WorkflowMetadata,
}

impl WorkflowDefinition {
    /// Creates an empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a definition from its JSON text.
    pub fn from_json(json: &str) -> WorkflowResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses a definition from raw JSON bytes.
    pub fn from_slice(json: &[u8]) -> WorkflowResult<Self> {
        Ok(serde_json::from_slice(json)?)
    }

    /// Appends a node.
    pub fn with_node(mut self, node: NodeSpec) -> Self {
        self.nodes.push(node);
        self
    }

    /// Appends an edge.
    pub fn with_edge(mut self, edge: EdgeSpec) -> Self {
        self.edges.push(edge);
        self
    }

    /// Returns the node with the given ID, if declared.
    pub fn node(&self, id: &NodeId) -> Option<&NodeSpec> {
        self.nodes.iter().find(|node| &node.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_editor_export() {
        let json = r#"{
            "nodes": [
                { "id": "dndnode_0", "type": "custom", "data": { "node_type": "load_csv" } },
                { "id": "dndnode_1", "type": "custom", "data": { "node_type": "clean_data" } }
            ],
            "edges": [
                { "id": "e0-1", "source": "dndnode_0", "target": "dndnode_1", "sourceHandle": null }
            ]
        }"#;

        let def = WorkflowDefinition::from_json(json).unwrap();
        assert_eq!(def.nodes.len(), 2);
        assert_eq!(def.nodes[1].node_type, "clean_data");
        assert_eq!(def.edges[0].source, NodeId::from("dndnode_0"));
        assert!(def.edges[0].source_handle.is_none());
    }

    #[test]
    fn missing_edges_default_to_empty() {
        let def = WorkflowDefinition::from_json(r#"{ "nodes": [] }"#).unwrap();
        assert!(def.edges.is_empty());
        assert_eq!(def, WorkflowDefinition::new());
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let error = WorkflowDefinition::from_json("{ nodes: ").unwrap_err();
        assert!(error.is_build_error());
    }

    #[test]
    fn builder_style_construction() {
        let def = WorkflowDefinition::new()
            .with_node(NodeSpec::new("a", "load_csv"))
            .with_node(NodeSpec::new("b", "clean_data"))
            .with_edge(EdgeSpec::new("a", "b"));

        assert!(def.node(&NodeId::from("b")).is_some());
        assert!(def.node(&NodeId::from("z")).is_none());
    }
}
