//! Edges connecting nodes in a workflow definition.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::NodeId;

/// A directed edge from one node's output to another node's input slot.
///
/// Handles are optional. When `target_handle` is absent the value lands in
/// the target's default input slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Builder)]
#[builder(
    name = "EdgeSpecBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSpec {
    /// Producing node ID.
    #[serde(alias = "from")]
    pub source: NodeId,
    /// Consuming node ID.
    #[serde(alias = "to")]
    pub target: NodeId,
    /// Output handle on the source node.
    #[serde(default, alias = "source_handle", skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub source_handle: Option<String>,
    /// Input slot on the target node.
    #[serde(default, alias = "target_handle", skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub target_handle: Option<String>,
}

impl EdgeSpecBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.source.is_none() {
            return Err("source is required".into());
        }
        if self.target.is_none() {
            return Err("target is required".into());
        }
        Ok(())
    }
}

impl EdgeSpec {
    /// Creates an edge feeding the target's default input slot.
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    /// Routes the edge into a named input slot of the target.
    pub fn with_target_handle(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }

    /// Returns a builder for creating an edge.
    pub fn builder() -> EdgeSpecBuilder {
        EdgeSpecBuilder::default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_editor_and_legacy_keys() {
        let editor: EdgeSpec = serde_json::from_value(json!({
            "id": "e1",
            "source": "a",
            "target": "b",
            "targetHandle": "input_2"
        }))
        .unwrap();
        assert_eq!(editor.target_handle.as_deref(), Some("input_2"));

        let legacy: EdgeSpec = serde_json::from_value(json!({
            "from": 1,
            "to": 2,
            "target_handle": "input_1"
        }))
        .unwrap();
        assert_eq!(legacy.source, NodeId::from("1"));
        assert_eq!(legacy.target, NodeId::from("2"));
        assert_eq!(legacy.target_handle.as_deref(), Some("input_1"));
    }

    #[test]
    fn builder_requires_endpoints() {
        assert!(EdgeSpec::builder().with_source("a").build().is_err());

        let edge = EdgeSpec::builder()
            .with_source("a")
            .with_target("b")
            .with_target_handle("input_2")
            .build()
            .unwrap();
        assert_eq!(edge, EdgeSpec::new("a", "b").with_target_handle("input_2"));
    }
}
