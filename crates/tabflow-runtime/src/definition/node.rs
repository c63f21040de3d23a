//! Node identifiers and node specifications.

use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Unique identifier for a node in a workflow graph.
///
/// Front-ends send either strings (`"dndnode_0"`) or integers (`1`); both
/// deserialize into the same textual identifier.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node ID from any string-like value.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawNodeId {
            Text(String),
            Integer(i64),
        }

        Ok(match RawNodeId::deserialize(deserializer)? {
            RawNodeId::Text(id) => Self(id),
            RawNodeId::Integer(id) => Self(id.to_string()),
        })
    }
}

/// Declarative description of one node: its ID, step type and raw config.
///
/// Besides the canonical `{ id, type, config }` shape this accepts the legacy
/// `params` key and the editor shape where the step type lives under
/// `data.node_type` (the top-level `type` then names the visual component).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNodeSpec")]
pub struct NodeSpec {
    /// Unique node ID within the workflow.
    pub id: NodeId,
    /// Step type identifier, resolved through the registry.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Raw, unvalidated configuration.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub config: Map<String, Value>,
    /// Optional display label overriding the step's default label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl NodeSpec {
    /// Creates a node spec with an empty config.
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            config: Map::new(),
            label: None,
        }
    }

    /// Replaces the config with the entries of a JSON object.
    ///
    /// Non-object values leave the config empty.
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = match config {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Deserialize)]
struct RawNodeSpec {
    id: NodeId,
    #[serde(rename = "type", default)]
    node_type: Option<String>,
    #[serde(default)]
    config: Option<Map<String, Value>>,
    #[serde(default)]
    params: Option<Map<String, Value>>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    data: Option<RawNodeData>,
}

#[derive(Deserialize)]
struct RawNodeData {
    #[serde(default)]
    node_type: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    config: Option<Map<String, Value>>,
}

impl TryFrom<RawNodeSpec> for NodeSpec {
    type Error = String;

    fn try_from(raw: RawNodeSpec) -> Result<Self, Self::Error> {
        let (data_type, data_label, data_config) = match raw.data {
            Some(data) => (data.node_type, data.label, data.config),
            None => (None, None, None),
        };

        let node_type = data_type
            .or(raw.node_type)
            .ok_or_else(|| format!("node {} does not declare a type", raw.id))?;

        Ok(Self {
            id: raw.id,
            node_type,
            config: raw
                .config
                .or(raw.params)
                .or(data_config)
                .unwrap_or_default(),
            label: raw.label.or(data_label),
        })
    }
}
