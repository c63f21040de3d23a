//! The closed table of step types.
//!
//! A [`NodeRegistry`] maps type identifiers to descriptors holding each
//! type's metadata, config schema and constructor. It is assembled once at
//! start-up and is read-only afterwards.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::node::{ConfigError, ConfigSchema, Node, NodeConfig, NodeMetadata, NodeType, builtin};

/// Tracing target for registry operations.
pub const TRACING_TARGET: &str = "tabflow_runtime::registry";

/// Constructor of a type-erased step from a validated config.
pub type NodeFactory = fn(&NodeConfig) -> Result<Box<dyn Node>, ConfigError>;

/// Side-effect-free semantic check of a schema-validated config.
pub type ConfigCheck = fn(&NodeConfig) -> Result<(), ConfigError>;

/// Everything the registry knows about one step type.
#[derive(Debug, Clone, Copy)]
pub struct NodeDescriptor {
    type_id: &'static str,
    metadata: fn() -> NodeMetadata,
    schema: fn() -> ConfigSchema,
    check: ConfigCheck,
    factory: NodeFactory,
}

impl NodeDescriptor {
    /// Creates the descriptor of a step type.
    pub fn of<T: NodeType>() -> Self {
        Self {
            type_id: T::TYPE_ID,
            metadata: T::metadata,
            schema: T::schema,
            check: T::check,
            factory: construct::<T>,
        }
    }

    /// Returns the type identifier.
    pub fn type_id(&self) -> &'static str {
        self.type_id
    }

    /// Returns the static metadata.
    pub fn metadata(&self) -> NodeMetadata {
        (self.metadata)()
    }

    /// Returns the config schema.
    pub fn schema(&self) -> ConfigSchema {
        (self.schema)()
    }

    /// Runs the type's semantic config check without constructing anything.
    pub fn check(&self, config: &NodeConfig) -> Result<(), ConfigError> {
        (self.check)(config)
    }

    /// Constructs a step from a validated config.
    pub fn construct(&self, config: &NodeConfig) -> Result<Box<dyn Node>, ConfigError> {
        (self.factory)(config)
    }

    /// Returns a serializable description for tooling.
    pub fn info(&self) -> NodeTypeInfo {
        NodeTypeInfo {
            type_id: self.type_id,
            metadata: self.metadata(),
            schema: self.schema(),
        }
    }
}

fn construct<T: NodeType>(config: &NodeConfig) -> Result<Box<dyn Node>, ConfigError> {
    Ok(Box::new(T::from_config(config)?))
}

/// Serializable description of a step type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeTypeInfo {
    /// Type identifier.
    #[serde(rename = "type")]
    pub type_id: &'static str,
    /// Static metadata.
    #[serde(flatten)]
    pub metadata: NodeMetadata,
    /// Accepted configuration fields.
    pub schema: ConfigSchema,
}

/// A node type was not found in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown node type '{node_type}' (supported: {})", .supported.join(", "))]
pub struct UnknownNodeType {
    /// The requested type identifier.
    pub node_type: String,
    /// Every registered type identifier.
    pub supported: Vec<String>,
}

/// Immutable mapping from type identifier to step descriptor.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    descriptors: BTreeMap<&'static str, NodeDescriptor>,
}

impl NodeRegistry {
    /// Returns a registry holding the built-in step types.
    pub fn builtin() -> Self {
        Self::builder().with_builtin().build()
    }

    /// Returns a builder for assembling a registry.
    pub fn builder() -> NodeRegistryBuilder {
        NodeRegistryBuilder::default()
    }

    /// Looks up a step type.
    pub fn resolve(&self, node_type: &str) -> Result<&NodeDescriptor, UnknownNodeType> {
        self.descriptors
            .get(node_type)
            .ok_or_else(|| UnknownNodeType {
                node_type: node_type.to_owned(),
                supported: self.supported_types().map(str::to_owned).collect(),
            })
    }

    /// Returns whether a step type is registered.
    pub fn contains(&self, node_type: &str) -> bool {
        self.descriptors.contains_key(node_type)
    }

    /// Iterates over the registered type identifiers in sorted order.
    pub fn supported_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors.keys().copied()
    }

    /// Iterates over the registered descriptors in type-identifier order.
    pub fn descriptors(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.descriptors.values()
    }

    /// Returns the number of registered step types.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns whether no step type is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Builder for [`NodeRegistry`].
#[derive(Debug, Default)]
#[must_use = "the registry is only usable after calling build()"]
pub struct NodeRegistryBuilder {
    descriptors: BTreeMap<&'static str, NodeDescriptor>,
}

impl NodeRegistryBuilder {
    /// Registers a step type, replacing any type with the same identifier.
    pub fn register<T: NodeType>(self) -> Self {
        self.with_descriptor(NodeDescriptor::of::<T>())
    }

    /// Registers a descriptor.
    pub fn with_descriptor(mut self, descriptor: NodeDescriptor) -> Self {
        if self.descriptors.insert(descriptor.type_id, descriptor).is_some() {
            tracing::warn!(
                target: TRACING_TARGET,
                node_type = descriptor.type_id,
                "Node type registered twice, keeping the latest"
            );
        }
        self
    }

    /// Registers every built-in step type.
    pub fn with_builtin(self) -> Self {
        builtin::register(self)
    }

    /// Freezes the registry.
    pub fn build(self) -> NodeRegistry {
        NodeRegistry {
            descriptors: self.descriptors,
        }
    }
}
