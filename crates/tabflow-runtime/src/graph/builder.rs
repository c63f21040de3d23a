//! Graph builder: turns a definition into a validated [`WorkflowGraph`].
//!
//! # Build Process
//!
//! 1. **Identity**: node IDs must be unique
//! 2. **Validation**: every node type resolves and every config passes its
//!    schema and its type's semantic check, before any step is constructed
//! 3. **Construction**: each step is instantiated from its validated config
//! 4. **Wiring**: edges must reference known nodes and bind distinct slots
//! 5. **Ordering**: the edges must be acyclic
//! 6. **Setup**: `configure` runs on every node in dependency order
//!
//! Any failure aborts the whole build; no partially built graph escapes.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};

use super::TRACING_TARGET;
use super::graph::{EdgeData, WorkflowGraph};
use crate::definition::{EdgeSpec, NodeId, WorkflowDefinition};
use crate::error::{EdgeIssue, WorkflowError, WorkflowResult};
use crate::node::{DEFAULT_SLOT, NodeInstance, PAYLOAD_SLOT};
use crate::registry::NodeRegistry;

/// Builds workflow graphs against a node registry.
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder<'a> {
    registry: &'a NodeRegistry,
}

impl<'a> GraphBuilder<'a> {
    /// Creates a builder resolving node types through `registry`.
    pub fn new(registry: &'a NodeRegistry) -> Self {
        Self { registry }
    }

    /// Builds a graph from a workflow definition.
    pub fn build(&self, def: WorkflowDefinition) -> WorkflowResult<WorkflowGraph> {
        let mut ids = HashSet::with_capacity(def.nodes.len());
        for spec in &def.nodes {
            if !ids.insert(&spec.id) {
                return Err(WorkflowError::DuplicateNode(spec.id.clone()));
            }
        }

        let mut validated = Vec::with_capacity(def.nodes.len());
        for spec in &def.nodes {
            let descriptor = self.registry.resolve(&spec.node_type).map_err(|source| {
                WorkflowError::UnknownNodeType {
                    node_id: spec.id.clone(),
                    source,
                }
            })?;
            let config = descriptor
                .schema()
                .validate(&spec.config)
                .and_then(|config| descriptor.check(&config).map(|()| config))
                .map_err(|source| WorkflowError::Configuration {
                    node_id: spec.id.clone(),
                    node_type: spec.node_type.clone(),
                    source,
                })?;
            validated.push((descriptor, config));
        }

        let mut graph = DiGraph::with_capacity(def.nodes.len(), def.edges.len());
        let mut node_indices = HashMap::with_capacity(def.nodes.len());
        for (spec, (descriptor, config)) in def.nodes.into_iter().zip(validated) {
            let inner = descriptor.construct(&config).map_err(|source| {
                WorkflowError::Configuration {
                    node_id: spec.id.clone(),
                    node_type: spec.node_type.clone(),
                    source,
                }
            })?;

            let label = spec.label.unwrap_or_else(|| descriptor.metadata().label);
            let node = NodeInstance::new(spec.id.clone(), descriptor.type_id(), label, config, inner);
            node_indices.insert(spec.id, graph.add_node(node));
        }

        let mut bound_slots = HashSet::new();
        for (index, edge) in def.edges.into_iter().enumerate() {
            let (source, target, slot) = Self::resolve_edge(&node_indices, index, &edge)?;
            if !bound_slots.insert((target, slot.clone())) {
                return Err(invalid_edge(index, &edge, EdgeIssue::SlotAlreadyBound(slot)));
            }

            let data = EdgeData {
                source_handle: edge.source_handle,
                target_slot: slot,
            };
            graph.add_edge(source, target, data);
        }

        let mut graph = WorkflowGraph::new(graph, node_indices, def.metadata);
        let order = graph.topological_indices()?;

        for idx in order {
            let node = graph.node_at_mut(idx);
            node.configure().map_err(|err| WorkflowError::NodeSetup {
                node_id: node.id().clone(),
                node_type: node.node_type().to_owned(),
                message: err.to_string(),
            })?;
        }

        tracing::debug!(
            target: TRACING_TARGET,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built workflow graph"
        );
        Ok(graph)
    }

    /// Resolves an edge's endpoints and the slot it binds.
    fn resolve_edge(
        node_indices: &HashMap<NodeId, NodeIndex>,
        index: usize,
        edge: &EdgeSpec,
    ) -> WorkflowResult<(NodeIndex, NodeIndex, String)> {
        let source = node_indices
            .get(&edge.source)
            .copied()
            .ok_or_else(|| invalid_edge(index, edge, EdgeIssue::UnknownSource))?;
        let target = node_indices
            .get(&edge.target)
            .copied()
            .ok_or_else(|| invalid_edge(index, edge, EdgeIssue::UnknownTarget))?;

        let slot = edge
            .target_handle
            .as_deref()
            .map(str::trim)
            .filter(|handle| !handle.is_empty())
            .unwrap_or(DEFAULT_SLOT)
            .to_owned();
        if slot == PAYLOAD_SLOT {
            return Err(invalid_edge(index, edge, EdgeIssue::ReservedSlot(slot)));
        }

        Ok((source, target, slot))
    }
}

fn invalid_edge(index: usize, edge: &EdgeSpec, issue: EdgeIssue) -> WorkflowError {
    WorkflowError::InvalidEdge {
        index,
        from: edge.source.clone(),
        to: edge.target.clone(),
        issue,
    }
}
