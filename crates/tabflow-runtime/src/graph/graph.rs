//! Built workflow graph.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::definition::{NodeId, WorkflowMetadata};
use crate::error::{WorkflowError, WorkflowResult};
use crate::node::{NodeInstance, NodeStatusSnapshot};

/// Slot binding stored on each edge of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeData {
    /// Output handle named on the source node.
    pub source_handle: Option<String>,
    /// Input slot of the target node the edge feeds.
    pub target_slot: String,
}

/// A validated workflow: constructed nodes plus the edges between them.
///
/// The topology is fixed once built. Node state (status, inputs, output)
/// changes while the engine runs the graph and is cleared by [`reset`].
/// Node indices follow declaration order, which every ordering query uses
/// to break ties.
///
/// [`reset`]: WorkflowGraph::reset
pub struct WorkflowGraph {
    graph: DiGraph<NodeInstance, EdgeData>,
    node_indices: HashMap<NodeId, NodeIndex>,
    metadata: WorkflowMetadata,
}

impl WorkflowGraph {
    pub(crate) fn new(
        graph: DiGraph<NodeInstance, EdgeData>,
        node_indices: HashMap<NodeId, NodeIndex>,
        metadata: WorkflowMetadata,
    ) -> Self {
        Self {
            graph,
            node_indices,
            metadata,
        }
    }

    /// Returns the workflow metadata.
    pub fn metadata(&self) -> &WorkflowMetadata {
        &self.metadata
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns a node by ID.
    pub fn node(&self, id: &NodeId) -> Option<&NodeInstance> {
        self.node_indices
            .get(id)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    /// Returns a mutable node by ID.
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut NodeInstance> {
        self.node_indices
            .get(id)
            .copied()
            .and_then(|idx| self.graph.node_weight_mut(idx))
    }

    /// Iterates over nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeInstance> {
        self.graph.node_weights()
    }

    /// Iterates over node IDs in declaration order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes().map(NodeInstance::id)
    }

    /// Returns the nodes with an edge into `id`, in edge order.
    pub fn predecessors(&self, id: &NodeId) -> Vec<&NodeId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Returns the nodes `id` has an edge into, in edge order.
    pub fn successors(&self, id: &NodeId) -> Vec<&NodeId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: &NodeId, direction: Direction) -> Vec<&NodeId> {
        let Some(&idx) = self.node_indices.get(id) else {
            return Vec::new();
        };

        let mut edges: Vec<_> = self.graph.edges_directed(idx, direction).collect();
        edges.sort_by_key(|edge| edge.id());
        edges
            .into_iter()
            .map(|edge| match direction {
                Direction::Incoming => edge.source(),
                Direction::Outgoing => edge.target(),
            })
            .map(|idx| self.graph[idx].id())
            .collect()
    }

    /// Returns the edges into `id` as `(source, binding)` pairs, in edge order.
    pub fn incoming(&self, id: &NodeId) -> Vec<(&NodeId, &EdgeData)> {
        self.node_indices
            .get(id)
            .map(|&idx| {
                self.incoming_at(idx)
                    .into_iter()
                    .map(|(source, data)| (self.graph[source].id(), data))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns whether `id` has no predecessors.
    pub fn is_source(&self, id: &NodeId) -> bool {
        self.node_indices.get(id).is_some_and(|&idx| {
            self.graph
                .neighbors_directed(idx, Direction::Incoming)
                .next()
                .is_none()
        })
    }

    /// Returns the nodes without successors, in declaration order.
    pub fn sinks(&self) -> Vec<&NodeId> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|idx| self.graph[idx].id())
            .collect()
    }

    /// Returns a topological order of the node IDs.
    ///
    /// Among nodes that are ready at the same time the one declared first
    /// comes first, so the order is the same on every call.
    pub fn topological_order(&self) -> WorkflowResult<Vec<NodeId>> {
        let order = self.topological_indices()?;
        Ok(order.into_iter().map(|idx| self.graph[idx].id().clone()).collect())
    }

    /// Groups nodes into dependency levels.
    ///
    /// Level zero holds the sources; every other node sits one level after
    /// its deepest predecessor. Nodes of one level never depend on each
    /// other and are listed in declaration order.
    pub fn layers(&self) -> WorkflowResult<Vec<Vec<NodeId>>> {
        let layers = self.layer_indices()?;
        Ok(layers
            .into_iter()
            .map(|layer| {
                layer
                    .into_iter()
                    .map(|idx| self.graph[idx].id().clone())
                    .collect()
            })
            .collect())
    }

    /// Returns status snapshots of every node, in declaration order.
    pub fn statuses(&self) -> Vec<NodeStatusSnapshot> {
        self.nodes().map(NodeInstance::status_snapshot).collect()
    }

    /// Clears the run state of every node.
    pub fn reset(&mut self) {
        for node in self.graph.node_weights_mut() {
            node.reset();
        }
    }

    pub(crate) fn node_at(&self, idx: NodeIndex) -> &NodeInstance {
        &self.graph[idx]
    }

    pub(crate) fn node_at_mut(&mut self, idx: NodeIndex) -> &mut NodeInstance {
        &mut self.graph[idx]
    }

    /// Returns mutable references to the nodes at `indices`.
    ///
    /// The result follows index order; duplicate indices are ignored.
    pub(crate) fn nodes_at_mut(&mut self, indices: &[NodeIndex]) -> Vec<&mut NodeInstance> {
        self.graph
            .node_weights_mut()
            .enumerate()
            .filter(|(position, _)| indices.contains(&NodeIndex::new(*position)))
            .map(|(_, node)| node)
            .collect()
    }

    pub(crate) fn incoming_at(&self, idx: NodeIndex) -> Vec<(NodeIndex, &EdgeData)> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .collect();
        edges.sort_by_key(|edge| edge.id());
        edges
            .into_iter()
            .map(|edge| (edge.source(), edge.weight()))
            .collect()
    }

    pub(crate) fn has_incoming(&self, idx: NodeIndex) -> bool {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
            .is_some()
    }

    /// Kahn's algorithm with a min-heap on declaration position.
    pub(crate) fn topological_indices(&self) -> WorkflowResult<Vec<NodeIndex>> {
        let mut in_degree = self.in_degrees();
        let mut ready: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|idx| in_degree[idx.index()] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(idx)) = ready.pop() {
            order.push(idx);
            for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                let target = edge.target().index();
                in_degree[target] -= 1;
                if in_degree[target] == 0 {
                    ready.push(Reverse(edge.target()));
                }
            }
        }

        self.check_complete(order.len(), &in_degree)?;
        Ok(order)
    }

    /// Kahn's algorithm, one level at a time.
    pub(crate) fn layer_indices(&self) -> WorkflowResult<Vec<Vec<NodeIndex>>> {
        let mut in_degree = self.in_degrees();
        let mut current: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|idx| in_degree[idx.index()] == 0)
            .collect();

        let mut placed = 0;
        let mut layers = Vec::new();
        while !current.is_empty() {
            let mut next = Vec::new();
            for &idx in &current {
                for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                    let target = edge.target().index();
                    in_degree[target] -= 1;
                    if in_degree[target] == 0 {
                        next.push(edge.target());
                    }
                }
            }
            next.sort();
            placed += current.len();
            layers.push(std::mem::replace(&mut current, next));
        }

        self.check_complete(placed, &in_degree)?;
        Ok(layers)
    }

    fn in_degrees(&self) -> Vec<usize> {
        let mut in_degree = vec![0; self.graph.node_count()];
        for edge in self.graph.edge_references() {
            in_degree[edge.target().index()] += 1;
        }
        in_degree
    }

    /// Fails with the nodes left unordered when the edges form a cycle.
    fn check_complete(&self, placed: usize, in_degree: &[usize]) -> WorkflowResult<()> {
        if placed == self.graph.node_count() {
            return Ok(());
        }

        let nodes = self
            .graph
            .node_indices()
            .filter(|idx| in_degree[idx.index()] > 0)
            .map(|idx| self.graph[idx].id().clone())
            .collect();
        Err(WorkflowError::CyclicGraph { nodes })
    }
}

impl fmt::Debug for WorkflowGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowGraph")
            .field("node_count", &self.graph.node_count())
            .field("edge_count", &self.graph.edge_count())
            .field("metadata", &self.metadata)
            .finish()
    }
}
