//! Workflow execution engine.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::context::ExecutionContext;
use super::outcome::RunOutcome;
use super::{EngineConfig, TRACING_TARGET};
use crate::definition::WorkflowDefinition;
use crate::error::{WorkflowError, WorkflowResult};
use crate::graph::{GraphBuilder, WorkflowGraph};
use crate::node::{NodeFailure, NodeInstance, NodeOutput, PAYLOAD_SLOT, Payload};
use crate::registry::NodeRegistry;

/// The workflow execution engine.
///
/// Walks a built graph in dependency order, feeds every node the outputs of
/// its predecessors (or the external payload, for source nodes) and reduces
/// the terminal node's output to the run's final result. The first node
/// failure aborts the run; nodes that have not started stay pending.
///
/// In parallel mode the engine owns a worker pool sized to
/// `max_parallel_nodes`, shared by every run and every clone.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
    pool: Option<Arc<ThreadPool>>,
}

impl Engine {
    /// Creates a new engine with the given configuration.
    ///
    /// Fails only when the node worker pool cannot be started.
    pub fn new(config: EngineConfig) -> WorkflowResult<Self> {
        let pool = if config.is_parallel() {
            let pool = ThreadPoolBuilder::new()
                .num_threads(config.max_parallel_nodes)
                .thread_name(|index| format!("tabflow-node-{index}"))
                .build()
                .map_err(|err| {
                    WorkflowError::Internal(format!("failed to start node worker pool: {err}"))
                })?;
            Some(Arc::new(pool))
        } else {
            None
        };

        tracing::info!(
            target: TRACING_TARGET,
            max_parallel_nodes = config.max_parallel_nodes,
            "Workflow engine initialized"
        );

        Ok(Self { config, pool })
    }

    /// Creates a new sequential engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds a definition against `registry` and executes it once.
    pub fn run(
        &self,
        registry: &NodeRegistry,
        def: WorkflowDefinition,
        payload: Option<Payload>,
    ) -> WorkflowResult<RunOutcome> {
        let mut graph = GraphBuilder::new(registry).build(def)?;
        self.execute(&mut graph, payload)
    }

    /// Executes a built graph.
    ///
    /// Every node is reset to pending first, so a graph can be executed
    /// again with a different payload. Statuses stay inspectable on the
    /// graph after the run, whether it succeeded or failed.
    pub fn execute(
        &self,
        graph: &mut WorkflowGraph,
        payload: Option<Payload>,
    ) -> WorkflowResult<RunOutcome> {
        if graph.is_empty() {
            return Err(WorkflowError::EmptyWorkflow);
        }

        let order = graph.topological_indices()?;
        graph.reset();

        let started = Instant::now();
        let mut ctx = ExecutionContext::new(payload);

        tracing::debug!(
            target: TRACING_TARGET,
            node_count = order.len(),
            parallel = self.pool.is_some(),
            has_payload = ctx.payload().is_some(),
            "Starting workflow run"
        );

        let result = match &self.pool {
            Some(pool) => Self::execute_layers(pool, graph, &mut ctx),
            None => Self::execute_sequential(graph, &order, &mut ctx),
        };

        if let Err(err) = result {
            tracing::warn!(
                target: TRACING_TARGET,
                completed = ctx.completed().len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %err,
                "Workflow run aborted"
            );
            return Err(err);
        }

        let terminal_idx = order
            .last()
            .copied()
            .ok_or_else(|| WorkflowError::Internal("empty execution order".into()))?;
        let terminal = graph.node_at(terminal_idx).id().clone();
        let final_result = ctx
            .output(&terminal)
            .map(|output| output.to_transport())
            .ok_or_else(|| {
                WorkflowError::Internal(format!("terminal node {terminal} produced no output"))
            })?;

        let sinks = graph.sinks().into_iter().cloned().collect();
        let (outputs, completed) = ctx.into_parts();

        tracing::info!(
            target: TRACING_TARGET,
            terminal = %terminal,
            node_count = completed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Workflow run completed"
        );

        Ok(RunOutcome::new(terminal, final_result, completed, sinks, outputs))
    }

    /// Runs nodes one at a time in topological order.
    fn execute_sequential(
        graph: &mut WorkflowGraph,
        order: &[NodeIndex],
        ctx: &mut ExecutionContext,
    ) -> WorkflowResult<()> {
        for &idx in order {
            Self::attach_inputs(graph, idx, ctx)?;
            let is_source = !graph.has_incoming(idx);

            let node = graph.node_at_mut(idx);
            let output = Self::run_node(node)
                .map_err(|failure| failure_error(node, failure, is_source))?;
            ctx.record(node.id(), output)?;
        }
        Ok(())
    }

    /// Runs dependency levels in order, dispatching every node of a level
    /// onto the worker pool.
    ///
    /// A level always runs to completion. When any node of a level fails,
    /// the first failure in declaration order is reported and no later
    /// level is dispatched.
    fn execute_layers(
        pool: &ThreadPool,
        graph: &mut WorkflowGraph,
        ctx: &mut ExecutionContext,
    ) -> WorkflowResult<()> {
        for layer in graph.layer_indices()? {
            for &idx in &layer {
                Self::attach_inputs(graph, idx, ctx)?;
            }

            let nodes = graph.nodes_at_mut(&layer);
            let results: Vec<_> = pool.install(|| {
                nodes
                    .into_par_iter()
                    .map(|node| {
                        panic::catch_unwind(AssertUnwindSafe(|| Self::run_node(node))).ok()
                    })
                    .collect()
            });

            let mut first_error = None;
            for (&idx, result) in layer.iter().zip(results) {
                let is_source = !graph.has_incoming(idx);
                let node = graph.node_at_mut(idx);

                let error = match result {
                    Some(Ok(output)) => {
                        ctx.record(node.id(), output)?;
                        continue;
                    }
                    Some(Err(failure)) => failure_error(node, failure, is_source),
                    None => {
                        node.mark_failed("node execution panicked");
                        WorkflowError::Internal(format!("node {} panicked", node.id()))
                    }
                };
                first_error.get_or_insert(error);
            }

            if let Some(err) = first_error {
                return Err(err);
            }
        }
        Ok(())
    }

    /// Binds predecessor outputs, or the external payload, to a node's slots.
    fn attach_inputs(
        graph: &mut WorkflowGraph,
        idx: NodeIndex,
        ctx: &ExecutionContext,
    ) -> WorkflowResult<()> {
        let mut bindings = Vec::new();
        if graph.has_incoming(idx) {
            for (source, edge) in graph.incoming_at(idx) {
                let source_id = graph.node_at(source).id();
                let output = ctx.output(source_id).ok_or_else(|| {
                    WorkflowError::Internal(format!(
                        "node {source_id} has not produced an output"
                    ))
                })?;
                bindings.push((edge.target_slot.clone(), Arc::clone(output)));
            }
        } else if let Some(payload) = ctx.payload() {
            bindings.push((PAYLOAD_SLOT.to_owned(), Arc::clone(payload)));
        }

        let node = graph.node_at_mut(idx);
        for (slot, value) in bindings {
            node.set_input(slot, value);
        }
        Ok(())
    }

    fn run_node(node: &mut NodeInstance) -> Result<Arc<NodeOutput>, NodeFailure> {
        let started = Instant::now();
        tracing::debug!(
            target: TRACING_TARGET,
            node_id = %node.id(),
            node_type = node.node_type(),
            inputs = node.inputs().len(),
            "Executing node"
        );

        let result = node.run();
        if let Err(failure) = &result {
            tracing::warn!(
                target: TRACING_TARGET,
                node_id = %node.id(),
                node_type = node.node_type(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %failure.error,
                "Node failed"
            );
        }
        result
    }
}

/// Attributes a node failure to the node that raised it.
///
/// A source node that found no payload on the reserved slot reports a
/// missing input; everything else is an execution failure.
fn failure_error(node: &NodeInstance, failure: NodeFailure, is_source: bool) -> WorkflowError {
    let NodeFailure {
        error,
        cleanup_error,
    } = failure;

    if is_source && error.missing_slot() == Some(PAYLOAD_SLOT) {
        return WorkflowError::MissingInput {
            node_id: node.id().clone(),
            node_type: node.node_type().to_owned(),
            slot: PAYLOAD_SLOT.to_owned(),
        };
    }

    WorkflowError::NodeExecution {
        node_id: node.id().clone(),
        node_type: node.node_type().to_owned(),
        message: error.to_string(),
        cleanup_error,
    }
}
