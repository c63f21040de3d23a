//! Workflow execution engine.
//!
//! This module provides the runtime for executing built workflow graphs:
//! - [`Engine`]: the scheduler that runs a graph and reduces its result
//! - [`EngineConfig`]: configuration options
//! - [`ExecutionContext`]: per-run payload and output map
//! - [`RunOutcome`]: what a successful run returns

mod config;
mod context;
mod executor;
mod outcome;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use context::ExecutionContext;
pub use executor::Engine;
pub use outcome::RunOutcome;

/// Tracing target for engine operations.
pub const TRACING_TARGET: &str = "tabflow_runtime::engine";
