// SPDX-License-Identifier: MIT

//! Graph-based workflow execution
//!
//! This module provides:
//! - `Node` - one unit of work: state in, partial update out
//! - `PhaseRouter` - picks the next step from the current phase
//! - `GraphBuilder` / `CompiledGraph` - validated node set and edge table
//! - `GraphExecutor` - drives a run until it suspends or terminates

mod builder;
mod executor;
mod handle;
mod node;
mod router;
mod types;

pub use builder::{CompiledGraph, GraphBuilder};
pub use executor::{ExecutorConfig, GraphExecutor};
pub use handle::{RunHandle, RunStatus};
pub use node::{FnNode, Node};
pub use router::PhaseRouter;
pub use types::{Phase, Route};
