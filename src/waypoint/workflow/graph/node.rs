// SPDX-License-Identifier: MIT

//! Node contract

use async_trait::async_trait;

use crate::waypoint::workflow::error::NodeError;
use crate::waypoint::workflow::state::{StateUpdate, WorkflowState};

/// One step in a graph: reads the state, returns a partial update
///
/// A node never mutates the state it is given. It may make one external
/// call; the result is folded into the returned update. Running a node twice
/// on the same state and discarding one result must be harmless, since the
/// executor re-runs a node on `retry`.
#[async_trait]
pub trait Node: Send + Sync {
    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, NodeError>;
}

/// Adapter turning a synchronous closure into a [`Node`]
pub struct FnNode<F> {
    f: F,
}

impl<F> FnNode<F>
where
    F: Fn(&WorkflowState) -> Result<StateUpdate, NodeError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Node for FnNode<F>
where
    F: Fn(&WorkflowState) -> Result<StateUpdate, NodeError> + Send + Sync,
{
    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, NodeError> {
        (self.f)(state)
    }
}
