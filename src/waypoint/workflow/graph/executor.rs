// SPDX-License-Identifier: MIT

//! Graph workflow executor
//!
//! Runs nodes one at a time: invoke, merge, route, repeat. A run stops when
//! the router says `Suspend` or `End`, or when something faults. Every exit
//! hands back a [`RunHandle`] carrying the last consistently merged state.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use super::builder::CompiledGraph;
use super::handle::{RunHandle, RunStatus};
use super::types::{Phase, Route};
use crate::waypoint::config::EngineConfig;
use crate::waypoint::workflow::error::{
    CollaboratorError, EngineError, RunFailure, ValidationError,
};
use crate::waypoint::workflow::state::{Message, StateUpdate, WorkflowState};

/// Limits applied to every run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    /// Upper bound on a single node invocation
    pub node_timeout: Duration,
    /// Node invocations allowed per `start`/`resume`/`retry` call
    pub max_steps: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            node_timeout: Duration::from_secs(60),
            max_steps: 100,
        }
    }
}

impl From<&EngineConfig> for ExecutorConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            node_timeout: Duration::from_secs(config.node_timeout_secs),
            max_steps: config.max_steps,
        }
    }
}

/// Drives runs of a compiled graph
///
/// The executor holds no per-run state, so one instance can serve any number
/// of concurrent runs.
pub struct GraphExecutor<P: Phase> {
    graph: Arc<CompiledGraph<P>>,
    config: ExecutorConfig,
}

impl<P: Phase> Clone for GraphExecutor<P> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            config: self.config.clone(),
        }
    }
}

impl<P: Phase> GraphExecutor<P> {
    pub fn new(graph: CompiledGraph<P>) -> Self {
        Self {
            graph: Arc::new(graph),
            config: ExecutorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn graph(&self) -> &CompiledGraph<P> {
        &self.graph
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// A fresh handle with every field at its initial value
    pub fn new_run(&self) -> RunHandle {
        let state = WorkflowState::new(self.graph.schema().clone());
        let phase = state.get_str(self.graph.phase_field()).map(str::to_string);
        RunHandle::new(self.graph.name(), state.into_values(), phase)
    }

    /// Create a run and drive it from the entry node
    pub async fn start(&self) -> Result<RunHandle, RunFailure> {
        self.start_run(self.new_run()).await
    }

    /// Drive a freshly created handle from the entry node
    pub async fn start_run(&self, handle: RunHandle) -> Result<RunHandle, RunFailure> {
        let handle = expect_status(handle, RunStatus::Created, "start")?;
        let (handle, state) = self.restore(handle)?;
        log::info!("Starting run {} of graph '{}'", handle.run_id, self.graph.name());
        let entry = self.graph.entry().to_string();
        self.drive(handle, state, entry).await
    }

    /// Add one externally supplied message and continue from the resume node
    pub async fn resume(
        &self,
        handle: RunHandle,
        input: impl Into<String>,
    ) -> Result<RunHandle, RunFailure> {
        let handle = expect_status(handle, RunStatus::Suspended, "resume")?;
        let (handle, state) = self.restore(handle)?;

        let injected = StateUpdate::new().set(self.graph.messages_field(), Message::user(input));
        let state = match state.merge(injected) {
            Ok(state) => state,
            Err(e) => return Err(RunFailure::new(e.into(), handle)),
        };

        let from = self.graph.resume().to_string();
        if let Some(pending) = handle.next_node.as_deref().filter(|n| *n != from) {
            let error = ValidationError::InvalidState(format!(
                "suspended run is pending at '{}', but runs resume at '{}'",
                pending, from
            ));
            return Err(RunFailure::new(error.into(), handle));
        }
        log::info!("Resuming run {} at node {}", handle.run_id, from);
        self.drive(handle, state, from).await
    }

    /// Re-run the node that hit a collaborator fault
    pub async fn retry(&self, handle: RunHandle) -> Result<RunHandle, RunFailure> {
        let handle = expect_status(handle, RunStatus::Faulted, "retry")?;
        let Some(from) = handle.next_node.clone() else {
            let error = ValidationError::InvalidState("faulted run has no pending node".into());
            return Err(RunFailure::new(error.into(), handle));
        };
        let (handle, state) = self.restore(handle)?;
        log::info!("Retrying run {} at node {}", handle.run_id, from);
        self.drive(handle, state, from).await
    }

    /// Continue a run paused at a breakpoint
    pub async fn continue_run(&self, handle: RunHandle) -> Result<RunHandle, RunFailure> {
        let handle = expect_status(handle, RunStatus::Paused, "continue")?;
        let Some(from) = handle.next_node.clone() else {
            let error = ValidationError::InvalidState("paused run has no pending node".into());
            return Err(RunFailure::new(error.into(), handle));
        };
        let (handle, state) = self.restore(handle)?;
        log::info!("Continuing run {} at node {}", handle.run_id, from);
        self.drive(handle, state, from).await
    }

    /// Rebuild the state from a handle, checking it against the schema
    fn restore(&self, handle: RunHandle) -> Result<(RunHandle, WorkflowState), RunFailure> {
        if handle.graph != self.graph.name() {
            let error = ValidationError::InvalidState(format!(
                "handle belongs to graph '{}', not '{}'",
                handle.graph,
                self.graph.name()
            ));
            return Err(RunFailure::new(error.into(), handle));
        }
        match WorkflowState::from_values(self.graph.schema().clone(), handle.state.clone()) {
            Ok(state) => Ok((handle, state)),
            Err(e) => Err(RunFailure::new(e.into(), handle)),
        }
    }

    async fn drive(
        &self,
        mut handle: RunHandle,
        mut state: WorkflowState,
        from: String,
    ) -> Result<RunHandle, RunFailure> {
        let cursor = state.array_len(self.graph.messages_field());
        let mut current = from;
        let mut steps = 0;

        loop {
            if steps >= self.config.max_steps {
                log::error!(
                    "Run {} exceeded {} steps at node {}",
                    handle.run_id,
                    self.config.max_steps,
                    current
                );
                let error = EngineError::StepLimit {
                    limit: self.config.max_steps,
                };
                return Err(self.fail(handle, state, cursor, error, None));
            }

            let update = match self.invoke(&current, &state).await {
                Ok(update) => update,
                Err(error) => {
                    log::warn!("Node {} failed: {}", current, error);
                    return Err(self.fail(handle, state, cursor, error, Some(current)));
                }
            };

            state = match state.merge(update) {
                Ok(next) => next,
                Err(e) => {
                    log::error!("Node {} returned an invalid update: {}", current, e);
                    return Err(self.fail(handle, state, cursor, e.into(), Some(current)));
                }
            };
            steps += 1;
            handle.steps += 1;

            let route = match self.graph.next_route(&current, &state) {
                Ok(route) => route,
                Err(e) => {
                    log::error!("Routing after node {} failed: {}", current, e);
                    return Err(self.fail(handle, state, cursor, e.into(), None));
                }
            };
            log::info!("Node {} completed, route {}", current, route);

            match route {
                Route::Goto(next) if self.graph.interrupts_after(&current) => {
                    log::info!("Run {} paused after node {}", handle.run_id, current);
                    return Ok(self.settle(handle, state, cursor, RunStatus::Paused, Some(next)));
                }
                Route::Goto(next) => current = next,
                Route::Suspend => {
                    let resume = self.graph.resume().to_string();
                    return Ok(self.settle(handle, state, cursor, RunStatus::Suspended, Some(resume)));
                }
                Route::End => {
                    return Ok(self.settle(handle, state, cursor, RunStatus::Finished, None));
                }
            }
        }
    }

    /// Invoke one node under the configured timeout
    async fn invoke(&self, node_id: &str, state: &WorkflowState) -> Result<StateUpdate, EngineError> {
        let node = self
            .graph
            .node(node_id)
            .ok_or_else(|| ValidationError::UnknownNode(node_id.to_string()))?;

        log::info!("Executing node: {}", node_id);
        match tokio::time::timeout(self.config.node_timeout, node.run(state)).await {
            Ok(result) => result.map_err(|e| EngineError::from_node(node_id, e)),
            Err(_) => Err(EngineError::Collaborator {
                node: node_id.to_string(),
                source: CollaboratorError::Timeout {
                    collaborator: node_id.to_string(),
                    after: self.config.node_timeout,
                },
            }),
        }
    }

    /// Write the state back into the handle
    fn settle(
        &self,
        mut handle: RunHandle,
        state: WorkflowState,
        cursor: usize,
        status: RunStatus,
        next_node: Option<String>,
    ) -> RunHandle {
        handle.emitted = state
            .get(self.graph.messages_field())
            .and_then(|v| v.as_array())
            .map(|messages| {
                messages
                    .iter()
                    .skip(cursor)
                    .filter_map(|m| match serde_json::from_value::<Message>(m.clone()) {
                        Ok(message) => Some(message),
                        Err(e) => {
                            log::warn!("Run {}: skipping malformed message {}: {}", handle.run_id, m, e);
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        handle.phase = state.get_str(self.graph.phase_field()).map(str::to_string);
        handle.status = status;
        handle.next_node = next_node;
        handle.state = state.into_values();
        handle.updated_at = Utc::now();
        handle
    }

    /// Settle into a faulted (recoverable) or aborted handle
    fn fail(
        &self,
        handle: RunHandle,
        state: WorkflowState,
        cursor: usize,
        error: EngineError,
        node: Option<String>,
    ) -> RunFailure {
        let (status, next_node) = if error.is_recoverable() {
            (RunStatus::Faulted, node)
        } else {
            (RunStatus::Aborted, None)
        };
        RunFailure::new(error, self.settle(handle, state, cursor, status, next_node))
    }
}

/// Reject calls that do not fit the handle's lifecycle, leaving it untouched
fn expect_status(
    handle: RunHandle,
    expected: RunStatus,
    operation: &'static str,
) -> Result<RunHandle, RunFailure> {
    if handle.status == expected {
        Ok(handle)
    } else {
        let error = EngineError::SuspensionMisuse {
            operation,
            status: handle.status,
        };
        Err(RunFailure::new(error, handle))
    }
}
