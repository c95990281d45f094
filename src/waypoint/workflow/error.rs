// SPDX-License-Identifier: MIT

//! Engine fault taxonomy
//!
//! - `ValidationError` - a graph-construction or node-contract bug. Fatal.
//! - `CollaboratorError` - an external call failed or timed out. Recoverable.
//! - `EngineError::SuspensionMisuse` - the caller drove a handle out of order.

use std::time::Duration;
use thiserror::Error;

use crate::adk::error::ModelError;

use super::graph::{RunHandle, RunStatus};
use super::state::FieldType;

/// Contract violations detected while building a graph or merging state
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Unknown state field '{0}'")]
    UnknownField(String),

    #[error("Field '{field}' expects {expected:?}, got {found}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        found: &'static str,
    },

    #[error("Unknown node '{0}'")]
    UnknownNode(String),

    #[error("Node '{0}' registered twice")]
    DuplicateNode(String),

    #[error("Graph has no entry node")]
    MissingEntry,

    #[error("Graph has no resume node")]
    MissingResumeNode,

    #[error("Phase '{0}' has no route")]
    UnroutedPhase(String),

    #[error("Phase value '{0}' is not part of the phase set")]
    UnknownPhase(String),

    #[error("Field '{field}' is misconfigured: {reason}")]
    FieldConfig { field: String, reason: String },

    #[error("State does not match the expected shape: {0}")]
    InvalidState(String),
}

/// Failures of an external collaborator called from inside a node
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{collaborator} failed: {message}")]
    Failed {
        collaborator: String,
        message: String,
    },

    #[error("{collaborator} timed out after {after:?}")]
    Timeout {
        collaborator: String,
        after: Duration,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl CollaboratorError {
    pub fn failed(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }
}

/// What a node invocation may fail with
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Top-level executor error
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation fault: {0}")]
    Validation(#[from] ValidationError),

    #[error("Collaborator fault in node '{node}': {source}")]
    Collaborator {
        node: String,
        #[source]
        source: CollaboratorError,
    },

    #[error("Cannot {operation} a run that is {status}")]
    SuspensionMisuse {
        operation: &'static str,
        status: RunStatus,
    },

    #[error("Run exceeded {limit} steps without suspending or terminating")]
    StepLimit { limit: usize },
}

impl EngineError {
    /// Collaborator faults can be retried; everything else cannot
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::Collaborator { .. })
    }

    pub(crate) fn from_node(node: &str, err: NodeError) -> Self {
        match err {
            NodeError::Collaborator(source) => EngineError::Collaborator {
                node: node.to_string(),
                source,
            },
            NodeError::Validation(e) => EngineError::Validation(e),
        }
    }
}

/// An executor fault together with the last consistent run handle
#[derive(Debug, Error)]
#[error("Run {run_id} failed: {error}", run_id = .handle.run_id)]
pub struct RunFailure {
    pub error: EngineError,
    pub handle: Box<RunHandle>,
}

impl RunFailure {
    pub fn new(error: EngineError, handle: RunHandle) -> Self {
        Self {
            error,
            handle: Box::new(handle),
        }
    }
}
