// SPDX-License-Identifier: MIT

//! Graph workflow engine
//!
//! Nodes read a shared [`state::WorkflowState`] and return partial
//! [`state::StateUpdate`]s; reducers merge them; a phase router picks what
//! runs next, or suspends the run until the caller supplies more input.

pub mod error;
pub mod graph;
pub mod state;

pub use error::{CollaboratorError, EngineError, NodeError, RunFailure, ValidationError};
