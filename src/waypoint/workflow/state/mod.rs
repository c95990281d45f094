// SPDX-License-Identifier: MIT

//! State management for graph workflows
//!
//! This module provides:
//! - `StateSchema` - the fields a workflow state may hold, with their reducers
//! - `WorkflowState` - runtime state storage with reducer support
//! - `StateUpdate` - a partial update returned by a node
//! - `Message` - one conversational turn

mod message;
mod schema;
mod store;
mod update;

pub use message::Message;
pub use schema::{FieldType, ReducerType, StateFieldDef, StateSchema};
pub use store::WorkflowState;
pub use update::{FieldPatch, StateUpdate};
