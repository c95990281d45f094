// SPDX-License-Identifier: MIT

//! waypoint-rs - a graph-based stateful execution engine for multi-turn agents
//!
//! - [adk] - model providers and their error types
//! - [waypoint] - state container, graph executor, and the agents built on it

pub mod adk;
pub mod waypoint;
