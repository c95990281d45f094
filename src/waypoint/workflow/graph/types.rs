// SPDX-License-Identifier: MIT

//! Graph workflow type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Outcome of routing after a node completes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "node")]
pub enum Route {
    /// Run this node next
    Goto(String),
    /// Stop and wait for externally supplied input
    Suspend,
    /// The run is finished
    End,
}

impl Route {
    pub fn goto(node: impl Into<String>) -> Self {
        Route::Goto(node.into())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Goto(node) => write!(f, "-> {}", node),
            Route::Suspend => write!(f, "suspend"),
            Route::End => write!(f, "end"),
        }
    }
}

/// A closed set of phase tags driving the router
///
/// Implemented by a fieldless enum; `ALL` must list every variant so the
/// graph can check that each one is routed.
pub trait Phase: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    /// Tag stored in the state's phase field
    fn as_str(&self) -> &'static str;

    fn parse(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == tag)
    }
}
