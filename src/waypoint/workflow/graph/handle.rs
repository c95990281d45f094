// SPDX-License-Identifier: MIT

//! Run handles
//!
//! A handle is everything needed to continue a run: it can be serialized,
//! stored by the caller, and passed back to `resume` later, possibly in
//! another process.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::waypoint::workflow::error::ValidationError;
use crate::waypoint::workflow::state::Message;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Created but not started
    Created,
    /// Waiting for externally supplied input
    Suspended,
    /// Stopped at a breakpoint; `continue_run` picks it up without new input
    Paused,
    /// A collaborator fault stopped the run; `retry` may continue it
    Faulted,
    /// A contract violation stopped the run for good
    Aborted,
    /// Reached the end of the graph
    Finished,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Created => "created",
            RunStatus::Suspended => "suspended",
            RunStatus::Paused => "paused",
            RunStatus::Faulted => "faulted",
            RunStatus::Aborted => "aborted",
            RunStatus::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// Snapshot of a run returned by every executor call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHandle {
    pub run_id: Uuid,
    /// Name of the graph this run belongs to
    pub graph: String,
    pub status: RunStatus,
    /// Phase tag at the time of the snapshot
    pub phase: Option<String>,
    /// Messages nodes appended since the previous handle
    #[serde(default)]
    pub emitted: Vec<Message>,
    /// Last consistently merged state
    pub state: Map<String, Value>,
    /// Node that runs on the next `resume`, `retry` or `continue_run`
    pub next_node: Option<String>,
    /// Node invocations across the whole run
    #[serde(default)]
    pub steps: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunHandle {
    pub(crate) fn new(graph: &str, state: Map<String, Value>, phase: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            graph: graph.to_string(),
            status: RunStatus::Created,
            phase,
            emitted: Vec::new(),
            state,
            next_node: None,
            steps: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// No further `resume` or `retry` is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, RunStatus::Finished | RunStatus::Aborted)
    }

    pub fn is_suspended(&self) -> bool {
        self.status == RunStatus::Suspended
    }

    /// Deserialize the state snapshot into a typed view
    pub fn view<T: DeserializeOwned>(&self) -> Result<T, ValidationError> {
        serde_json::from_value(Value::Object(self.state.clone()))
            .map_err(|e| ValidationError::InvalidState(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_handle() {
        let mut state = Map::new();
        state.insert("current_phase".into(), json!("start"));
        let handle = RunHandle::new("demo", state, Some("start".into()));

        assert_eq!(handle.status, RunStatus::Created);
        assert!(!handle.is_terminal());
        assert!(!handle.is_suspended());
        assert_eq!(handle.created_at, handle.updated_at);
        assert_eq!(handle.steps, 0);
    }

    #[test]
    fn test_terminal_statuses() {
        let mut handle = RunHandle::new("demo", Map::new(), None);
        for (status, terminal) in [
            (RunStatus::Suspended, false),
            (RunStatus::Paused, false),
            (RunStatus::Faulted, false),
            (RunStatus::Aborted, true),
            (RunStatus::Finished, true),
        ] {
            handle.status = status;
            assert_eq!(handle.is_terminal(), terminal, "{}", status);
        }
    }

    #[test]
    fn test_json_round_trip() {
        let mut handle = RunHandle::new("demo", Map::new(), Some("awaiting_subject".into()));
        handle.status = RunStatus::Suspended;
        handle.emitted.push(Message::agent("Hello!"));

        let json = serde_json::to_string(&handle).unwrap();
        assert!(json.contains("\"status\":\"suspended\""));
        let back: RunHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }
}
