// SPDX-License-Identifier: MIT

//! Country-facts agent
//!
//! Asks which country the user is from, finds nearby countries, then shares
//! one unusual historical fact about each of them:
//!
//! ```text
//! start -> awaiting_subject <-> (no country named, suspend)
//!       -> subject_resolved -> processing_batch (loops per country)
//!       -> complete -> finished
//! ```

mod collaborators;
mod nodes;

pub use collaborators::{
    Collaborators, Extraction, FactSource, LlmExtractor, LlmFactSource, LlmRelatedFinder,
    ModelGenerator, RelatedFinder, SubjectExtractor, TextGenerator,
};
pub use nodes::{ClosingNode, DiscoveryNode, ExtractionNode, FactNode, GreetingNode};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

use crate::waypoint::config::AppConfig;
use crate::waypoint::workflow::error::ValidationError;
use crate::waypoint::workflow::graph::{
    CompiledGraph, ExecutorConfig, GraphBuilder, GraphExecutor, Phase, Route,
};
use crate::waypoint::workflow::state::{FieldType, Message, ReducerType, StateSchema};

pub const GRAPH_NAME: &str = "country-facts";

/// Node ids
pub const GREET: &str = "greet";
pub const EXTRACT_SUBJECT: &str = "extract_subject";
pub const FIND_RELATED: &str = "find_related";
pub const LOOKUP_FACT: &str = "lookup_fact";
pub const CLOSE: &str = "close";

/// State field names
pub mod fields {
    pub const MESSAGES: &str = "messages";
    pub const PRIMARY_SUBJECT: &str = "primary_subject";
    pub const DERIVED_LIST: &str = "derived_list";
    pub const ACCUMULATED_RESULTS: &str = "accumulated_results";
    pub const CURRENT_PHASE: &str = "current_phase";
    pub const WORK_QUEUE: &str = "work_queue";
    pub const COMPLETED_ITEMS: &str = "completed_items";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountryPhase {
    Start,
    AwaitingSubject,
    SubjectResolved,
    ProcessingBatch,
    Complete,
    Finished,
}

impl Phase for CountryPhase {
    const ALL: &'static [Self] = &[
        CountryPhase::Start,
        CountryPhase::AwaitingSubject,
        CountryPhase::SubjectResolved,
        CountryPhase::ProcessingBatch,
        CountryPhase::Complete,
        CountryPhase::Finished,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            CountryPhase::Start => "start",
            CountryPhase::AwaitingSubject => "awaiting_subject",
            CountryPhase::SubjectResolved => "subject_resolved",
            CountryPhase::ProcessingBatch => "processing_batch",
            CountryPhase::Complete => "complete",
            CountryPhase::Finished => "finished",
        }
    }
}

static SCHEMA: Lazy<StateSchema> = Lazy::new(|| {
    use fields::*;
    StateSchema::new()
        .field(MESSAGES, FieldType::Array, ReducerType::Append)
        .field(PRIMARY_SUBJECT, FieldType::String, ReducerType::Replace)
        .field(DERIVED_LIST, FieldType::Array, ReducerType::Replace)
        .field(ACCUMULATED_RESULTS, FieldType::Object, ReducerType::Merge)
        .field_with_default(
            CURRENT_PHASE,
            FieldType::String,
            ReducerType::Replace,
            json!(CountryPhase::Start.as_str()),
        )
        .field(WORK_QUEUE, FieldType::Array, ReducerType::Replace)
        .field(COMPLETED_ITEMS, FieldType::Array, ReducerType::Append)
});

/// State schema of the country-facts graph
pub fn schema() -> StateSchema {
    SCHEMA.clone()
}

/// Typed view of the country-facts state
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CountryState {
    pub messages: Vec<Message>,
    pub primary_subject: Option<String>,
    pub derived_list: Vec<String>,
    pub accumulated_results: BTreeMap<String, String>,
    pub current_phase: CountryPhase,
    pub work_queue: Vec<String>,
    pub completed_items: Vec<String>,
}

impl CountryState {
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Wire the five nodes and the phase table, leaving room for breakpoints
pub fn graph_builder(
    collaborators: Collaborators,
    related_count: usize,
) -> GraphBuilder<CountryPhase> {
    GraphBuilder::new(GRAPH_NAME, schema())
        .add_node(GREET, GreetingNode)
        .add_node(EXTRACT_SUBJECT, ExtractionNode::new(collaborators.extractor))
        .add_node(
            FIND_RELATED,
            DiscoveryNode::new(collaborators.related, related_count),
        )
        .add_node(LOOKUP_FACT, FactNode::new(collaborators.facts))
        .add_node(CLOSE, ClosingNode)
        .set_entry(GREET)
        .set_resume(EXTRACT_SUBJECT)
        .phase_field(fields::CURRENT_PHASE)
        .messages_field(fields::MESSAGES)
        .route(CountryPhase::Start, Route::goto(GREET))
        .route(CountryPhase::AwaitingSubject, Route::Suspend)
        .route(CountryPhase::SubjectResolved, Route::goto(FIND_RELATED))
        .route(CountryPhase::ProcessingBatch, Route::goto(LOOKUP_FACT))
        .route(CountryPhase::Complete, Route::goto(CLOSE))
        .route(CountryPhase::Finished, Route::End)
}

pub fn build_graph(
    collaborators: Collaborators,
    related_count: usize,
) -> Result<CompiledGraph<CountryPhase>, ValidationError> {
    graph_builder(collaborators, related_count).compile()
}

/// Build the graph and an executor configured from `config`
pub fn executor(
    collaborators: Collaborators,
    config: &AppConfig,
) -> Result<GraphExecutor<CountryPhase>, ValidationError> {
    let graph = build_graph(collaborators, config.agent.related_count)?;
    Ok(GraphExecutor::new(graph).with_config(ExecutorConfig::from(&config.engine)))
}
