// SPDX-License-Identifier: MIT

//! The five country-facts nodes

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::collaborators::{Extraction, FactSource, RelatedFinder, SubjectExtractor};
use super::fields::*;
use super::{CountryPhase, CountryState};
use crate::waypoint::workflow::error::{NodeError, ValidationError};
use crate::waypoint::workflow::graph::{Node, Phase};
use crate::waypoint::workflow::state::{Message, StateUpdate, WorkflowState};

const GREETING: &str =
    "Hello! I'm here to share interesting facts about countries near you. What country are you from?";
const FOLLOW_UP: &str =
    "I'd love to tell you about the countries around you! Which country are you from?";
const CLOSING: &str = "That's all the fascinating facts about the countries near you! \
I hope you found these historical tidbits interesting. \
Feel free to ask if you'd like to learn about countries from another region!";

fn phase(p: CountryPhase) -> &'static str {
    p.as_str()
}

/// Opens the conversation
pub struct GreetingNode;

#[async_trait]
impl Node for GreetingNode {
    async fn run(&self, _state: &WorkflowState) -> Result<StateUpdate, NodeError> {
        Ok(StateUpdate::new()
            .set(MESSAGES, Message::agent(GREETING))
            .set(CURRENT_PHASE, phase(CountryPhase::AwaitingSubject)))
    }
}

/// Looks for a country in the latest user message
pub struct ExtractionNode {
    extractor: Arc<dyn SubjectExtractor>,
}

impl ExtractionNode {
    pub fn new(extractor: Arc<dyn SubjectExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl Node for ExtractionNode {
    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, NodeError> {
        let view: CountryState = state.view()?;
        let text = match view.last_message() {
            Some(Message::User(text)) => text,
            // Nothing new from the user; stay where we are
            _ => return Ok(StateUpdate::new()),
        };

        match self.extractor.extract_subject(text).await? {
            Extraction::Subject(subject) => {
                log::info!("Extracted subject: {}", subject);
                Ok(StateUpdate::new()
                    .set(PRIMARY_SUBJECT, subject)
                    .set(CURRENT_PHASE, phase(CountryPhase::SubjectResolved)))
            }
            Extraction::NotFound { reply } => {
                log::info!("No subject in user message, asking again");
                let reply = reply.unwrap_or_else(|| FOLLOW_UP.to_string());
                Ok(StateUpdate::new()
                    .set(MESSAGES, Message::agent(reply))
                    .set(CURRENT_PHASE, phase(CountryPhase::AwaitingSubject)))
            }
        }
    }
}

/// Seeds the batch of related countries
pub struct DiscoveryNode {
    related: Arc<dyn RelatedFinder>,
    count: usize,
}

impl DiscoveryNode {
    pub fn new(related: Arc<dyn RelatedFinder>, count: usize) -> Self {
        Self { related, count }
    }
}

#[async_trait]
impl Node for DiscoveryNode {
    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, NodeError> {
        let view: CountryState = state.view()?;
        let subject = view
            .primary_subject
            .ok_or_else(|| ValidationError::InvalidState("no primary subject to expand".into()))?;

        let mut related = self.related.find_related(&subject, self.count).await?;
        related.truncate(self.count);
        if related.len() < self.count {
            log::warn!(
                "Asked for {} subjects related to {}, got {}",
                self.count,
                subject,
                related.len()
            );
        }

        let summary = if related.is_empty() {
            format!("I couldn't find any countries near {}.", subject)
        } else {
            format!(
                "Great! I found {} {} near {}: {}. Let me share some interesting historical facts about each of them!",
                related.len(),
                if related.len() == 1 { "country" } else { "countries" },
                subject,
                related.join(", ")
            )
        };

        Ok(StateUpdate::new()
            .set(DERIVED_LIST, related.clone())
            .set(WORK_QUEUE, related)
            .reset(COMPLETED_ITEMS)
            .reset(ACCUMULATED_RESULTS)
            .set(MESSAGES, Message::agent(summary))
            .set(CURRENT_PHASE, phase(CountryPhase::ProcessingBatch)))
    }
}

/// Takes the front of the queue and shares one fact about it
pub struct FactNode {
    facts: Arc<dyn FactSource>,
}

impl FactNode {
    pub fn new(facts: Arc<dyn FactSource>) -> Self {
        Self { facts }
    }
}

#[async_trait]
impl Node for FactNode {
    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, NodeError> {
        let view: CountryState = state.view()?;
        let Some((item, remaining)) = view.work_queue.split_first() else {
            return Ok(StateUpdate::new().set(CURRENT_PHASE, phase(CountryPhase::Complete)));
        };

        let fact = self.facts.fact_for(item).await?;

        let mut result = Map::new();
        result.insert(item.clone(), Value::String(fact.clone()));
        let next = if remaining.is_empty() {
            CountryPhase::Complete
        } else {
            CountryPhase::ProcessingBatch
        };

        Ok(StateUpdate::new()
            .set(ACCUMULATED_RESULTS, result)
            .set(COMPLETED_ITEMS, item.clone())
            .set(WORK_QUEUE, remaining.to_vec())
            .set(MESSAGES, Message::agent(format!("**{}**: {}", item, fact)))
            .set(CURRENT_PHASE, phase(next)))
    }
}

/// Says goodbye
pub struct ClosingNode;

#[async_trait]
impl Node for ClosingNode {
    async fn run(&self, _state: &WorkflowState) -> Result<StateUpdate, NodeError> {
        Ok(StateUpdate::new()
            .set(MESSAGES, Message::agent(CLOSING))
            .set(CURRENT_PHASE, phase(CountryPhase::Finished)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waypoint::agents::country::schema;
    use crate::waypoint::workflow::error::CollaboratorError;
    use serde_json::json;
    use std::collections::HashSet;

    struct KeywordExtractor;

    #[async_trait]
    impl SubjectExtractor for KeywordExtractor {
        async fn extract_subject(&self, text: &str) -> Result<Extraction, CollaboratorError> {
            Ok(match text.split_whitespace().find(|w| *w == "Peru") {
                Some(w) => Extraction::Subject(w.to_string()),
                None => Extraction::NotFound { reply: None },
            })
        }
    }

    struct FixedRelated(Vec<&'static str>);

    #[async_trait]
    impl RelatedFinder for FixedRelated {
        async fn find_related(
            &self,
            _subject: &str,
            _count: usize,
        ) -> Result<Vec<String>, CollaboratorError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct EchoFacts;

    #[async_trait]
    impl FactSource for EchoFacts {
        async fn fact_for(&self, subject: &str) -> Result<String, CollaboratorError> {
            Ok(format!("{} has a history.", subject))
        }
    }

    fn empty_state() -> WorkflowState {
        WorkflowState::new(Arc::new(schema()))
    }

    fn with(state: &WorkflowState, update: StateUpdate) -> WorkflowState {
        state.merge(update).unwrap()
    }

    fn view(state: &WorkflowState) -> CountryState {
        state.view().unwrap()
    }

    async fn seeded(related: Vec<&'static str>) -> WorkflowState {
        let state = with(&empty_state(), StateUpdate::new().set(PRIMARY_SUBJECT, "Peru"));
        let node = DiscoveryNode::new(Arc::new(FixedRelated(related)), 5);
        let update = node.run(&state).await.unwrap();
        with(&state, update)
    }

    #[tokio::test]
    async fn test_greeting() {
        let state = with(&empty_state(), GreetingNode.run(&empty_state()).await.unwrap());
        let v = view(&state);
        assert_eq!(v.messages, vec![Message::agent(GREETING)]);
        assert_eq!(v.current_phase, CountryPhase::AwaitingSubject);
    }

    #[tokio::test]
    async fn test_extraction_resolves_subject() {
        let state = with(
            &empty_state(),
            StateUpdate::new()
                .set(MESSAGES, Message::user("I'm from Peru"))
                .set(CURRENT_PHASE, "awaiting_subject"),
        );
        let node = ExtractionNode::new(Arc::new(KeywordExtractor));
        let state = with(&state, node.run(&state).await.unwrap());

        let v = view(&state);
        assert_eq!(v.primary_subject.as_deref(), Some("Peru"));
        assert_eq!(v.current_phase, CountryPhase::SubjectResolved);
        assert_eq!(v.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_extraction_reprompts_without_subject() {
        let state = with(
            &empty_state(),
            StateUpdate::new()
                .set(MESSAGES, Message::user("hello there"))
                .set(CURRENT_PHASE, "awaiting_subject"),
        );
        let node = ExtractionNode::new(Arc::new(KeywordExtractor));
        let state = with(&state, node.run(&state).await.unwrap());

        let v = view(&state);
        assert_eq!(v.primary_subject, None);
        assert_eq!(v.current_phase, CountryPhase::AwaitingSubject);
        assert_eq!(v.last_message(), Some(&Message::agent(FOLLOW_UP)));
    }

    #[tokio::test]
    async fn test_extraction_ignores_agent_message() {
        let state = with(&empty_state(), StateUpdate::new().set(MESSAGES, Message::agent("hi")));
        let node = ExtractionNode::new(Arc::new(KeywordExtractor));
        assert!(node.run(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_discovery_seeds_batch() {
        let state = seeded(vec!["Chile", "Bolivia", "Ecuador", "Colombia", "Brazil"]).await;
        let v = view(&state);

        assert_eq!(v.derived_list, v.work_queue);
        assert_eq!(v.work_queue, vec!["Chile", "Bolivia", "Ecuador", "Colombia", "Brazil"]);
        assert!(v.completed_items.is_empty());
        assert!(v.accumulated_results.is_empty());
        assert_eq!(v.current_phase, CountryPhase::ProcessingBatch);
        assert_eq!(v.messages.len(), 1);
        assert!(v.messages[0].content().contains("found 5 countries near Peru"));
    }

    #[tokio::test]
    async fn test_discovery_tolerates_short_and_long_lists() {
        let v = view(&seeded(vec!["Chile", "Bolivia"]).await);
        assert_eq!(v.work_queue, vec!["Chile", "Bolivia"]);
        assert!(v.messages[0].content().contains("found 2 countries"));

        let v = view(&seeded(vec!["A", "B", "C", "D", "E", "F", "G"]).await);
        assert_eq!(v.work_queue.len(), 5);

        let v = view(&seeded(vec![]).await);
        assert!(v.work_queue.is_empty());
        assert_eq!(v.current_phase, CountryPhase::ProcessingBatch);
    }

    #[tokio::test]
    async fn test_discovery_clears_previous_batch() {
        let state = with(
            &empty_state(),
            StateUpdate::new()
                .set(PRIMARY_SUBJECT, "Peru")
                .set(COMPLETED_ITEMS, json!(["Old"]))
                .set(ACCUMULATED_RESULTS, json!({"Old": "fact"})),
        );
        let node = DiscoveryNode::new(Arc::new(FixedRelated(vec!["Chile"])), 5);
        let v = view(&with(&state, node.run(&state).await.unwrap()));
        assert!(v.completed_items.is_empty());
        assert!(v.accumulated_results.is_empty());
    }

    #[tokio::test]
    async fn test_discovery_without_subject_is_contract_violation() {
        let node = DiscoveryNode::new(Arc::new(FixedRelated(vec!["Chile"])), 5);
        assert!(matches!(
            node.run(&empty_state()).await,
            Err(NodeError::Validation(ValidationError::InvalidState(_)))
        ));
    }

    #[tokio::test]
    async fn test_fact_node_keeps_partition_invariant() {
        let mut state = seeded(vec!["Chile", "Bolivia", "Ecuador", "Colombia", "Brazil"]).await;
        let original: Vec<String> = view(&state).derived_list;
        let node = FactNode::new(Arc::new(EchoFacts));

        for i in 1..=original.len() {
            state = with(&state, node.run(&state).await.unwrap());
            let v = view(&state);

            let queued: HashSet<_> = v.work_queue.iter().collect();
            let done: HashSet<_> = v.completed_items.iter().collect();
            assert!(queued.is_disjoint(&done));
            assert_eq!(queued.len() + done.len(), original.len());
            assert_eq!(v.completed_items, original[..i]);
            assert!(v.accumulated_results.keys().all(|k| original.contains(k)));
            assert_eq!(
                v.last_message(),
                Some(&Message::agent(format!(
                    "**{0}**: {0} has a history.",
                    original[i - 1]
                )))
            );
        }

        let v = view(&state);
        assert_eq!(v.current_phase, CountryPhase::Complete);
        assert_eq!(v.accumulated_results.len(), 5);
    }

    #[tokio::test]
    async fn test_fact_node_on_empty_queue_only_completes() {
        let state = with(
            &empty_state(),
            StateUpdate::new()
                .set(COMPLETED_ITEMS, json!(["Chile"]))
                .set(ACCUMULATED_RESULTS, json!({"Chile": "fact"}))
                .set(CURRENT_PHASE, "processing_batch"),
        );
        let before = view(&state);

        let node = FactNode::new(Arc::new(EchoFacts));
        let after = view(&with(&state, node.run(&state).await.unwrap()));

        assert_eq!(after.current_phase, CountryPhase::Complete);
        assert_eq!(after.completed_items, before.completed_items);
        assert_eq!(after.accumulated_results, before.accumulated_results);
        assert_eq!(after.messages, before.messages);
    }

    #[tokio::test]
    async fn test_closing() {
        let state = with(&empty_state(), ClosingNode.run(&empty_state()).await.unwrap());
        let v = view(&state);
        assert_eq!(v.current_phase, CountryPhase::Finished);
        assert_eq!(v.messages, vec![Message::agent(CLOSING)]);
    }
}
