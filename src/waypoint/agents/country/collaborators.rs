// SPDX-License-Identifier: MIT

//! External collaborators used by the country-facts nodes
//!
//! Each trait is one question the agent needs answered. The `Llm*`
//! implementations answer it with a single text-generation call.

use async_trait::async_trait;
use std::sync::Arc;

use crate::adk::model::{GenerationConfig, Model};
use crate::waypoint::workflow::error::CollaboratorError;

const EXTRACT_PROMPT: &str = "Extract the country name from the user's message. \
If a country is mentioned, respond with 'COUNTRY: ' followed by the country name and nothing else. \
If no country is mentioned, respond with 'NONE: ' followed by a short, friendly, conversational \
reply that gently nudges the user to share what country they're from.";

const RELATED_PROMPT: &str = "List exactly {count} countries that are geographically near {country}. \
Respond with only the country names separated by commas, nothing else.";

const FACT_PROMPT: &str = "Provide one unusual and interesting historical fact about {country}. \
The fact should be surprising, educational, and engaging. Keep it to 2-3 sentences.";

/// `generate(system, user) -> text`
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String, CollaboratorError>;
}

/// Text generation backed by an LLM provider
pub struct ModelGenerator {
    model: Arc<dyn Model>,
    config: GenerationConfig,
}

impl ModelGenerator {
    pub fn new(model: Arc<dyn Model>, config: GenerationConfig) -> Self {
        Self { model, config }
    }
}

#[async_trait]
impl TextGenerator for ModelGenerator {
    async fn generate(&self, system: &str, user: &str) -> Result<String, CollaboratorError> {
        log::debug!("Generating with {}", self.model.name());
        Ok(self.model.generate(system, user, Some(&self.config)).await?)
    }
}

/// Result of looking for a subject in free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Subject(String),
    /// No subject; `reply` is an optional follow-up to show the user
    NotFound { reply: Option<String> },
}

#[async_trait]
pub trait SubjectExtractor: Send + Sync {
    async fn extract_subject(&self, text: &str) -> Result<Extraction, CollaboratorError>;
}

/// Finds subjects related to a given one, most relevant first
#[async_trait]
pub trait RelatedFinder: Send + Sync {
    /// At most `count` names; fewer when the domain cannot supply them
    async fn find_related(
        &self,
        subject: &str,
        count: usize,
    ) -> Result<Vec<String>, CollaboratorError>;
}

#[async_trait]
pub trait FactSource: Send + Sync {
    async fn fact_for(&self, subject: &str) -> Result<String, CollaboratorError>;
}

/// The three collaborators a country-facts graph needs
#[derive(Clone)]
pub struct Collaborators {
    pub extractor: Arc<dyn SubjectExtractor>,
    pub related: Arc<dyn RelatedFinder>,
    pub facts: Arc<dyn FactSource>,
}

impl Collaborators {
    /// All three backed by the same text generator
    pub fn from_generator(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            extractor: Arc::new(LlmExtractor::new(generator.clone())),
            related: Arc::new(LlmRelatedFinder::new(generator.clone())),
            facts: Arc::new(LlmFactSource::new(generator)),
        }
    }
}

pub struct LlmExtractor {
    generator: Arc<dyn TextGenerator>,
}

impl LlmExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl SubjectExtractor for LlmExtractor {
    async fn extract_subject(&self, text: &str) -> Result<Extraction, CollaboratorError> {
        let raw = self.generator.generate(EXTRACT_PROMPT, text).await?;
        Ok(parse_extraction(&raw))
    }
}

/// `COUNTRY: x` / `NONE: reply`; a bare answer other than NONE is the subject
fn parse_extraction(raw: &str) -> Extraction {
    let raw = raw.trim();
    if let Some(name) = raw.strip_prefix("COUNTRY:") {
        let name = clean_name(name);
        if !name.is_empty() {
            return Extraction::Subject(name);
        }
        return Extraction::NotFound { reply: None };
    }
    if let Some(rest) = raw.strip_prefix("NONE") {
        let reply = rest.trim_start_matches(':').trim();
        return Extraction::NotFound {
            reply: (!reply.is_empty()).then(|| reply.to_string()),
        };
    }
    let name = clean_name(raw);
    if name.is_empty() {
        Extraction::NotFound { reply: None }
    } else {
        Extraction::Subject(name)
    }
}

pub struct LlmRelatedFinder {
    generator: Arc<dyn TextGenerator>,
}

impl LlmRelatedFinder {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl RelatedFinder for LlmRelatedFinder {
    async fn find_related(
        &self,
        subject: &str,
        count: usize,
    ) -> Result<Vec<String>, CollaboratorError> {
        let system = RELATED_PROMPT
            .replace("{count}", &count.to_string())
            .replace("{country}", subject);
        let raw = self.generator.generate(&system, "Find nearby countries").await?;
        Ok(parse_list(&raw, count))
    }
}

/// Comma-separated names, blanks dropped, capped at `count`
fn parse_list(raw: &str, count: usize) -> Vec<String> {
    raw.split(',')
        .map(clean_name)
        .filter(|name| !name.is_empty())
        .take(count)
        .collect()
}

fn clean_name(name: &str) -> String {
    name.trim()
        .trim_matches(|c: char| c == '.' || c == '"' || c == '\'')
        .trim()
        .to_string()
}

pub struct LlmFactSource {
    generator: Arc<dyn TextGenerator>,
}

impl LlmFactSource {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl FactSource for LlmFactSource {
    async fn fact_for(&self, subject: &str) -> Result<String, CollaboratorError> {
        let system = FACT_PROMPT.replace("{country}", subject);
        let fact = self.generator.generate(&system, "Give me a fact").await?;
        let fact = fact.trim();
        if fact.is_empty() {
            return Err(CollaboratorError::failed(
                "fact lookup",
                format!("empty fact for {}", subject),
            ));
        }
        Ok(fact.to_string())
    }
}
