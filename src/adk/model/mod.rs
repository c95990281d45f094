// SPDX-License-Identifier: MIT

//! Model module - defines the LLM model trait and implementations
//!
//! This module provides the core Model trait and shared types.
//! Model implementations are in their own submodules:
//! - [anthropic] - Anthropic's Claude API
//! - [openai] - OpenAI's Chat Completions API (and compatible endpoints)

pub mod anthropic;
pub mod openai;

use crate::adk::error::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

/// Core trait for LLM model implementations
///
/// A single-shot exchange: one system instruction, one user turn, one text
/// reply. Conversation history lives in workflow state, not in the model.
#[async_trait]
pub trait Model: Send + Sync {
    /// Model identifier as sent to the provider
    fn name(&self) -> &str;

    async fn generate(
        &self,
        system: &str,
        user: &str,
        config: Option<&GenerationConfig>,
    ) -> Result<String, ModelError>;
}

/// Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Anthropic,
}

impl Provider {
    /// Infer the provider from a model name
    pub fn infer(model_name: &str) -> Self {
        if model_name.starts_with("claude") {
            Provider::Anthropic
        } else {
            Provider::OpenAI
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAI => write!(f, "OpenAI"),
            Provider::Anthropic => write!(f, "Anthropic"),
        }
    }
}

impl FromStr for Provider {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "anthropic" => Ok(Provider::Anthropic),
            other => Err(ModelError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Construct a model for the given provider, reading credentials from the environment
pub fn create_model(provider: Provider, model_name: &str) -> Result<Arc<dyn Model>, ModelError> {
    log::info!("Using provider: {} with model: {}", provider, model_name);
    let model: Arc<dyn Model> = match provider {
        Provider::OpenAI => Arc::new(openai::OpenAIModel::new(model_name.to_string())?),
        Provider::Anthropic => Arc::new(anthropic::AnthropicModel::new(model_name.to_string())?),
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_inference() {
        assert_eq!(Provider::infer("claude-3-5-sonnet"), Provider::Anthropic);
        assert_eq!(Provider::infer("gpt-4o-mini"), Provider::OpenAI);
        assert_eq!(Provider::infer("o3-mini"), Provider::OpenAI);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAI);
        assert_eq!("anthropic".parse::<Provider>().unwrap(), Provider::Anthropic);
        assert!(matches!(
            "gemini".parse::<Provider>(),
            Err(ModelError::UnsupportedProvider(p)) if p == "gemini"
        ));
    }
}
