// SPDX-License-Identifier: MIT

//! Application configuration
//!
//! Loaded from an optional YAML file, then overridden from the environment:
//!
//! ```yaml
//! engine:
//!   node_timeout_secs: 30
//!   max_steps: 100
//! model:
//!   provider: openai
//!   name: gpt-4o-mini
//!   temperature: 0.7
//! agent:
//!   related_count: 5
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::adk::model::{GenerationConfig, Provider};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub agent: AgentSettings,
}

/// Executor limits
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_node_timeout_secs")]
    pub node_timeout_secs: u64,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node_timeout_secs: default_node_timeout_secs(),
            max_steps: default_max_steps(),
        }
    }
}

/// Which model backs the text-generation collaborator
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ModelSettings {
    /// Inferred from `name` when absent
    pub provider: Option<Provider>,
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_temperature")]
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: None,
            name: default_model_name(),
            temperature: default_temperature(),
            max_output_tokens: None,
        }
    }
}

impl ModelSettings {
    pub fn provider(&self) -> Provider {
        self.provider.unwrap_or_else(|| Provider::infer(&self.name))
    }

    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            top_p: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AgentSettings {
    /// How many related subjects discovery asks for
    #[serde(default = "default_related_count")]
    pub related_count: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            related_count: default_related_count(),
        }
    }
}

/// Node steps in one country-facts resume besides the per-subject lookups
const RESUME_OVERHEAD_STEPS: usize = 3;

fn default_node_timeout_secs() -> u64 {
    60
}

fn default_max_steps() -> usize {
    100
}

fn default_model_name() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> Option<f32> {
    Some(0.7)
}

fn default_related_count() -> usize {
    5
}

impl AppConfig {
    /// Load a configuration file, then apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse_yaml(&content)?.with_env()
    }

    /// Parse a configuration from a YAML string
    pub fn parse_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `WAYPOINT_*` and `MODEL_PROVIDER` environment overrides
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = lookup("WAYPOINT_NODE_TIMEOUT_SECS") {
            self.engine.node_timeout_secs = parse_env("WAYPOINT_NODE_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("WAYPOINT_MAX_STEPS") {
            self.engine.max_steps = parse_env("WAYPOINT_MAX_STEPS", &v)?;
        }
        if let Some(v) = lookup("WAYPOINT_MODEL") {
            self.model.name = v;
        }
        if let Some(v) = lookup("MODEL_PROVIDER") {
            self.model.provider = Some(
                v.parse()
                    .map_err(|e| ConfigError::Invalid(format!("MODEL_PROVIDER: {}", e)))?,
            );
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.node_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "engine.node_timeout_secs must be positive".into(),
            ));
        }
        if self.engine.max_steps == 0 {
            return Err(ConfigError::Invalid("engine.max_steps must be positive".into()));
        }
        if self.agent.related_count == 0 {
            return Err(ConfigError::Invalid(
                "agent.related_count must be positive".into(),
            ));
        }
        // One resume runs extraction, discovery, a fact per subject and the close
        let needed = self.agent.related_count.saturating_add(RESUME_OVERHEAD_STEPS);
        if needed > self.engine.max_steps {
            return Err(ConfigError::Invalid(format!(
                "engine.max_steps ({}) is too small for agent.related_count ({}): a run needs {} steps",
                self.engine.max_steps, self.agent.related_count, needed
            )));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} has invalid value '{}'", key, value)))
}
