// SPDX-License-Identifier: MIT

//! Anthropic Model - Claude Messages API implementation

use super::{GenerationConfig, Model};
use crate::adk::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;

const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Anthropic Claude model implementation
pub struct AnthropicModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl AnthropicModel {
    /// Create a new AnthropicModel
    ///
    /// Requires `ANTHROPIC_API_KEY` environment variable to be set.
    /// Optionally uses `ANTHROPIC_BASE_URL` for custom endpoints.
    pub fn new(model_name: String) -> Result<Self, ModelError> {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ModelError::ApiKeyMissing("Anthropic".to_string()))?;
        let base_url = env::var("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com/v1".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
            base_url,
        })
    }

    /// Build the request body; the system instruction is a top-level field
    fn request_body(
        model_name: &str,
        system: &str,
        user: &str,
        config: Option<&GenerationConfig>,
    ) -> Value {
        let mut body = json!({
            "model": model_name,
            "system": system,
            "messages": [
                { "role": "user", "content": [{ "type": "text", "text": user }] }
            ],
            "max_tokens": config
                .and_then(|c| c.max_output_tokens)
                .unwrap_or(DEFAULT_MAX_TOKENS)
        });

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                body["temperature"] = json!(temp);
            }
            if let Some(top_p) = cfg.top_p {
                body["top_p"] = json!(top_p);
            }
        }

        body
    }

    /// Concatenate the text blocks of a Messages API response
    fn parse_response(response: &Value) -> Result<String, ModelError> {
        let content_blocks = response["content"]
            .as_array()
            .ok_or_else(|| ModelError::invalid_response("No content in Anthropic response"))?;

        if let Some(stop_reason) = response["stop_reason"].as_str() {
            log::debug!("Anthropic stop reason: {}", stop_reason);
        }

        let text: String = content_blocks
            .iter()
            .filter(|block| block["type"].as_str() == Some("text"))
            .filter_map(|block| block["text"].as_str())
            .collect();

        if text.is_empty() {
            return Err(ModelError::invalid_response(
                "Anthropic response has no text blocks",
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl Model for AnthropicModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn generate(
        &self,
        system: &str,
        user: &str,
        config: Option<&GenerationConfig>,
    ) -> Result<String, ModelError> {
        let url = format!("{}/messages", self.base_url);
        let body = Self::request_body(&self.model_name, system, user, config);

        log::debug!(
            "Anthropic request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(ModelError::api("Anthropic", text));
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("Anthropic response: {}", resp_json);

        Self::parse_response(&resp_json)
    }
}
