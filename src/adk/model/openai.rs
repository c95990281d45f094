// SPDX-License-Identifier: MIT

//! OpenAI Model - Chat Completions API implementation

use super::{GenerationConfig, Model};
use crate::adk::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;

/// OpenAI chat model implementation
pub struct OpenAIModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl OpenAIModel {
    /// Create a new OpenAIModel
    ///
    /// Requires `OPENAI_API_KEY` environment variable to be set.
    /// Optionally uses `OPENAI_BASE_URL` for custom endpoints.
    pub fn new(model_name: String) -> Result<Self, ModelError> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ModelError::ApiKeyMissing("OpenAI".to_string()))?;
        let base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
            base_url,
        })
    }

    /// Build the request body for a system + user exchange
    fn request_body(
        model_name: &str,
        system: &str,
        user: &str,
        config: Option<&GenerationConfig>,
    ) -> Value {
        let mut body = json!({
            "model": model_name,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ]
        });

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                body["temperature"] = json!(temp);
            }
            if let Some(max_tokens) = cfg.max_output_tokens {
                body["max_tokens"] = json!(max_tokens);
            }
            if let Some(top_p) = cfg.top_p {
                body["top_p"] = json!(top_p);
            }
        }

        body
    }

    /// Pull the assistant text out of a chat completion
    fn parse_response(response: &Value) -> Result<String, ModelError> {
        let choice = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ModelError::invalid_response("No choices in OpenAI response"))?;

        choice["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ModelError::invalid_response("OpenAI response has no text content"))
    }
}

#[async_trait]
impl Model for OpenAIModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn generate(
        &self,
        system: &str,
        user: &str,
        config: Option<&GenerationConfig>,
    ) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&self.model_name, system, user, config);

        log::debug!(
            "OpenAI request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(ModelError::api("OpenAI", text));
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("OpenAI response: {}", resp_json);

        Self::parse_response(&resp_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_messages() {
        let body = OpenAIModel::request_body("gpt-4o-mini", "Be brief", "Hello", None);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "Be brief");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Hello");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_request_body_with_config() {
        let config = GenerationConfig {
            temperature: Some(0.5),
            max_output_tokens: Some(256),
            top_p: None,
        };
        let body = OpenAIModel::request_body("gpt-4o", "s", "u", Some(&config));
        assert_eq!(body["temperature"], json!(0.5));
        assert_eq!(body["max_tokens"], 256);
        assert!(body.get("top_p").is_none());
    }

    #[test]
    fn test_parse_text_response() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Peru"
                }
            }]
        });

        assert_eq!(OpenAIModel::parse_response(&response).unwrap(), "Peru");
    }

    #[test]
    fn test_parse_response_without_choices() {
        let response = json!({ "choices": [] });
        assert!(matches!(
            OpenAIModel::parse_response(&response),
            Err(ModelError::InvalidResponse(_))
        ));
    }
}
