//! Minimal OpenAI-compatible chat completion client.
//!
//! Used by the semantic extractor and the synthesis service. Only plain
//! chat completions are needed, so this is a thin wrapper over `reqwest`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LlmConfig;

/// LLM client errors.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Configuration error (invalid settings, client build failure)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response, empty choices)
    #[error("API error: {0}")]
    Api(String),

    /// Parse error (unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseRaw {
    choices: Vec<ChoiceRaw>,
}

#[derive(Debug, Deserialize)]
struct ChoiceRaw {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct LlmClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    /// Set a custom base URL (for proxies, compatible providers, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a system + user prompt and return the reply text.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::system(system), Message::user(user)],
            temperature: Some(0.0),
        };
        self.chat_completion(request).await
    }

    pub async fn chat_completion(&self, request: ChatRequest) -> Result<String, LlmError> {
        let start = Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "LLM request failed");
                LlmError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "LLM API error");
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let raw: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Api("No response content".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "LLM chat completion"
        );

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(base_url: &str) -> LlmConfig {
        LlmConfig {
            api_key: "test-key".into(),
            base_url: base_url.into(),
            model: "test-model".into(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "test-model"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#)
            .create_async()
            .await;

        let client = LlmClient::new(&config(&server.url())).unwrap();
        let reply = client.complete("system", "user").await.unwrap();

        assert_eq!(reply, "hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let client = LlmClient::new(&config(&server.url())).unwrap();
        let err = client.complete("system", "user").await.unwrap_err();

        assert!(matches!(err, LlmError::Api(msg) if msg.contains("rate limited")));
    }

    #[tokio::test]
    async fn empty_choices_is_an_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = LlmClient::new(&config(&server.url())).unwrap();
        assert!(matches!(
            client.complete("system", "user").await,
            Err(LlmError::Api(_))
        ));
    }
}
