use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use super::{preview, transport_error, CompletionRequest, Provider};
use crate::errors::ProviderError;

/// OpenAI client for the Chat Completions API
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for bearer authentication
    api_key: String,
    /// Base URL including the version segment, e.g. `https://api.openai.com/v1`
    endpoint: String,
    /// Model name
    model: String,
    /// Client-side timeout in seconds
    timeout_secs: u64,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// `json_schema` response format when structured output is required
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
}

/// Chat message
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// One completion choice
#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            timeout_secs,
        }
    }

    fn api_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://api.openai.com/v1/chat/completions".to_string()
        } else {
            format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
        }
    }

    /// Build the request body for a provider-neutral request
    pub fn build_request(model: &str, request: &CompletionRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system_instruction {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: Some(system.clone()),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: Some(request.prompt.clone()),
        });

        let response_format = request.response_schema.as_ref().map(|schema| {
            json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "structured_response",
                    "strict": true,
                    "schema": schema,
                }
            })
        });

        ChatCompletionRequest {
            model: model.to_string(),
            messages,
            temperature: request.temperature,
            response_format,
        }
    }

    /// Content of the first choice
    pub fn extract_text_from_response(
        response: &ChatCompletionResponse,
    ) -> Result<String, ProviderError> {
        let choice = response
            .choices
            .first()
            .ok_or_else(|| ProviderError::ParseError("OpenAI response has no choices".to_string()))?;

        match choice.message.content.as_deref() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            _ => Err(ProviderError::ParseError(format!(
                "OpenAI response has no content (finish reason: {})",
                choice.finish_reason.as_deref().unwrap_or("unknown")
            ))),
        }
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let body = Self::build_request(&self.model, &request);
        debug!("Sending OpenAI request to model {}", self.model);

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;

        if !status.is_success() {
            error!("OpenAI API error ({}): {}", status, preview(&text));
            return Err(ProviderError::from_status(status.as_u16(), preview(&text)));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text).map_err(|e| {
            ProviderError::ParseError(format!("Failed to parse OpenAI API response: {}", e))
        })?;
        Self::extract_text_from_response(&parsed)
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}
