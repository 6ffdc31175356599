use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{preview, transport_error, CompletionRequest, Provider};
use crate::errors::ProviderError;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Client for the Anthropic Messages API
#[derive(Debug)]
pub struct Anthropic {
    client: Client,
    api_key: String,
    /// Base URL without the `/v1/messages` path; empty means the public API
    endpoint: String,
    model: String,
    timeout_secs: u64,
}

/// `POST /v1/messages` body
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// One conversation turn
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// `POST /v1/messages` response
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub usage: Option<Usage>,
    /// `end_turn`, `max_tokens`, ...
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// A content block; only `text` blocks carry output
#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Anthropic {
    /// Output budget; a 100-line chunk of CJK text fits comfortably
    const MAX_TOKENS: u32 = 8192;

    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            timeout_secs,
        }
    }

    fn messages_url(&self) -> String {
        let base = match self.endpoint.trim() {
            "" => DEFAULT_BASE_URL,
            endpoint => endpoint.trim_end_matches('/'),
        };
        format!("{}/v1/messages", base)
    }

    /// Build a messages request. The Messages API has no schema parameter, so
    /// a required schema is appended to the system prompt.
    pub fn build_request(model: &str, request: &CompletionRequest) -> MessagesRequest {
        let mut system = request.system_instruction.clone().unwrap_or_default();
        if let Some(schema) = &request.response_schema {
            if !system.is_empty() {
                system.push_str("\n\n");
            }
            system.push_str(
                "Respond with a single JSON object and nothing else. It must conform to this JSON schema:\n",
            );
            system.push_str(&schema.to_string());
        }

        MessagesRequest {
            model: model.to_string(),
            max_tokens: Self::MAX_TOKENS,
            messages: vec![Message {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            system: (!system.is_empty()).then_some(system),
            temperature: request.temperature,
        }
    }

    /// Concatenated text blocks of a response
    pub fn response_text(response: &MessagesResponse) -> String {
        response
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect()
    }
}

#[async_trait]
impl Provider for Anthropic {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let body = Self::build_request(&self.model, &request);
        debug!("Sending Anthropic request to model {}", self.model);

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
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
            error!("Anthropic API error ({}): {}", status, preview(&text));
            return Err(ProviderError::from_status(status.as_u16(), preview(&text)));
        }

        let parsed: MessagesResponse = serde_json::from_str(&text).map_err(|e| {
            ProviderError::ParseError(format!("Failed to parse Anthropic API response: {}", e))
        })?;
        if let Some(usage) = &parsed.usage {
            debug!("Anthropic usage: {} in, {} out", usage.input_tokens, usage.output_tokens);
        }
        if parsed.stop_reason.as_deref() == Some("max_tokens") {
            warn!("Anthropic response was cut at {} tokens", Self::MAX_TOKENS);
        }

        let output = Self::response_text(&parsed);
        if output.trim().is_empty() {
            return Err(ProviderError::ParseError(format!(
                "Anthropic response has no text (stop reason: {})",
                parsed.stop_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(output)
    }

    fn name(&self) -> &str {
        "Anthropic"
    }
}
