use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{preview, transport_error, CompletionRequest, Provider};
use crate::errors::ProviderError;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Client for a local or LAN Ollama server (`/api/generate`)
#[derive(Debug)]
pub struct Ollama {
    /// Scheme, host and port, no trailing slash
    base_url: String,
    client: Client,
    model: String,
    timeout_secs: u64,
}

/// `/api/generate` body
#[derive(Debug, Serialize)]
pub struct GenerateBody {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// `"json"` or a JSON schema the output must follow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ModelOptions>,
    /// Always false: the whole response is read at once
    pub stream: bool,
}

/// Sampling parameters
#[derive(Debug, Serialize)]
pub struct ModelOptions {
    pub temperature: f32,
}

/// One `/api/generate` reply, or one line of a streamed reply
#[derive(Debug, Deserialize)]
pub struct GenerateReply {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

impl Ollama {
    /// Create a client; an endpoint without scheme is taken as plain HTTP
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Self {
        let endpoint = endpoint.into();
        let endpoint = endpoint.trim().trim_end_matches('/');
        let base_url = if endpoint.is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("http://{}", endpoint)
        };

        // Ollama only speaks HTTP/1.1
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .http1_only()
            .build()
            .unwrap_or_default();

        Self {
            base_url,
            client,
            model: model.into(),
            timeout_secs,
        }
    }

    /// Base URL the client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the request body for a provider-neutral request
    pub fn build_request(model: &str, request: &CompletionRequest) -> GenerateBody {
        GenerateBody {
            model: model.to_string(),
            prompt: request.prompt.clone(),
            system: request.system_instruction.clone(),
            format: request.response_schema.clone(),
            options: request.temperature.map(|temperature| ModelOptions { temperature }),
            stream: false,
        }
    }

    /// Parse a response body. A server that streams anyway yields JSON lines;
    /// their `response` pieces are concatenated.
    pub fn parse_response_body(body: &str) -> Result<String, ProviderError> {
        if let Ok(reply) = serde_json::from_str::<GenerateReply>(body) {
            return Ok(reply.response);
        }

        let mut generated = String::new();
        let mut pieces = 0usize;
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            let reply: GenerateReply = serde_json::from_str(line).map_err(|e| {
                ProviderError::ParseError(format!("Failed to parse Ollama API response: {}", e))
            })?;
            generated.push_str(&reply.response);
            pieces += 1;
            if reply.done {
                debug!("Ollama streamed {} pieces ({:?} tokens)", pieces, reply.eval_count);
            }
        }

        if pieces == 0 {
            return Err(ProviderError::ParseError("Empty Ollama API response".to_string()));
        }
        Ok(generated)
    }
}

#[async_trait]
impl Provider for Ollama {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let body = Self::build_request(&self.model, &request);
        debug!("Sending Ollama request to model {}", self.model);

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
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
            error!("Ollama API error ({}): {}", status, preview(&text));
            return Err(ProviderError::from_status(status.as_u16(), preview(&text)));
        }

        let generated = Self::parse_response_body(&text).inspect_err(|_| {
            error!("Unparseable Ollama response: {}", preview(&text));
        })?;
        if generated.trim().is_empty() {
            return Err(ProviderError::ParseError("Ollama returned an empty response".to_string()));
        }
        Ok(generated)
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}
