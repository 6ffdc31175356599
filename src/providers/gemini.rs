use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

use super::{preview, transport_error, CompletionRequest, Provider};
use crate::errors::ProviderError;

/// Gemini client for the Generative Language `generateContent` endpoint
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key, sent as the `key` query parameter
    api_key: String,
    /// Base URL, with or without the `/v1beta` suffix
    endpoint: String,
    /// Model name, e.g. `gemini-2.5-flash`
    model: String,
    /// Client-side timeout in seconds
    timeout_secs: u64,
}

/// `generateContent` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation turns; a single user turn here
    pub contents: Vec<Content>,

    /// System prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,

    /// Sampling and output-format options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// One turn of content
#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    /// `user` or `model`; absent on system instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Text parts
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A text part
#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

/// Generation options
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// `application/json` when a schema is attached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,

    /// OpenAPI-style schema the response must satisfy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

/// `generateContent` response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    /// Present when the prompt itself was blocked
    #[serde(default)]
    pub prompt_feedback: Option<Value>,
}

/// One response candidate
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl Gemini {
    /// Create a new Gemini client
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

    /// Full `generateContent` URL for the configured model
    pub fn api_url(&self) -> Result<Url, ProviderError> {
        let base = if self.endpoint.trim().is_empty() {
            "https://generativelanguage.googleapis.com".to_string()
        } else {
            self.endpoint.trim().trim_end_matches('/').to_string()
        };
        let base = if base.ends_with("/v1beta") || base.ends_with("/v1") {
            base
        } else {
            format!("{}/v1beta", base)
        };

        let mut url = Url::parse(&format!("{}/models/{}:generateContent", base, self.model))
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid Gemini endpoint: {}", e)))?;
        url.query_pairs_mut().append_pair("key", self.api_key.trim());
        Ok(url)
    }

    /// Build the request body for a provider-neutral request
    pub fn build_request(request: &CompletionRequest) -> GenerateContentRequest {
        let system_instruction = request.system_instruction.as_ref().map(|text| Content {
            role: None,
            parts: vec![Part { text: text.clone() }],
        });

        let mut generation_config = GenerationConfig {
            temperature: request.temperature,
            ..Default::default()
        };
        if let Some(schema) = &request.response_schema {
            generation_config.response_mime_type = Some("application/json".to_string());
            generation_config.response_schema = Some(to_gemini_schema(schema));
        }

        let has_config = generation_config.temperature.is_some()
            || generation_config.response_schema.is_some();

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction,
            generation_config: if has_config { Some(generation_config) } else { None },
        }
    }

    /// Concatenate the text parts of the first candidate
    pub fn extract_text_from_response(
        response: &GenerateContentResponse,
    ) -> Result<String, ProviderError> {
        let candidate = response.candidates.first().ok_or_else(|| {
            match &response.prompt_feedback {
                Some(feedback) => ProviderError::ApiError {
                    status_code: 200,
                    message: format!("Prompt was blocked: {}", feedback),
                },
                None => ProviderError::ParseError("Gemini response has no candidates".to_string()),
            }
        })?;

        let text: String = candidate
            .content
            .as_ref()
            .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::ParseError(format!(
                "Gemini response has no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }
}

#[async_trait]
impl Provider for Gemini {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let url = self.api_url()?;
        let body = Self::build_request(&request);
        debug!("Sending Gemini request to model {}", self.model);

        let response = self
            .client
            .post(url)
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
            error!("Gemini API error ({}): {}", status, preview(&text));
            return Err(ProviderError::from_status(status.as_u16(), preview(&text)));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            ProviderError::ParseError(format!("Failed to parse Gemini API response: {}", e))
        })?;
        Self::extract_text_from_response(&parsed)
    }

    fn name(&self) -> &str {
        "Gemini"
    }
}

/// Rewrite a JSON schema into the dialect `responseSchema` accepts:
/// upper-case type names and no `additionalProperties`.
pub fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                match key.as_str() {
                    "additionalProperties" | "$schema" => continue,
                    "type" => {
                        let upper = value
                            .as_str()
                            .map(|t| Value::String(t.to_uppercase()))
                            .unwrap_or_else(|| value.clone());
                        out.insert(key.clone(), upper);
                    }
                    _ => {
                        out.insert(key.clone(), to_gemini_schema(value));
                    }
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(to_gemini_schema).collect()),
        other => other.clone(),
    }
}
