/*!
 * Tests for provider construction and request shaping
 */

use serde_json::json;
use subgloss::app_config::{ProviderConfig, TranslationConfig, TranslationProvider};
use subgloss::errors::ConfigError;
use subgloss::providers::anthropic::Anthropic;
use subgloss::providers::gemini::Gemini;
use subgloss::providers::ollama::Ollama;
use subgloss::providers::openai::OpenAI;
use subgloss::providers::{build_provider, CompletionRequest};

fn structured_request() -> CompletionRequest {
    CompletionRequest::new("translate these")
        .system("You are a subtitle translator.")
        .schema(json!({
            "type": "object",
            "properties": { "translatedLines": { "type": "array" } },
            "required": ["translatedLines"]
        }))
        .temperature(0.3)
}

#[test]
fn test_buildProvider_withConfiguredKey_shouldUseSelectedProvider() {
    let mut config = TranslationConfig::default();
    config.provider = TranslationProvider::OpenAI;
    let mut openai = ProviderConfig::new(TranslationProvider::OpenAI);
    openai.api_key = "sk-test".to_string();
    config.available_providers = vec![openai];

    let provider = build_provider(&config).unwrap();
    assert_eq!(provider.name(), "OpenAI");
}

#[test]
fn test_buildProvider_withoutKey_shouldNameTheEnvVar() {
    if std::env::var("GEMINI_API_KEY").is_ok() {
        return;
    }
    let mut config = TranslationConfig::default();
    config.provider = TranslationProvider::Gemini;
    config.available_providers = vec![ProviderConfig::new(TranslationProvider::Gemini)];

    match build_provider(&config) {
        Err(ConfigError::MissingCredential { env_var, .. }) => assert_eq!(env_var, "GEMINI_API_KEY"),
        other => panic!("expected a missing credential, got {:?}", other.map(|p| p.name().to_string())),
    }
}

#[test]
fn test_gemini_apiUrl_shouldTargetGenerateContentWithKey() {
    let gemini = Gemini::new("abc123", "", "gemini-2.5-flash", 30);
    let url = gemini.api_url().unwrap();
    assert_eq!(url.host_str(), Some("generativelanguage.googleapis.com"));
    assert_eq!(url.path(), "/v1beta/models/gemini-2.5-flash:generateContent");
    assert_eq!(url.query(), Some("key=abc123"));
}

#[test]
fn test_gemini_buildRequest_withSchema_shouldRequestJson() {
    let body = serde_json::to_value(Gemini::build_request(&structured_request())).unwrap();
    assert_eq!(body["contents"][0]["role"], "user");
    assert_eq!(body["contents"][0]["parts"][0]["text"], "translate these");
    assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are a subtitle translator.");
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert!(body["generationConfig"]["responseSchema"].is_object());
}

#[test]
fn test_gemini_buildRequest_withPlainPrompt_shouldOmitGenerationConfig() {
    let body = serde_json::to_value(Gemini::build_request(&CompletionRequest::new("terms?"))).unwrap();
    assert!(body.get("generationConfig").is_none());
    assert!(body.get("systemInstruction").is_none());
}

#[test]
fn test_openai_buildRequest_shouldUseJsonSchemaFormat() {
    let body = serde_json::to_value(OpenAI::build_request("gpt-4o-mini", &structured_request())).unwrap();
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["response_format"]["type"], "json_schema");
    assert_eq!(body["response_format"]["json_schema"]["strict"], true);
}

#[test]
fn test_anthropic_buildRequest_shouldAppendSchemaToSystemPrompt() {
    let body =
        serde_json::to_value(Anthropic::build_request("claude-3-5-haiku-latest", &structured_request())).unwrap();
    let system = body["system"].as_str().unwrap();
    assert!(system.starts_with("You are a subtitle translator."));
    assert!(system.contains("translatedLines"));
    assert_eq!(body["messages"][0]["content"], "translate these");
}

#[test]
fn test_ollama_baseUrl_shouldAddSchemeAndDropSlash() {
    assert_eq!(Ollama::new("", "m", 5).base_url(), "http://localhost:11434");
    assert_eq!(Ollama::new("gpu-box:11434/", "m", 5).base_url(), "http://gpu-box:11434");
    assert_eq!(Ollama::new("https://llm.lan", "m", 5).base_url(), "https://llm.lan");
}

#[test]
fn test_ollama_parseResponseBody_withStreamedLines_shouldConcatenate() {
    let body = "{\"response\":\"{\\\"a\\\":\",\"done\":false}\n{\"response\":\"1}\",\"done\":true}\n";
    assert_eq!(Ollama::parse_response_body(body).unwrap(), "{\"a\":1}");
    assert!(Ollama::parse_response_body("").is_err());
}
