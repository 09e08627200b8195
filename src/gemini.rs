//! Gemini API client
//!
//! Wraps the `generateContent` endpoint behind the [`ContentGenerator`] trait so
//! the requesters can run against the live API or a scripted double.
//! Uses a long-lived reqwest::Client for connection pooling.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::config::{self, Settings};
use crate::error::ConverterError;
use crate::models::GroundingChunk;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// How the provider should shape its answer
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationMode {
    /// Free text, augmented with live web search
    SearchGrounded { temperature: f32 },
    /// JSON constrained to a caller-supplied schema
    Structured { schema: serde_json::Value },
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub mode: GenerationMode,
}

#[derive(Debug, Clone, Default)]
pub struct GeneratedContent {
    pub text: Option<String>,
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// Anything that can answer a prompt
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> crate::Result<GeneratedContent>;
}

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(settings: &Settings) -> crate::Result<Self> {
        let mut builder = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8);

        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Explicit key wins; otherwise the environment is consulted on every call
    fn resolve_api_key(&self) -> crate::Result<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    fn resolve_api_key_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> crate::Result<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| config::api_key_with(lookup))
            .ok_or_else(|| {
                ConverterError::ConfigError(format!(
                    "{} not configured",
                    config::API_KEY_VARS.join(" / ")
                ))
            })
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> crate::Result<GeneratedContent> {
        let api_key = self.resolve_api_key()?;
        let url = self.endpoint();

        let body = GeminiRequest::from_request(&request);
        let grounded = matches!(request.mode, GenerationMode::SearchGrounded { .. });

        info!(model = %self.model, grounded, "Calling Gemini API");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!("Gemini API request failed: {}", e);
                ConverterError::LlmError(format!("Gemini API error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(ConverterError::LlmError(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to parse Gemini response: {}", e);
            ConverterError::LlmError(format!("Gemini parse error: {}", e))
        })?;

        let content = gemini_response.into_content();

        info!(
            text_len = content.text.as_deref().map(str::len).unwrap_or(0),
            sources = content.grounding_chunks.len(),
            "Gemini response received"
        );

        Ok(content)
    }
}

//
// ================= Wire types =================
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

impl GeminiRequest {
    fn from_request(request: &GenerateRequest) -> Self {
        let contents = vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(request.prompt.clone()),
            }],
        }];

        match &request.mode {
            GenerationMode::SearchGrounded { temperature } => Self {
                contents,
                tools: vec![Tool {
                    google_search: GoogleSearch {},
                }],
                generation_config: GenerationConfig {
                    temperature: Some(*temperature),
                    response_mime_type: None,
                    response_schema: None,
                },
            },
            GenerationMode::Structured { schema } => Self {
                contents,
                tools: vec![],
                generation_config: GenerationConfig {
                    temperature: None,
                    response_mime_type: Some("application/json".to_string()),
                    response_schema: Some(schema.clone()),
                },
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

impl GeminiResponse {
    /// Only the first candidate is used
    fn into_content(self) -> GeneratedContent {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return GeneratedContent::default();
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        GeneratedContent {
            text: if text.is_empty() { None } else { Some(text) },
            grounding_chunks: candidate
                .grounding_metadata
                .map(|m| m.grounding_chunks)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grounded_request_serialization() {
        let request = GenerateRequest {
            prompt: "Convert 10 USD to EUR".to_string(),
            mode: GenerationMode::SearchGrounded { temperature: 0.7 },
        };

        let json = serde_json::to_value(GeminiRequest::from_request(&request)).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Convert 10 USD to EUR");
        assert!(json["tools"][0]["googleSearch"].is_object());
        assert!(json["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn test_structured_request_serialization() {
        let request = GenerateRequest {
            prompt: "history".to_string(),
            mode: GenerationMode::Structured {
                schema: json!({ "type": "OBJECT" }),
            },
        };

        let json = serde_json::to_value(GeminiRequest::from_request(&request)).unwrap();
        assert!(json.get("tools").is_none());
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_response_extracts_text_and_sources() {
        let raw = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "RESULT_RATE: 0.92\n" }, { "text": "SUMMARY: ok" }] },
                "finishReason": "STOP",
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://example.com", "title": "Example" } },
                        { "web": { "title": "No link" } }
                    ]
                }
            }]
        });

        let parsed: GeminiResponse = serde_json::from_value(raw).unwrap();
        let content = parsed.into_content();
        assert_eq!(content.text.as_deref(), Some("RESULT_RATE: 0.92\nSUMMARY: ok"));
        assert_eq!(content.grounding_chunks.len(), 2);
        assert!(content.grounding_chunks[1].web.as_ref().unwrap().uri.is_none());
    }

    #[test]
    fn test_empty_response_has_no_text() {
        let parsed: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        let content = parsed.into_content();
        assert!(content.text.is_none());
        assert!(content.grounding_chunks.is_empty());
    }

    #[test]
    fn test_explicit_key_is_preferred() {
        let settings = Settings::default().with_api_key("explicit");
        let client = GeminiClient::new(&settings).unwrap();
        assert_eq!(client.resolve_api_key().unwrap(), "explicit");
        assert!(client.endpoint().ends_with("/models/gemini-3-flash-preview:generateContent"));
        assert!(!client.endpoint().contains("key="));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let client = GeminiClient::new(&Settings::default()).unwrap();

        let err = client.resolve_api_key_with(|_| None).unwrap_err();
        assert!(matches!(err, ConverterError::ConfigError(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        let blank = GeminiClient::new(&Settings::default().with_api_key("  ")).unwrap();
        assert!(blank.resolve_api_key_with(|_| None).is_err());
    }

    #[test]
    fn test_env_key_fallback_order() {
        let client = GeminiClient::new(&Settings::default()).unwrap();

        let key = client
            .resolve_api_key_with(|name| (name == "API_KEY").then(|| "fallback".to_string()))
            .unwrap();
        assert_eq!(key, "fallback");

        let key = client
            .resolve_api_key_with(|name| Some(format!("{}-value", name)))
            .unwrap();
        assert_eq!(key, "GEMINI_API_KEY-value");
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_key() {
        let mut settings = Settings::default().with_api_key("SUPERSECRETKEY123");
        settings.base_url = "http://127.0.0.1:1".to_string();
        let client = GeminiClient::new(&settings).unwrap();

        let err = client
            .generate(GenerateRequest {
                prompt: "Convert 1 USD to EUR".to_string(),
                mode: GenerationMode::SearchGrounded { temperature: 0.7 },
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ConverterError::LlmError(_)));
        assert!(!err.to_string().contains("SUPERSECRETKEY123"));
    }
}
