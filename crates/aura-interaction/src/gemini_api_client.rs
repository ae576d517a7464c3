//! GeminiApiClient - Direct REST API implementation for Gemini.
//!
//! Sends a [`GenerationRequest`] to the `generateContent` endpoint and returns
//! the concatenated text of the first candidate.

use async_trait::async_trait;
use aura_core::gateway::{
    ContentPart, GenerationClient, GenerationError, GenerationRequest, Turn,
};
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiApiClient {
    /// Creates a new client with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Points the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/{model}:generateContent",
            self.base_url.trim_end_matches('/')
        )
    }

    async fn send_request(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| GenerationError {
                status: None,
                retryable: err.is_connect() || err.is_timeout(),
                message: format!("Gemini API request failed: {}", err.without_url()),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            if let Some(delay) = parse_retry_after(response.headers().get("retry-after")) {
                tracing::warn!(
                    "[GeminiApiClient] Server asked to retry after {}s",
                    delay.as_secs()
                );
            }
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            GenerationError::new(format!(
                "Failed to parse Gemini response: {}",
                err.without_url()
            ))
        })?;

        Ok(extract_text_response(parsed))
    }
}

#[async_trait]
impl GenerationClient for GeminiApiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = GenerateContentRequest::from(request);
        self.send_request(&request.model, &body).await
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: SystemInstruction,
    generation_config: GenerationConfig,
}

impl From<&GenerationRequest> for GenerateContentRequest {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            contents: request.contents.iter().map(Content::from).collect(),
            system_instruction: SystemInstruction {
                parts: vec![Part::Text {
                    text: request.system_instruction.clone(),
                }],
            },
            generation_config: GenerationConfig {
                temperature: request.sampling.temperature,
                top_p: request.sampling.top_p,
            },
        }
    }
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

impl From<&Turn> for Content {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role.as_str(),
            parts: turn.parts.iter().map(Part::from).collect(),
        }
    }
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

impl From<&ContentPart> for Part {
    fn from(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => Part::Text { text: text.clone() },
            ContentPart::InlineData { mime_type, data } => Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: mime_type.clone(),
                    data: data.clone(),
                },
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Joins the text parts of the first candidate; no text yields `""`.
fn extract_text_response(response: GenerateContentResponse) -> String {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn map_http_error(status: StatusCode, body: String) -> GenerationError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    GenerationError {
        status: Some(status.as_u16()),
        message,
        retryable,
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::attachment::Attachment;
    use aura_core::gateway::{RequestBuilder, SamplingConfig};
    use aura_core::session::Message;

    fn request() -> GenerationRequest {
        let prior = vec![
            Message::user("hello", Vec::new()),
            Message::assistant("hi there"),
        ];
        let attachments = vec![Attachment::encode("dot.png", "image/png", &[1, 2, 3])];
        RequestBuilder::new("gemini-test")
            .with_sampling(SamplingConfig {
                temperature: 0.5,
                top_p: 0.25,
            })
            .build("describe this", &prior, &[], &attachments)
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(GenerateContentRequest::from(&request())).unwrap();

        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["text"], "hi there");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "describe this");
        assert_eq!(
            body["contents"][2]["parts"][1]["inlineData"],
            serde_json::json!({"mimeType": "image/png", "data": "AQID"})
        );
        assert!(
            body["systemInstruction"]["parts"][0]["text"]
                .as_str()
                .unwrap()
                .contains("Neural Knowledge Base is empty.")
        );
        assert_eq!(
            body["generationConfig"],
            serde_json::json!({"temperature": 0.5, "topP": 0.25})
        );
    }

    #[test]
    fn test_endpoint_includes_model_but_not_key() {
        let client = GeminiApiClient::new("secret").with_base_url("http://localhost:8080/models/");
        assert_eq!(
            client.endpoint("gemini-test"),
            "http://localhost:8080/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_extract_joins_first_candidate_parts() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "Hello, "}, {"text": "world"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(extract_text_response(response), "Hello, world");
    }

    #[test]
    fn test_extract_without_candidates_is_empty() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_text_response(response), "");

        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(extract_text_response(blocked), "");
    }

    #[test]
    fn test_map_http_error_reads_error_body() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#
                .to_string(),
        );
        assert_eq!(err.status, Some(429));
        assert_eq!(err.message, "RESOURCE_EXHAUSTED: Quota exceeded");
        assert!(err.retryable);
    }

    #[test]
    fn test_map_http_error_plain_body() {
        let err = map_http_error(StatusCode::BAD_REQUEST, "bad request".to_string());
        assert_eq!(err.message, "bad request");
        assert!(!err.retryable);
    }

    #[test]
    fn test_parse_retry_after() {
        let header = HeaderValue::from_static("12");
        assert_eq!(parse_retry_after(Some(&header)), Some(Duration::from_secs(12)));
        let date = HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_retry_after(Some(&date)), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_generation_error() {
        let client = GeminiApiClient::new("k").with_base_url("http://127.0.0.1:9/models");
        let err = client.generate(&request()).await.unwrap_err();
        assert_eq!(err.status, None);
        assert!(err.message.starts_with("Gemini API request failed"));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_api_key() {
        let client =
            GeminiApiClient::new("TOPSECRETKEY").with_base_url("http://127.0.0.1:9/models");
        let err = client.generate(&request()).await.unwrap_err();
        assert!(!err.message.contains("TOPSECRETKEY"));
        assert!(!err.to_string().contains("TOPSECRETKEY"));
    }
}
