// OpenAI-compatible chat completions client

use crate::buffer_utils::parse_sse_bytes;
use crate::streaming::ChatSseParser;
use crate::traits::{ChatClient, ChatRequest, ChatResponse, EventStream, TokenUsage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI client (HTTP direct, no SDK)
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    /// Create new client with API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, OPENAI_API_BASE)
    }

    /// Create a client for an OpenAI-compatible endpoint
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Body for `/chat/completions`
    fn build_payload(&self, request: ChatRequest, stream: bool) -> Value {
        let mut payload = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "stream": stream,
        });

        if let Some(obj) = payload.as_object_mut() {
            if let Some(temperature) = request.temperature {
                obj.insert("temperature".to_string(), serde_json::json!(temperature));
            }
            if let Some(max_tokens) = request.max_tokens {
                obj.insert("max_tokens".to_string(), serde_json::json!(max_tokens));
            }
        }

        payload
    }

    async fn post_completions(&self, payload: &Value) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(payload)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        tracing::debug!(model = %request.model, messages = request.messages.len(), "Opening chat completion stream");

        let payload = self.build_payload(request, true);
        let response = self.post_completions(&payload).await?;
        Ok(parse_sse_bytes(response.bytes_stream(), ChatSseParser))
    }

    /// Non-streaming call, so token usage is available
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = self.build_payload(request, false);
        let raw: CompletionResponse = self
            .post_completions(&payload)
            .await?
            .json()
            .await
            .context("Failed to parse response")?;

        let choice = raw.choices.into_iter().next();
        Ok(ChatResponse {
            content: choice
                .as_ref()
                .and_then(|c| c.message.content.clone())
                .unwrap_or_default(),
            finish_reason: choice.and_then(|c| c.finish_reason),
            usage: raw.usage,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Content, ContentPart, Message};

    #[test]
    fn test_payload_includes_sampling() {
        let client = OpenAIClient::new("sk-test").unwrap();
        let request = ChatRequest::new(
            "gpt-4o",
            vec![Message::system("draw"), Message::human("a box")],
        )
        .temperature(Some(0.2))
        .max_tokens(Some(512));
        let payload = client.build_payload(request, true);

        assert_eq!(payload["stream"], true);
        assert_eq!(payload["max_tokens"], 512);
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "a box");
    }

    #[test]
    fn test_payload_omits_unset_sampling() {
        let client = OpenAIClient::new("sk-test").unwrap();
        let payload = client.build_payload(ChatRequest::new("m", vec![]), false);

        assert_eq!(payload["stream"], false);
        assert!(payload.get("temperature").is_none());
        assert!(payload.get("max_tokens").is_none());
    }

    #[test]
    fn test_multipart_content_serializes_as_array() {
        let client = OpenAIClient::new("sk-test").unwrap();
        let parts = Content::Parts(vec![ContentPart::Text { text: "box".into() }]);
        let payload = client.build_payload(ChatRequest::new("m", vec![Message::human(parts)]), true);

        assert_eq!(payload["messages"][0]["content"][0]["type"], "text");
        assert_eq!(payload["messages"][0]["content"][0]["text"], "box");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = OpenAIClient::with_base_url("k", "http://localhost:1234/v1/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234/v1");
    }
}
