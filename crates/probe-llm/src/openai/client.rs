// OpenAI-specific client implementation

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;

use crate::error::Result;
use crate::streaming::{into_byte_stream, ByteStream};
use crate::traits::StreamingClient;
use crate::types::ProbeRequest;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI client (HTTP direct, no SDK)
#[derive(Debug)]
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    /// Create new client with API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::new_with_timeout(api_key, None)
    }

    /// Create new client whose requests give up after `timeout`
    pub fn new_with_timeout(api_key: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))?,
        );

        Ok(Self {
            http_client: build_http_client(headers, timeout)?,
            base_url: OPENAI_API_BASE.to_string(),
        })
    }

    /// Point the client at an OpenAI-compatible server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build chat completion request payload
    pub(crate) fn build_chat_request(&self, request: &ProbeRequest) -> Result<Value> {
        let mut payload = serde_json::json!({
            "model": request.model,
            "messages": serde_json::to_value(&request.messages)?,
            "stream": true,
            "reasoning_effort": request.reasoning_effort,
        });

        // Reasoning models take max_completion_tokens rather than max_tokens
        if let (Some(max_tokens), Some(obj)) = (request.max_completion_tokens, payload.as_object_mut()) {
            obj.insert("max_completion_tokens".to_string(), serde_json::json!(max_tokens));
        }

        Ok(payload)
    }
}

pub(crate) fn build_http_client(headers: HeaderMap, timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

#[async_trait]
impl StreamingClient for OpenAIClient {
    async fn open_stream(&self, request: &ProbeRequest) -> Result<ByteStream> {
        let payload = self.build_chat_request(request)?;
        let url = format!("{}/chat/completions", self.base_url);

        tracing::info!(url = %url, model = %request.model, effort = %request.reasoning_effort, "Sending streaming request");

        let response = self.http_client.post(&url).json(&payload).send().await?;

        Ok(into_byte_stream(response))
    }

    fn describe(&self) -> String {
        format!("OpenAI ({})", self.base_url)
    }
}
