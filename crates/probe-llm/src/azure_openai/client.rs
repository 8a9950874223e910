// Azure OpenAI-specific client implementation

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;

use crate::error::{ProbeError, Result};
use crate::openai::build_http_client;
use crate::streaming::{into_byte_stream, ByteStream};
use crate::traits::StreamingClient;
use crate::types::ProbeRequest;

/// Azure OpenAI client (HTTP direct, no SDK)
///
/// Azure OpenAI uses a different endpoint structure and authentication method than OpenAI:
/// - URL: https://{resource}.openai.azure.com/openai/deployments/{deployment}/...
/// - Auth header: api-key instead of Authorization: Bearer
/// - Deployment name is passed via the model field of the probe request
#[derive(Debug)]
pub struct AzureOpenAIClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_version: String,
}

impl AzureOpenAIClient {
    /// Create new Azure OpenAI client with builder pattern
    pub fn builder() -> AzureOpenAIClientBuilder {
        AzureOpenAIClientBuilder::default()
    }

    /// Azure takes the deployment from the URL, so the body has no model
    pub(crate) fn build_chat_request(&self, request: &ProbeRequest) -> Result<Value> {
        let mut payload = serde_json::json!({
            "messages": serde_json::to_value(&request.messages)?,
            "stream": true,
            "reasoning_effort": request.reasoning_effort,
        });

        if let (Some(max_tokens), Some(obj)) = (request.max_completion_tokens, payload.as_object_mut()) {
            obj.insert("max_completion_tokens".to_string(), serde_json::json!(max_tokens));
        }

        Ok(payload)
    }

    /// Build the full URL for an Azure OpenAI endpoint
    fn build_url(&self, deployment_name: &str, path: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint, deployment_name, path, self.api_version
        )
    }
}

/// Builder for AzureOpenAIClient
#[derive(Default)]
pub struct AzureOpenAIClientBuilder {
    api_key: Option<String>,
    endpoint: Option<String>,
    api_version: Option<String>,
    timeout: Option<Duration>,
}

impl AzureOpenAIClientBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the Azure OpenAI endpoint (base URL)
    /// Example: "https://my-resource.openai.azure.com"
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<AzureOpenAIClient> {
        let api_key = self
            .api_key
            .ok_or_else(|| ProbeError::Config("API key is required".to_string()))?;
        let endpoint = self
            .endpoint
            .ok_or_else(|| ProbeError::Config("Endpoint is required".to_string()))?;
        let api_version = self
            .api_version
            .ok_or_else(|| ProbeError::Config("API version is required".to_string()))?;

        let endpoint = endpoint.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("api-key", HeaderValue::from_str(&api_key)?);

        Ok(AzureOpenAIClient {
            http_client: build_http_client(headers, self.timeout)?,
            endpoint,
            api_version,
        })
    }
}

#[async_trait]
impl StreamingClient for AzureOpenAIClient {
    async fn open_stream(&self, request: &ProbeRequest) -> Result<ByteStream> {
        let payload = self.build_chat_request(request)?;
        let url = self.build_url(&request.model, "chat/completions");

        tracing::info!(url = %url, deployment = %request.model, effort = %request.reasoning_effort, "Sending streaming request");

        let response = self.http_client.post(&url).json(&payload).send().await?;

        Ok(into_byte_stream(response))
    }

    fn describe(&self) -> String {
        format!("Azure OpenAI ({}, api-version {})", self.endpoint, self.api_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> AzureOpenAIClient {
        AzureOpenAIClient::builder()
            .api_key("test-key")
            .endpoint("https://test-resource.openai.azure.com/")
            .api_version("2024-02-15-preview")
            .build()
            .unwrap()
    }

    #[test]
    fn test_deployment_url() {
        let client = test_client();
        assert_eq!(
            client.build_url("gpt-5", "chat/completions"),
            "https://test-resource.openai.azure.com/openai/deployments/gpt-5/chat/completions?api-version=2024-02-15-preview"
        );
    }

    #[test]
    fn test_payload_omits_model() {
        let client = test_client();
        let request = ProbeRequest::with_prompt("gpt-5", "Calculate 23 * 17");

        let payload = client.build_chat_request(&request).unwrap();

        assert!(payload.get("model").is_none());
        assert_eq!(payload["stream"], true);
        assert_eq!(payload["reasoning_effort"], "high");
    }

    #[test]
    fn test_builder_missing_api_key() {
        let result = AzureOpenAIClient::builder()
            .endpoint("https://test-resource.openai.azure.com")
            .api_version("2024-02-15-preview")
            .build();

        let err_msg = result.err().unwrap().to_string();
        assert!(err_msg.contains("API key"));
    }

    #[test]
    fn test_builder_missing_endpoint() {
        let result = AzureOpenAIClient::builder()
            .api_key("test-key")
            .api_version("2024-02-15-preview")
            .build();

        let err_msg = result.err().unwrap().to_string();
        assert!(err_msg.contains("Endpoint"));
    }

    #[test]
    fn test_builder_missing_api_version() {
        let result = AzureOpenAIClient::builder()
            .api_key("test-key")
            .endpoint("https://test-resource.openai.azure.com")
            .build();

        let err_msg = result.err().unwrap().to_string();
        assert!(err_msg.contains("API version"));
    }
}
