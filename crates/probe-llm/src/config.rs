// Provider configuration and the factory that turns it into a streaming client

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::azure_openai::AzureOpenAIClient;
use crate::error::Result;
use crate::openai::OpenAIClient;
use crate::traits::StreamingClient;

/// Type of LLM provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    OpenAI,
    #[serde(rename = "azure_openai")]
    AzureOpenAI,
}

/// Configuration for OpenAI provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// Base URL for OpenAI API (optional, defaults to https://api.openai.com/v1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Configuration for Azure OpenAI provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    pub api_key: String,
    pub endpoint: String,
    pub api_version: String,
}

impl AzureConfig {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            api_version: api_version.into(),
        }
    }
}

/// Provider-specific configuration details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderDetails {
    OpenAI(OpenAIConfig),
    #[serde(rename = "azure_openai")]
    AzureOpenAI(AzureConfig),
}

/// Complete provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(flatten)]
    pub details: ProviderDetails,

    /// Whole-request timeout. Unset means wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    /// Create OpenAI provider config
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            details: ProviderDetails::OpenAI(OpenAIConfig::new(api_key)),
            timeout_secs: None,
        }
    }

    /// Create Azure OpenAI provider config
    ///
    /// # Arguments
    /// * `api_key` - Azure OpenAI API key
    /// * `endpoint` - Azure OpenAI endpoint (base URL), e.g. "https://my-resource.openai.azure.com"
    /// * `api_version` - API version, e.g. "2024-02-15-preview"
    ///
    /// The deployment name travels as the request's `model`.
    pub fn azure_openai(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            details: ProviderDetails::AzureOpenAI(AzureConfig::new(
                api_key,
                endpoint,
                api_version,
            )),
            timeout_secs: None,
        }
    }

    /// Get the provider type
    pub fn provider_type(&self) -> ProviderType {
        match self.details {
            ProviderDetails::OpenAI(_) => ProviderType::OpenAI,
            ProviderDetails::AzureOpenAI(_) => ProviderType::AzureOpenAI,
        }
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Factory for creating streaming clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_client(config: ProviderConfig) -> Result<Arc<dyn StreamingClient>> {
        let timeout = config.timeout();
        match config.details {
            ProviderDetails::OpenAI(openai_config) => {
                let mut client = OpenAIClient::new_with_timeout(openai_config.api_key, timeout)?;
                if let Some(base_url) = openai_config.base_url {
                    client = client.with_base_url(base_url);
                }
                Ok(Arc::new(client))
            }
            ProviderDetails::AzureOpenAI(azure_config) => {
                let client = AzureOpenAIClient::builder()
                    .api_key(azure_config.api_key)
                    .endpoint(azure_config.endpoint)
                    .api_version(azure_config.api_version)
                    .timeout(timeout)
                    .build()?;
                Ok(Arc::new(client))
            }
        }
    }
}
