use config::{Config as ConfigLoader, ConfigError, Environment, File};
use probe_llm::config::{AzureConfig, OpenAIConfig, ProviderDetails};
use probe_llm::{Message, ProbeRequest, ProviderConfig, ProviderType, ReasoningEffort, DEFAULT_DETAIL_LIMIT};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderSection,
    #[serde(default)]
    pub request: RequestConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    // Secret (from ENV only)
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderSection {
    #[serde(default)]
    pub kind: ProviderType,
    /// OpenAI-compatible base URL; defaults to api.openai.com
    pub base_url: Option<String>,
    /// Azure resource endpoint
    pub endpoint: Option<String>,
    /// Azure API version
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_prompt")]
    pub prompt: String,
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub reasoning_effort: ReasoningEffort,
    pub max_completion_tokens: Option<u32>,
    /// Unset means no timeout
    pub timeout_secs: Option<u64>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            prompt: default_prompt(),
            system_prompt: None,
            reasoning_effort: ReasoningEffort::default(),
            max_completion_tokens: None,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// How many leading chunks get a full delta dump
    #[serde(default = "default_detail_limit")]
    pub detail_limit: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            detail_limit: default_detail_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_model() -> String {
    "gpt-5".to_string()
}

fn default_prompt() -> String {
    "Calculate 23 * 17".to_string()
}

fn default_detail_limit() -> usize {
    DEFAULT_DETAIL_LIMIT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables prefixed PROBE_, nested with `__`
    ///    (e.g. PROBE_REQUEST__MODEL=o3-mini)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("PROBE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;
        cfg.load_api_key()?;

        Ok(cfg)
    }

    /// Name of the environment variable holding the provider's key
    pub fn api_key_var(&self) -> &'static str {
        match self.provider.kind {
            ProviderType::OpenAI => "OPENAI_API_KEY",
            ProviderType::AzureOpenAI => "AZURE_OPENAI_API_KEY",
        }
    }

    // Secrets never come from TOML
    fn load_api_key(&mut self) -> Result<(), ConfigError> {
        let var = self.api_key_var();
        self.api_key = std::env::var(var)
            .map_err(|_| ConfigError::Message(format!("{} environment variable is required", var)))?;
        Ok(())
    }

    pub fn provider_config(&self) -> Result<ProviderConfig, ConfigError> {
        let details = match self.provider.kind {
            ProviderType::OpenAI => {
                let mut openai = OpenAIConfig::new(self.api_key.clone());
                if let Some(base_url) = &self.provider.base_url {
                    openai = openai.with_base_url(base_url.clone());
                }
                ProviderDetails::OpenAI(openai)
            }
            ProviderType::AzureOpenAI => {
                let endpoint = self.provider.endpoint.clone().ok_or_else(|| {
                    ConfigError::Message("provider.endpoint is required for azure_openai".to_string())
                })?;
                let api_version = self.provider.api_version.clone().ok_or_else(|| {
                    ConfigError::Message("provider.api_version is required for azure_openai".to_string())
                })?;
                ProviderDetails::AzureOpenAI(AzureConfig::new(self.api_key.clone(), endpoint, api_version))
            }
        };

        Ok(ProviderConfig {
            details,
            timeout_secs: self.request.timeout_secs,
        })
    }

    pub fn probe_request(&self) -> ProbeRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system_prompt) = &self.request.system_prompt {
            messages.push(Message::system(system_prompt.clone()));
        }
        messages.push(Message::human(self.request.prompt.clone()));

        let mut request = ProbeRequest::new(self.request.model.clone(), messages)
            .reasoning_effort(self.request.reasoning_effort);
        if let Some(max_tokens) = self.request.max_completion_tokens {
            request = request.max_completion_tokens(max_tokens);
        }
        request
    }
}
