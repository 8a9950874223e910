pub mod azure_openai;
pub mod buffer_utils;
pub mod config;
pub mod error;
pub mod openai;
pub mod probe;
pub mod streaming;
pub mod traits;
pub mod types;

pub use azure_openai::AzureOpenAIClient;
pub use config::{ClientFactory, ProviderConfig, ProviderType};
pub use error::{ProbeError, Result};
pub use openai::OpenAIClient;
pub use probe::{FieldObserver, Prober, RunSummary, Verdict, DEFAULT_DETAIL_LIMIT};
pub use streaming::{IncrementalUnit, REASONING_FIELDS};
pub use traits::StreamingClient;
pub use types::{Message, ProbeRequest, ReasoningEffort};
