mod client;

pub use client::{OpenAIClient, OPENAI_API_BASE};
pub(crate) use client::build_http_client;
