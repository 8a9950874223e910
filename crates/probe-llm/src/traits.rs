use async_trait::async_trait;

use crate::error::Result;
use crate::streaming::ByteStream;
use crate::types::ProbeRequest;

/// A provider that can open one streamed chat completion.
///
/// Implementations send the request and hand back the raw body; framing and
/// classification happen in the prober.
#[async_trait]
pub trait StreamingClient: Send + Sync {
    /// Send `request` with streaming enabled and return the response body
    async fn open_stream(&self, request: &ProbeRequest) -> Result<ByteStream>;

    /// Human-readable target, for the report header and logs
    fn describe(&self) -> String;
}
