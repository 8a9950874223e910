use futures::{Stream, StreamExt};
use reqwest::Response;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::pin::Pin;

use crate::error::{ProbeError, Result};

/// Delta keys that carry reasoning text separately from `content`
pub const REASONING_FIELDS: [&str; 2] = ["reasoning", "reasoning_content"];

/// Raw response body as it comes off the wire
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// One parsed `data: ` payload.
///
/// Untyped, so fields unknown to any chunk struct stay visible.
#[derive(Debug, Clone)]
pub struct IncrementalUnit {
    payload: Value,
}

impl IncrementalUnit {
    pub fn parse(data: &str) -> Result<Self> {
        Ok(Self {
            payload: serde_json::from_str(data)?,
        })
    }

    /// First entry of `choices`, if the payload has one
    pub fn first_choice(&self) -> Option<&Value> {
        self.payload.get("choices")?.as_array()?.first()
    }

    /// Delta of the first choice. `None` when there is no first choice;
    /// an empty delta when the choice has no usable `delta` object.
    pub fn delta(&self) -> Option<Delta<'_>> {
        let choice = self.first_choice()?;
        let fields = match choice.get("delta").and_then(Value::as_object) {
            Some(map) => Cow::Borrowed(map),
            None => Cow::Owned(Map::new()),
        };
        Some(Delta { fields })
    }
}

/// Field mapping of one incremental update
#[derive(Debug, Clone)]
pub struct Delta<'a> {
    fields: Cow<'a, Map<String, Value>>,
}

impl Delta<'_> {
    /// Keys in payload order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when either reasoning key is present, whatever its value
    pub fn has_reasoning(&self) -> bool {
        REASONING_FIELDS.iter().any(|field| self.contains(field))
    }

    /// Visible reply text, when present and non-empty
    pub fn content(&self) -> Option<&str> {
        self.fields
            .get("content")
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Turn a streaming HTTP response into a `ByteStream`.
///
/// A non-success status is logged but not treated as an error; its body is
/// still handed to the line parser.
pub(crate) fn into_byte_stream(response: Response) -> ByteStream {
    let status = response.status();
    if status.is_success() {
        tracing::info!(%status, "Streaming response opened");
    } else {
        tracing::warn!(%status, "API returned non-success status; reading body anyway");
    }

    Box::pin(
        response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ProbeError::from)),
    )
}
