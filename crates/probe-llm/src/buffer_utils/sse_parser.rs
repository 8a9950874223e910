use futures::{Stream, StreamExt};
use std::pin::Pin;

use super::buffering::CircularLineBuffer;
use crate::error::Result;

/// Marker that introduces an SSE data line
pub const DATA_PREFIX: &str = "data: ";

/// Payload that signals end of stream
pub const DONE_MARKER: &str = "[DONE]";

/// One line of a server-sent event stream, classified by framing only.
/// Payloads are not parsed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// `data: ` line; holds the text after the prefix
    Data(String),

    /// `data: [DONE]`
    Done,

    /// Anything else: blank separators, `event:`/`id:` fields, comments,
    /// or a non-SSE error body
    Ignored(String),
}

impl SseLine {
    pub fn classify(line: &str) -> Self {
        match line.strip_prefix(DATA_PREFIX) {
            Some(data) if data == DONE_MARKER => SseLine::Done,
            Some(data) => SseLine::Data(data.to_string()),
            None => SseLine::Ignored(line.to_string()),
        }
    }
}

/// Split a chunked byte stream into classified SSE lines.
///
/// The stream stops after the first `Done` line. A transport error is
/// yielded once and ends the stream.
pub fn parse_sse_lines<S, B>(bytes: S) -> Pin<Box<dyn Stream<Item = Result<SseLine>> + Send>>
where
    S: Stream<Item = Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(bytes);
        let mut buffer = CircularLineBuffer::with_capacity(8192);

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(chunk) => {
                    buffer.extend(chunk.as_ref());

                    while let Some(line) = buffer.next_line() {
                        let line = SseLine::classify(&line);
                        let done = line == SseLine::Done;
                        yield Ok(line);
                        if done {
                            return;
                        }
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        if let Some(line) = buffer.take_remainder() {
            yield Ok(SseLine::classify(&line));
        }
    })
}
