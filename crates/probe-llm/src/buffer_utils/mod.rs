mod buffering;
mod sse_parser;

pub use buffering::CircularLineBuffer;
pub use sse_parser::{parse_sse_lines, SseLine, DATA_PREFIX, DONE_MARKER};
