use std::collections::VecDeque;

/// Circular buffer for line-based parsing of a chunked byte stream
///
/// Network chunks do not respect line boundaries, so bytes accumulate here
/// until a line terminator arrives. `\n`, `\r` and `\r\n` all end a line.
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
    /// Last line ended in `\r`; a `\n` arriving next belongs to it
    skip_lf: bool,
}

impl CircularLineBuffer {
    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            skip_lf: false,
        }
    }

    /// Add bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract next line from buffer, without its terminator.
    /// Returns None if no complete line is available
    pub fn next_line(&mut self) -> Option<String> {
        self.consume_pending_lf()?;

        let end = self.buffer.iter().position(|&b| b == b'\n' || b == b'\r')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=end).collect();
        self.skip_lf = line_bytes[end] == b'\r';

        Some(decode_line(&line_bytes))
    }

    /// Drain whatever is left once the stream has ended.
    /// A body that does not end in a newline still carries one last line.
    pub fn take_remainder(&mut self) -> Option<String> {
        self.consume_pending_lf()?;

        if self.buffer.is_empty() {
            return None;
        }

        let line_bytes: Vec<u8> = self.buffer.drain(..).collect();
        Some(decode_line(&line_bytes))
    }

    // Drops the `\n` half of a `\r\n` pair split across chunks. Returns None
    // while it cannot tell yet because the buffer is empty.
    fn consume_pending_lf(&mut self) -> Option<()> {
        if self.skip_lf {
            match self.buffer.front() {
                None => return None,
                Some(b'\n') => {
                    self.buffer.pop_front();
                }
                Some(_) => {}
            }
            self.skip_lf = false;
        }
        Some(())
    }

    /// Current buffer size
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

// Invalid UTF-8 is replaced rather than rejected; a damaged payload then
// fails JSON parsing and is counted as a skipped line.
fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_buffer_basic() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"line1\nline2\n");

        assert_eq!(buffer.next_line().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap(), "line2");
        assert!(buffer.next_line().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_partial_line() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"partial");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.len(), 7);

        buffer.extend(b" line\n");
        assert_eq!(buffer.next_line().unwrap(), "partial line");
    }

    #[test]
    fn test_crlf_terminators_are_stripped() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"data: {}\r\n\r\n");

        assert_eq!(buffer.next_line().unwrap(), "data: {}");
        assert_eq!(buffer.next_line().unwrap(), "");
    }

    #[test]
    fn test_bare_cr_terminates_lines() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"line1\rline2\r\rline3\r");

        assert_eq!(buffer.next_line().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap(), "line2");
        assert_eq!(buffer.next_line().unwrap(), "");
        assert_eq!(buffer.next_line().unwrap(), "line3");
        assert!(buffer.next_line().is_none());
        assert!(buffer.take_remainder().is_none());
    }

    #[test]
    fn test_crlf_split_across_chunks_is_one_break() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"first\r");
        assert_eq!(buffer.next_line().unwrap(), "first");
        assert!(buffer.next_line().is_none());

        buffer.extend(b"\nsecond\n");
        assert_eq!(buffer.next_line().unwrap(), "second");
        assert!(buffer.next_line().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_remainder_without_newline() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"first\ndata: [DONE]");
        assert_eq!(buffer.next_line().unwrap(), "first");
        assert!(buffer.next_line().is_none());

        assert_eq!(buffer.take_remainder().unwrap(), "data: [DONE]");
        assert!(buffer.take_remainder().is_none());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"data: \xff\xfe\n");
        let line = buffer.next_line().unwrap();
        assert!(line.starts_with("data: "));
        assert!(line.contains('\u{FFFD}'));
    }
}
