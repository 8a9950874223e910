use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use std::io::{self, Write};

use super::observer::{Observation, RunSummary, Verdict};
use crate::error::Result;
use crate::types::ProbeRequest;

const RULE_WIDTH: usize = 80;
const DUMP_INDENT: &[u8] = b"      ";

/// Renders probe progress for a human watching the terminal.
///
/// Streamed reply text is written bare and flushed immediately, so the
/// output reconstructs the reply as it arrives.
pub struct ConsoleReport<W: Write> {
    out: W,
}

impl<W: Write> ConsoleReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn header(&mut self, target: &str, request: &ProbeRequest) -> Result<()> {
        writeln!(
            self.out,
            "🔬 Testing {} with reasoning_effort={} + streaming",
            request.model, request.reasoning_effort
        )?;
        writeln!(self.out, "   Target: {}\n", target)?;
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))?;
        self.out.flush()?;
        Ok(())
    }

    pub fn observation(&mut self, observation: &Observation<'_>) -> Result<()> {
        for field in &observation.new_fields {
            writeln!(self.out, "\n🆕 NEW FIELD DISCOVERED: '{}'", field)?;
        }

        if let Some(delta) = observation.delta.as_ref() {
            if observation.detailed {
                let keys: Vec<&str> = delta.keys().collect();
                writeln!(self.out, "\n📦 Chunk #{}", observation.unit_number)?;
                writeln!(self.out, "   Delta keys: {:?}", keys)?;
                writeln!(
                    self.out,
                    "   Delta: {}",
                    dump_json(delta.fields())?
                )?;
            }

            if observation.reasoning {
                writeln!(
                    self.out,
                    "\n🎯 REASONING FIELD FOUND IN CHUNK #{}!",
                    observation.unit_number
                )?;
                writeln!(
                    self.out,
                    "   Content: {}",
                    serde_json::to_string(delta.fields())?
                )?;
            }
        }

        if let Some(text) = observation.content() {
            write!(self.out, "{}", text)?;
        }

        self.out.flush()?;
        Ok(())
    }

    pub fn stream_complete(&mut self) -> Result<()> {
        writeln!(self.out, "\n✅ Stream complete!")?;
        Ok(())
    }

    pub fn summary(&mut self, summary: &RunSummary) -> Result<()> {
        writeln!(self.out, "\n\n{}", "=".repeat(RULE_WIDTH))?;
        writeln!(self.out, "📊 Summary:")?;
        writeln!(self.out, "   Total chunks: {}", summary.total_units)?;
        writeln!(self.out, "   Unique delta fields seen: {:?}", summary.fields)?;
        writeln!(self.out, "   Skipped lines: {}", summary.skipped_lines)?;
        if !summary.reasoning_units.is_empty() {
            writeln!(self.out, "   Reasoning chunks: {:?}", summary.reasoning_units)?;
        }
        writeln!(self.out, "   Total time: {:?}", summary.elapsed)?;

        writeln!(self.out, "\n💡 Analysis:")?;
        match summary.verdict {
            Verdict::SeparateReasoningField => {
                writeln!(self.out, "   ✅ REASONING CHUNKS ARE SEPARATE!")?;
            }
            Verdict::NoSeparateReasoningField => {
                writeln!(self.out, "   ❌ No separate reasoning field found")?;
                writeln!(self.out, "   ℹ️  Reasoning, if any, is mixed with content")?;
            }
        }

        self.out.flush()?;
        Ok(())
    }
}

/// Six-space indented JSON with every non-ASCII character escaped as `\uXXXX`
fn dump_json(value: &impl Serialize) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = AsciiPrettyFormatter(PrettyFormatter::with_indent(DUMP_INDENT));
    value.serialize(&mut Serializer::with_formatter(&mut buf, formatter))?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

struct AsciiPrettyFormatter<'a>(PrettyFormatter<'a>);

impl Formatter for AsciiPrettyFormatter<'_> {
    fn write_string_fragment<W: ?Sized + Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..index].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::observer::FieldObserver;
    use crate::streaming::IncrementalUnit;
    use chrono::Utc;
    use std::time::Duration;

    fn render(deltas: &[&str], detail_limit: usize) -> String {
        let mut observer = FieldObserver::new(detail_limit);
        let mut report = ConsoleReport::new(Vec::new());

        for delta in deltas {
            let unit = IncrementalUnit::parse(&format!(r#"{{"choices":[{{"delta":{}}}]}}"#, delta)).unwrap();
            let observation = observer.observe(&unit);
            report.observation(&observation).unwrap();
        }

        String::from_utf8(report.into_inner()).unwrap()
    }

    #[test]
    fn test_content_written_contiguously() {
        let output = render(&[r#"{"content":"42"}"#, r#"{"content":" is the answer"}"#], 0);

        assert!(output.ends_with("42 is the answer"));
    }

    #[test]
    fn test_new_field_notice_once() {
        let output = render(&[r#"{"role":"assistant"}"#, r#"{"role":"assistant"}"#], 0);

        assert_eq!(output.matches("NEW FIELD DISCOVERED: 'role'").count(), 1);
    }

    #[test]
    fn test_detailed_dump_shows_keys_and_content() {
        let output = render(&[r#"{"role":"assistant","content":""}"#], 10);

        assert!(output.contains("📦 Chunk #1"));
        assert!(output.contains(r#"Delta keys: ["role", "content"]"#));
        assert!(output.contains(r#""role": "assistant""#));
    }

    #[test]
    fn test_detail_dump_layout() {
        let output = render(&[r#"{"role":"assistant","content":"café ✓","tool_calls":[1]}"#], 10);

        let expected = concat!(
            "   Delta: {\n",
            "      \"role\": \"assistant\",\n",
            "      \"content\": \"caf\\u00e9 \\u2713\",\n",
            "      \"tool_calls\": [\n",
            "            1\n",
            "      ]\n",
            "}\n",
        );
        assert!(output.contains(expected), "unexpected dump:\n{}", output);
    }

    #[test]
    fn test_astral_characters_escape_as_surrogate_pairs() {
        let dumped = dump_json(&serde_json::json!({ "content": "🎯" })).unwrap();
        assert_eq!(dumped, "{\n      \"content\": \"\\ud83c\\udfaf\"\n}");
    }

    #[test]
    fn test_reasoning_highlight() {
        let output = render(&[r#"{"reasoning_content":"carry the 1"}"#], 0);

        assert!(output.contains("🎯 REASONING FIELD FOUND IN CHUNK #1!"));
        assert!(output.contains(r#"Content: {"reasoning_content":"carry the 1"}"#));
    }

    #[test]
    fn test_summary_verdicts() {
        let mut observer = FieldObserver::default();
        let unit = IncrementalUnit::parse(r#"{"choices":[{"delta":{"content":"x"}}]}"#).unwrap();
        observer.observe(&unit);

        let mut report = ConsoleReport::new(Vec::new());
        report
            .summary(&observer.summary(Utc::now(), Duration::from_secs(1), true))
            .unwrap();
        let output = String::from_utf8(report.into_inner()).unwrap();

        assert!(output.contains("Total chunks: 1"));
        assert!(output.contains(r#"Unique delta fields seen: ["content"]"#));
        assert!(output.contains("No separate reasoning field found"));
        assert!(!output.contains("Reasoning chunks"));
    }
}
