use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::streaming::{Delta, IncrementalUnit, REASONING_FIELDS};

/// Number of leading units whose deltas are dumped in full
pub const DEFAULT_DETAIL_LIMIT: usize = 10;

/// What one incremental unit revealed
#[derive(Debug)]
pub struct Observation<'a> {
    /// 1-based arrival index among successfully parsed units
    pub unit_number: usize,
    /// Fields seen for the first time in this run, in payload order
    pub new_fields: Vec<String>,
    /// Delta of the first choice; `None` when the unit had no choices
    pub delta: Option<Delta<'a>>,
    /// Within the detail limit and has a first choice
    pub detailed: bool,
    /// Carries `reasoning` or `reasoning_content`
    pub reasoning: bool,
}

impl Observation<'_> {
    /// Non-empty visible text carried by this unit
    pub fn content(&self) -> Option<&str> {
        self.delta.as_ref().and_then(|delta| delta.content())
    }
}

/// Whether reasoning arrived in a field of its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    SeparateReasoningField,
    NoSeparateReasoningField,
}

impl Verdict {
    pub fn from_fields<'s>(mut fields: impl Iterator<Item = &'s str>) -> Self {
        if fields.any(|field| REASONING_FIELDS.iter().any(|name| *name == field)) {
            Verdict::SeparateReasoningField
        } else {
            Verdict::NoSeparateReasoningField
        }
    }
}

/// End-of-run report
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// Successfully parsed units
    pub total_units: usize,
    /// Data lines whose payload was not valid JSON
    pub skipped_lines: usize,
    /// Sorted distinct delta fields
    pub fields: Vec<String>,
    /// Unit numbers that carried a reasoning field
    pub reasoning_units: Vec<usize>,
    /// Whether the `[DONE]` sentinel was seen
    pub completed: bool,
    pub verdict: Verdict,
}

/// Tracks which delta fields have shown up across a run.
///
/// The observed set only grows; a field is reported as new exactly once.
#[derive(Debug)]
pub struct FieldObserver {
    detail_limit: usize,
    seen_fields: BTreeSet<String>,
    total_units: usize,
    skipped_lines: usize,
    reasoning_units: Vec<usize>,
}

impl Default for FieldObserver {
    fn default() -> Self {
        Self::new(DEFAULT_DETAIL_LIMIT)
    }
}

impl FieldObserver {
    pub fn new(detail_limit: usize) -> Self {
        Self {
            detail_limit,
            seen_fields: BTreeSet::new(),
            total_units: 0,
            skipped_lines: 0,
            reasoning_units: Vec::new(),
        }
    }

    pub fn observe<'a>(&mut self, unit: &'a IncrementalUnit) -> Observation<'a> {
        self.total_units += 1;
        let unit_number = self.total_units;

        let delta = unit.delta();
        let Some(fields) = delta.as_ref() else {
            return Observation {
                unit_number,
                new_fields: Vec::new(),
                delta: None,
                detailed: false,
                reasoning: false,
            };
        };

        let new_fields: Vec<String> = fields
            .keys()
            .filter(|key| self.seen_fields.insert((*key).to_string()))
            .map(str::to_string)
            .collect();

        let reasoning = fields.has_reasoning();
        if reasoning {
            self.reasoning_units.push(unit_number);
        }

        Observation {
            unit_number,
            new_fields,
            detailed: unit_number <= self.detail_limit,
            reasoning,
            delta,
        }
    }

    /// Record a data line whose payload could not be parsed
    pub fn record_skipped(&mut self) {
        self.skipped_lines += 1;
    }

    pub fn total_units(&self) -> usize {
        self.total_units
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn seen_fields(&self) -> impl Iterator<Item = &str> {
        self.seen_fields.iter().map(String::as_str)
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_fields(self.seen_fields())
    }

    pub fn summary(&self, started_at: DateTime<Utc>, elapsed: Duration, completed: bool) -> RunSummary {
        RunSummary {
            started_at,
            elapsed,
            total_units: self.total_units,
            skipped_lines: self.skipped_lines,
            fields: self.seen_fields.iter().cloned().collect(),
            reasoning_units: self.reasoning_units.clone(),
            completed,
            verdict: self.verdict(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(delta: &str) -> IncrementalUnit {
        IncrementalUnit::parse(&format!(r#"{{"choices":[{{"index":0,"delta":{}}}]}}"#, delta)).unwrap()
    }

    #[test]
    fn test_new_field_reported_once() {
        let mut observer = FieldObserver::default();

        let first = unit(r#"{"role":"assistant","content":""}"#);
        let second = unit(r#"{"content":"4"}"#);
        let third = unit(r#"{"content":"2","refusal":null}"#);

        assert_eq!(observer.observe(&first).new_fields, vec!["role", "content"]);
        assert!(observer.observe(&second).new_fields.is_empty());
        assert_eq!(observer.observe(&third).new_fields, vec!["refusal"]);
    }

    #[test]
    fn test_observed_set_is_monotonic() {
        let mut observer = FieldObserver::default();
        let units = [
            unit(r#"{"role":"assistant"}"#),
            unit(r#"{}"#),
            unit(r#"{"content":"x"}"#),
            unit(r#"{"role":"assistant"}"#),
            unit(r#"{"reasoning":"y","content":"z"}"#),
        ];

        let mut previous = 0;
        for u in &units {
            observer.observe(u);
            let size = observer.seen_fields().count();
            assert!(size >= previous);
            previous = size;
        }
        assert_eq!(previous, 3);
    }

    #[test]
    fn test_detail_limit_counts_parsed_units() {
        let mut observer = FieldObserver::new(10);
        let u = unit(r#"{"content":"a"}"#);

        let detailed: Vec<bool> = (0..12).map(|_| observer.observe(&u).detailed).collect();

        assert_eq!(detailed.iter().filter(|d| **d).count(), 10);
        assert!(!detailed[10] && !detailed[11]);
    }

    #[test]
    fn test_unit_without_choices_counts_but_yields_nothing() {
        let mut observer = FieldObserver::default();
        let u = IncrementalUnit::parse(r#"{"choices":[],"usage":{"total_tokens":12}}"#).unwrap();

        let observation = observer.observe(&u);

        assert_eq!(observation.unit_number, 1);
        assert!(observation.new_fields.is_empty());
        assert!(!observation.detailed);
        assert!(!observation.reasoning);
        assert_eq!(observer.total_units(), 1);
        assert_eq!(observer.seen_fields().count(), 0);
    }

    #[test]
    fn test_reasoning_units_and_verdict() {
        let mut observer = FieldObserver::default();
        observer.observe(&unit(r#"{"role":"assistant"}"#));
        assert_eq!(observer.verdict(), Verdict::NoSeparateReasoningField);

        let observation_unit = unit(r#"{"reasoning_content":"23*17 = 23*10 + 23*7"}"#);
        let observation = observer.observe(&observation_unit);
        assert!(observation.reasoning);
        assert_eq!(observer.verdict(), Verdict::SeparateReasoningField);

        let summary = observer.summary(Utc::now(), Duration::from_millis(5), true);
        assert_eq!(summary.reasoning_units, vec![2]);
        assert_eq!(summary.fields, vec!["reasoning_content", "role"]);
    }

    #[test]
    fn test_skipped_lines_do_not_count_as_units() {
        let mut observer = FieldObserver::default();
        observer.record_skipped();
        observer.record_skipped();

        let summary = observer.summary(Utc::now(), Duration::ZERO, false);
        assert_eq!(summary.total_units, 0);
        assert_eq!(summary.skipped_lines, 2);
        assert_eq!(summary.verdict, Verdict::NoSeparateReasoningField);
    }

    #[test]
    fn test_summary_fields_sorted() {
        let mut observer = FieldObserver::default();
        observer.observe(&unit(r#"{"tool_calls":[],"content":"a","role":"assistant"}"#));

        let summary = observer.summary(Utc::now(), Duration::ZERO, true);
        assert_eq!(summary.fields, vec!["content", "role", "tool_calls"]);
    }
}
