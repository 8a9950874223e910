//! Delta-field classification for a single streamed completion.
//!
//! `FieldObserver` holds the run state, `ConsoleReport` renders it, and
//! `Prober` drives both from an SSE body.

mod observer;
mod report;
mod runner;

pub use observer::{FieldObserver, Observation, RunSummary, Verdict, DEFAULT_DETAIL_LIMIT};
pub use report::ConsoleReport;
pub use runner::{LineOutcome, Prober};
