use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use std::io::Write;
use std::time::Instant;

use super::observer::{FieldObserver, RunSummary};
use super::report::ConsoleReport;
use crate::buffer_utils::{parse_sse_lines, SseLine};
use crate::error::Result;
use crate::streaming::IncrementalUnit;
use crate::traits::StreamingClient;
use crate::types::ProbeRequest;

/// Whether the line loop should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Done,
}

/// Event-stream prober: one request, one pass over its SSE body.
pub struct Prober<W: Write> {
    observer: FieldObserver,
    report: ConsoleReport<W>,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl<W: Write> Prober<W> {
    pub fn new(detail_limit: usize, out: W) -> Self {
        Self {
            observer: FieldObserver::new(detail_limit),
            report: ConsoleReport::new(out),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Send `request` through `client` and classify the streamed reply
    pub async fn run(&mut self, client: &dyn StreamingClient, request: &ProbeRequest) -> Result<RunSummary> {
        self.report.header(&client.describe(), request)?;
        self.started_at = Utc::now();
        self.started = Instant::now();

        let body = client.open_stream(request).await?;
        self.consume(body).await
    }

    /// Drive the prober over a raw response body until `[DONE]` or EOF
    pub async fn consume<S, B>(&mut self, body: S) -> Result<RunSummary>
    where
        S: Stream<Item = Result<B>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
    {
        let mut lines = parse_sse_lines(body);
        let mut completed = false;

        while let Some(line) = lines.next().await {
            if self.process_line(line?)? == LineOutcome::Done {
                completed = true;
                break;
            }
        }

        if !completed {
            tracing::info!("Stream ended without [DONE] sentinel");
        }

        self.finish(completed)
    }

    /// Handle one classified line
    pub fn process_line(&mut self, line: SseLine) -> Result<LineOutcome> {
        match line {
            SseLine::Done => {
                self.report.stream_complete()?;
                Ok(LineOutcome::Done)
            }
            SseLine::Data(data) => {
                match IncrementalUnit::parse(&data) {
                    Ok(unit) => {
                        let observation = self.observer.observe(&unit);
                        self.report.observation(&observation)?;
                    }
                    Err(e) => {
                        self.observer.record_skipped();
                        tracing::debug!(error = %e, payload = %data, "Skipping undecodable data line");
                    }
                }
                Ok(LineOutcome::Continue)
            }
            SseLine::Ignored(text) => {
                if !text.is_empty() {
                    tracing::debug!(line = %text, "Ignoring non-data line");
                }
                Ok(LineOutcome::Continue)
            }
        }
    }

    /// Print and return the end-of-run summary
    pub fn finish(&mut self, completed: bool) -> Result<RunSummary> {
        let summary = self
            .observer
            .summary(self.started_at, self.started.elapsed(), completed);

        tracing::info!(
            units = summary.total_units,
            skipped = summary.skipped_lines,
            verdict = ?summary.verdict,
            "Probe finished"
        );

        self.report.summary(&summary)?;
        Ok(summary)
    }

    pub fn into_output(self) -> W {
        self.report.into_inner()
    }
}
