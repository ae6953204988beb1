//! JSON-lines feed adapter.
//!
//! One event per line:
//!
//! ```text
//! {"event":"round_started","round_id":1042}
//! {"event":"round_resolved","round_id":1042,"dice":[3,5,6]}
//! ```
//!
//! The transport that produces these lines is not part of this crate; the
//! binary reads them from a file or stdin.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, warn};

use crate::engine::PredictionEngine;
use crate::types::{EngineError, OutcomeRecord, Prediction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FeedEvent {
    RoundStarted { round_id: u64 },
    RoundResolved { round_id: u64, dice: [u8; 3] },
}

/// What the engine did with an event.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedAction {
    Predicted(Prediction),
    Recorded(OutcomeRecord),
}

/// Parse one line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<FeedEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let event = serde_json::from_str(trimmed)
        .with_context(|| format!("Malformed feed event: {trimmed}"))?;
    Ok(Some(event))
}

pub fn apply_event(engine: &mut PredictionEngine, event: FeedEvent) -> Result<FeedAction, EngineError> {
    match event {
        FeedEvent::RoundStarted { round_id } => Ok(FeedAction::Predicted(engine.start_round(round_id))),
        FeedEvent::RoundResolved { round_id, dice: [d1, d2, d3] } => {
            engine.record_outcome(round_id, d1, d2, d3).map(FeedAction::Recorded)
        }
    }
}

/// Async reader that yields parsed events and skips malformed lines.
pub struct FeedReader<R> {
    lines: Lines<R>,
    line_no: usize,
    skipped: usize,
}

impl<R: AsyncBufRead + Unpin> FeedReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            skipped: 0,
        }
    }

    /// Next well-formed event, or `None` at end of input.
    pub async fn next_event(&mut self) -> Result<Option<FeedEvent>> {
        while let Some(line) = self
            .lines
            .next_line()
            .await
            .context("Failed to read feed line")?
        {
            self.line_no += 1;
            match parse_line(&line) {
                Ok(Some(event)) => {
                    debug!(line = self.line_no, ?event, "Feed event");
                    return Ok(Some(event));
                }
                Ok(None) => continue,
                Err(e) => {
                    self.skipped += 1;
                    warn!(line = self.line_no, error = %e, "Skipping malformed feed line");
                }
            }
        }
        Ok(None)
    }

    /// Malformed lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
