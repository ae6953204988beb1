//! Run detection.
//!
//! Watches the tail of the history after every append and records a
//! run whenever the three newest rounds share a classification.

use chrono::Utc;
use std::collections::VecDeque;
use tracing::debug;

use crate::history::HistoryStore;
use crate::types::{Classification, SequenceRun};

/// Number of identical rounds that make a run.
pub const RUN_LENGTH: usize = 3;
/// Default number of runs retained per classification.
pub const MAX_RUNS_PER_CLASS: usize = 10;

#[derive(Debug, Clone)]
pub struct SequenceDetector {
    high_runs: VecDeque<SequenceRun>,
    low_runs: VecDeque<SequenceRun>,
    max_runs: usize,
}

impl Default for SequenceDetector {
    fn default() -> Self {
        Self::new(MAX_RUNS_PER_CLASS)
    }
}

impl SequenceDetector {
    pub fn new(max_runs: usize) -> Self {
        Self {
            high_runs: VecDeque::new(),
            low_runs: VecDeque::new(),
            max_runs: max_runs.max(1),
        }
    }

    /// Inspect the three newest records. Call once after every append.
    ///
    /// Overlapping runs are recorded: four identical rounds in a row
    /// produce two runs.
    pub fn on_append(&mut self, history: &HistoryStore) -> Option<SequenceRun> {
        if history.len() < RUN_LENGTH {
            return None;
        }

        let tail: Vec<_> = history.tail(RUN_LENGTH).collect();
        let class = tail[0].classification;
        if !tail.iter().all(|r| r.classification == class) {
            return None;
        }

        let run = SequenceRun {
            start_round_id: tail[0].round_id,
            length: RUN_LENGTH,
            detected_at: Utc::now(),
        };

        let max_runs = self.max_runs;
        let runs = self.runs_mut(class);
        runs.push_back(run.clone());
        while runs.len() > max_runs {
            runs.pop_front();
        }

        debug!(class = %class, start_round_id = run.start_round_id, "Run detected");
        Some(run)
    }

    /// Retained runs for `class`, oldest first.
    pub fn runs(&self, class: Classification) -> &VecDeque<SequenceRun> {
        match class {
            Classification::High => &self.high_runs,
            Classification::Low => &self.low_runs,
        }
    }

    /// The newest `n` runs for `class`, oldest first.
    pub fn recent(&self, class: Classification, n: usize) -> Vec<SequenceRun> {
        let runs = self.runs(class);
        runs.iter().skip(runs.len().saturating_sub(n)).cloned().collect()
    }

    fn runs_mut(&mut self, class: Classification) -> &mut VecDeque<SequenceRun> {
        match class {
            Classification::High => &mut self.high_runs,
            Classification::Low => &mut self.low_runs,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
