//! Live accuracy tracking.
//!
//! Scores the cached prediction for a round once that round resolves and
//! folds the result into the live streak counters.

use chrono::Utc;
use std::collections::VecDeque;
use tracing::info;

use crate::types::{percentage, OutcomeRecord, Prediction, PredictionCheck, PredictionStats};

/// Checks retained for recent-accuracy queries.
pub const MAX_CHECKS: usize = 500;

#[derive(Debug, Clone)]
pub struct AccuracyTracker {
    checks: VecDeque<PredictionCheck>,
    max_checks: usize,
}

impl Default for AccuracyTracker {
    fn default() -> Self {
        Self::new(MAX_CHECKS)
    }
}

impl AccuracyTracker {
    pub fn new(max_checks: usize) -> Self {
        Self {
            checks: VecDeque::new(),
            max_checks: max_checks.max(1),
        }
    }

    /// Compare `prediction` with the resolved `record`.
    ///
    /// Only the streak counters are touched here. Totals and accuracy are
    /// owned by backtests.
    pub fn reconcile(
        &mut self,
        stats: &mut PredictionStats,
        prediction: &Prediction,
        record: &OutcomeRecord,
    ) -> PredictionCheck {
        let correct = prediction.classification == record.classification;
        stats.streaks.record(correct);

        let check = PredictionCheck {
            round_id: record.round_id,
            predicted: prediction.classification,
            actual: record.classification,
            correct,
            confidence: prediction.confidence,
            checked_at: Utc::now(),
        };

        info!(
            round_id = check.round_id,
            predicted = %check.predicted,
            actual = %check.actual,
            correct,
            win_streak = stats.streaks.current_win,
            lose_streak = stats.streaks.current_lose,
            "Prediction reconciled"
        );

        self.checks.push_back(check.clone());
        while self.checks.len() > self.max_checks {
            self.checks.pop_front();
        }
        check
    }

    /// Hit rate over the newest `n` checks, percent with two decimals.
    pub fn recent_accuracy(&self, n: usize) -> f64 {
        let recent: Vec<_> = self.checks.iter().rev().take(n).collect();
        let hits = recent.iter().filter(|c| c.correct).count();
        percentage(hits, recent.len())
    }

    pub fn checks(&self) -> &VecDeque<PredictionCheck> {
        &self.checks
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
